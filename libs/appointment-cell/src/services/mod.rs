pub mod booking;
pub mod consultation;
pub mod gateway;
pub mod lifecycle;

pub use booking::AppointmentBookingService;
pub use consultation::{consultation_details, ConsultationDetails, PreparationItem};
pub use gateway::AppointmentGateway;
pub use lifecycle::AppointmentLifecycleService;
