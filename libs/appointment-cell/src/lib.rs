pub mod directory;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod workflow;

pub use directory::{AppointmentDirectory, DirectoryAction, SharedDirectory};
pub use models::*;
pub use services::*;

pub use router::{appointment_routes, AppointmentState};
