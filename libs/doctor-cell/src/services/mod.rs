pub mod availability;
pub mod directory;
pub mod remote;

pub use availability::{AvailabilityService, NoOccupancy, SlotOccupancy, SlotSource};
pub use directory::{demo_doctors, DoctorDirectory, InMemoryDoctorDirectory};
pub use remote::RemoteDoctorDirectory;
