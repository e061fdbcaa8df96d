use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

use appointment_cell::{appointment_routes, AppointmentBookingService, AppointmentState, SharedDirectory};
use doctor_cell::{
    doctor_routes, AvailabilityService, DoctorDirectory, DoctorState, InMemoryDoctorDirectory,
    RemoteDoctorDirectory,
};
use shared_config::AppConfig;

fn doctor_directory(config: &AppConfig) -> Arc<dyn DoctorDirectory> {
    if config.has_remote_backend() {
        info!("Doctor lookups go to {}", config.jendo_api_url);
        Arc::new(RemoteDoctorDirectory::new(config))
    } else {
        info!("Serving doctors from the bundled demo catalog");
        Arc::new(InMemoryDoctorDirectory::demo())
    }
}

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let doctors = doctor_directory(&config);
    let appointments = SharedDirectory::default();

    // Slots consult the appointment directory so booked times show as taken
    let availability = Arc::new(AvailabilityService::new(
        doctors.clone(),
        Arc::new(appointments.clone()),
    ));
    let service = Arc::new(AppointmentBookingService::new(
        &config,
        appointments,
        doctors.clone(),
        availability.clone(),
    ));

    Router::new()
        .route("/", get(|| async { "Jendo Care API is running!" }))
        .nest("/doctors", doctor_routes(DoctorState { directory: doctors, availability }))
        .nest("/appointments", appointment_routes(AppointmentState { config, service }))
}
