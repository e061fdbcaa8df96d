use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::{AvailabilityService, DoctorDirectory};

#[derive(Clone)]
pub struct DoctorState {
    pub directory: Arc<dyn DoctorDirectory>,
    pub availability: Arc<AvailabilityService>,
}

pub fn doctor_routes(state: DoctorState) -> Router {
    // The catalog and slot lookups are public; nothing here needs a session.
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/search", get(handlers::search_doctors))
        .route("/available", get(handlers::get_available_doctors))
        .route("/specialty/{specialty}", get(handlers::get_doctors_by_specialty))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/available-slots", get(handlers::get_available_slots))
        .with_state(state)
}
