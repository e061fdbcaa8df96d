use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_models::ApiResponse;

use crate::error::DoctorError;
use crate::labels::{date_label, parse_date_label};
use crate::models::{DoctorSpecialty, Fetched};
use crate::router::DoctorState;
use crate::services::SlotSource;

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    fn resolve(&self) -> (u32, u32) {
        (self.page.unwrap_or(0), self.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    /// `YYYY-MM-DD` or a display label such as `Dec 14, 2024`.
    pub date: String,
}

fn envelope<T: Serialize>(fetched: Fetched<T>, message: &str) -> Json<Value> {
    let degraded = fetched.is_degraded();
    Json(json!(ApiResponse::success(fetched.into_inner(), message).degraded(degraded)))
}

// ==============================================================================
// PUBLIC DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<DoctorState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let (page, size) = query.resolve();
    let doctors = state.directory.list_doctors(page, size).await?;

    Ok(envelope(doctors, "Doctors retrieved successfully"))
}

#[axum::debug_handler]
pub async fn search_doctors(
    State(state): State<DoctorState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.directory.search_doctors(&query.q).await?;

    Ok(envelope(doctors, "Search completed"))
}

#[axum::debug_handler]
pub async fn get_available_doctors(State(state): State<DoctorState>) -> Result<Json<Value>, AppError> {
    let doctors = state.directory.available_doctors().await?;

    Ok(envelope(doctors, "Available doctors retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_doctors_by_specialty(
    State(state): State<DoctorState>,
    Path(specialty): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let (page, size) = query.resolve();
    let specialty = DoctorSpecialty::normalize(&specialty);
    let doctors = state.directory.doctors_by_specialty(specialty, page, size).await?;

    Ok(envelope(doctors, "Doctors retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<DoctorState>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = state
        .directory
        .get_doctor_by_id(&doctor_id)
        .await?
        .transpose()
        .ok_or_else(|| DoctorError::NotFound(doctor_id.clone()))?;

    Ok(envelope(doctor, "Doctor retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<DoctorState>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date_label(&query.date, Utc::now().year())
        .ok_or_else(|| DoctorError::InvalidRequest(format!("Invalid date: {}", query.date)))?;

    let fetched = state.availability.get_available_slots(&doctor_id, date).await?;

    let data = fetched.map(|slots| {
        let entries: Vec<Value> = slots
            .iter()
            .map(|slot| {
                json!({
                    "date": slot.date,
                    "time": slot.time.format("%H:%M").to_string(),
                    "label": slot.label(),
                    "is_available": slot.is_available,
                })
            })
            .collect();

        json!({
            "doctor_id": doctor_id,
            "date": date,
            "date_label": date_label(date),
            "slots": entries,
            "total_slots": slots.len(),
            "available_slots": slots.iter().filter(|slot| slot.is_available).count(),
        })
    });

    Ok(envelope(data, "Slots retrieved successfully"))
}
