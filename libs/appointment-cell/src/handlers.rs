use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::labels::{parse_date_label, parse_time_label};
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, AppointmentPatch, AppointmentStatus, BookAppointmentRequest,
    ConsultationType, NewAppointment, RescheduleAppointmentRequest, UpdateAppointmentRequest,
};
use crate::router::AppointmentState;
use crate::services::{consultation_details, AppointmentGateway};

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// HELPERS
// ==============================================================================

fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    parse_date_label(raw, Utc::now().year())
        .ok_or_else(|| AppointmentError::InvalidRequest(format!("Invalid date: {}", raw)))
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppointmentError> {
    parse_time_label(raw).ok_or_else(|| AppointmentError::InvalidRequest(format!("Invalid time: {}", raw)))
}

fn appointment_view(appointment: &Appointment) -> Value {
    json!({
        "id": appointment.id,
        "booking_id": appointment.booking_id,
        "patient_id": appointment.patient_id,
        "doctor": appointment.doctor,
        "date": appointment.date,
        "date_label": appointment.date_label(),
        "time": appointment.time.format("%H:%M").to_string(),
        "time_label": appointment.time_label(),
        "consultation_type": appointment.consultation_type(),
        "location": appointment.location(),
        "status": appointment.status,
        "notes": appointment.notes,
        "created_at": appointment.created_at,
        "updated_at": appointment.updated_at,
    })
}

fn appointment_list(appointments: &[Appointment], message: &str) -> Json<Value> {
    let views: Vec<Value> = appointments.iter().map(appointment_view).collect();
    Json(json!({
        "success": true,
        "message": message,
        "data": {
            "appointments": views,
            "total": appointments.len(),
        }
    }))
}

fn single(appointment: &Appointment, message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": appointment_view(appointment),
    }))
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_consultation_details(
    State(state): State<AppointmentState>,
    Path(consultation_type): Path<String>,
) -> Result<Json<Value>, AppError> {
    let kind: ConsultationType = consultation_type.parse()?;
    let details = consultation_details(kind, &state.config.clinic_location);

    Ok(Json(json!({
        "success": true,
        "message": "Consultation details retrieved successfully",
        "data": {
            "consultation_type": details.consultation_type,
            "title": details.title,
            "description": details.description,
            "duration": details.duration_label(),
            "duration_minutes": details.duration_minutes,
            "fee": details.fee,
            "location": details.location,
            "preparation": details.preparation,
            "additional_notes": details.additional_notes,
            "notice": details.notice,
        }
    })))
}

// ==============================================================================
// AUTHENTICATED APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = NewAppointment {
        patient_id: session.user_id().to_string(),
        doctor_id: request.doctor_id,
        date: parse_date(&request.date)?,
        time: parse_time(&request.time)?,
        consultation_type: request.consultation_type,
        notes: request.notes,
    };

    let appointment = state.service.book_appointment(booking).await?;

    Ok(single(&appointment, "Appointment booked successfully"))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .service
        .list_appointments(session.user_id(), params.status)
        .await;

    Ok(appointment_list(&appointments, "Appointments retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_upcoming_appointments(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.service.upcoming_appointments(session.user_id()).await;

    Ok(appointment_list(&appointments, "Upcoming appointments retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_past_appointments(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.service.past_appointments(session.user_id()).await;

    Ok(appointment_list(&appointments, "Past appointments retrieved successfully"))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .service
        .get_appointment(session.user_id(), appointment_id)
        .await?;

    Ok(single(&appointment, "Appointment retrieved successfully"))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&request.date)?;
    let time = parse_time(&request.time)?;

    let appointment = state
        .service
        .reschedule_appointment(session.user_id(), appointment_id, date, time)
        .await?;

    Ok(single(&appointment, "Appointment rescheduled successfully"))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patch = AppointmentPatch {
        date: request.date.as_deref().map(parse_date).transpose()?,
        time: request.time.as_deref().map(parse_time).transpose()?,
        notes: request.notes,
    };

    let appointment = state
        .service
        .update_appointment(session.user_id(), appointment_id, patch)
        .await?;

    Ok(single(&appointment, "Appointment updated successfully"))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .service
        .cancel_appointment(session.user_id(), appointment_id)
        .await?;

    Ok(single(&appointment, "Appointment cancelled successfully"))
}
