use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::labels::{date_label, time_label};
use doctor_cell::{Doctor, DoctorError, DoctorSpecialty};
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: String,
    pub doctor: DoctorSnapshot,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub consultation: Consultation,
    pub status: AppointmentStatus,
    pub booking_id: BookingId,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn consultation_type(&self) -> ConsultationType {
        self.consultation.kind()
    }

    pub fn location(&self) -> Option<&str> {
        self.consultation.location()
    }

    pub fn time_label(&self) -> String {
        time_label(self.time)
    }

    pub fn date_label(&self) -> String {
        date_label(self.date)
    }

    pub fn is_upcoming(&self) -> bool {
        self.status == AppointmentStatus::Upcoming
    }

    pub fn occupies(&self, doctor_id: &str, date: NaiveDate, time: NaiveTime) -> bool {
        self.is_upcoming() && self.doctor.id == doctor_id && self.date == date && self.time == time
    }
}

/// Doctor details copied onto the appointment when it is booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSnapshot {
    pub id: String,
    pub name: String,
    pub specialty: DoctorSpecialty,
    pub image_url: Option<String>,
}

impl From<&Doctor> for DoctorSnapshot {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id.clone(),
            name: doctor.name.clone(),
            specialty: doctor.specialty,
            image_url: doctor.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsultationType {
    #[default]
    #[serde(alias = "in_person")]
    InPerson,
    Video,
    Chat,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::InPerson => "in-person",
            ConsultationType::Video => "video",
            ConsultationType::Chat => "chat",
        }
    }
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsultationType {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in-person" | "in_person" | "inperson" => Ok(ConsultationType::InPerson),
            "video" => Ok(ConsultationType::Video),
            "chat" => Ok(ConsultationType::Chat),
            other => Err(AppointmentError::InvalidRequest(format!(
                "Unknown consultation type: {}",
                other
            ))),
        }
    }
}

/// How the consultation takes place. Only in-person visits carry a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Consultation {
    InPerson { location: String },
    Video,
    Chat,
}

impl Consultation {
    pub fn new(kind: ConsultationType, clinic_location: &str) -> Self {
        match kind {
            ConsultationType::InPerson => Consultation::InPerson {
                location: clinic_location.to_string(),
            },
            ConsultationType::Video => Consultation::Video,
            ConsultationType::Chat => Consultation::Chat,
        }
    }

    pub fn kind(&self) -> ConsultationType {
        match self {
            Consultation::InPerson { .. } => ConsultationType::InPerson,
            Consultation::Video => ConsultationType::Video,
            Consultation::Chat => ConsultationType::Chat,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Consultation::InPerson { location } => Some(location),
            Consultation::Video | Consultation::Chat => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Upcoming => write!(f, "upcoming"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Patient-facing reference such as `JND48213907`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub const PREFIX: &'static str = "JND";

    pub fn generate() -> Self {
        let number: u32 = rand::thread_rng().gen_range(0..100_000_000);
        Self(format!("{}{:08}", Self::PREFIX, number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Everything needed to book, with the patient taken from the session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub consultation_type: ConsultationType,
    pub notes: Option<String>,
}

/// Fields a patient may change on an upcoming appointment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
}

impl AppointmentPatch {
    pub fn reschedule(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date: Some(date),
            time: Some(time),
            notes: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none() && self.notes.is_none()
    }

    /// Slot the appointment lands on, filling a missing date or time from `current`.
    pub fn target(&self, current: &Appointment) -> (NaiveDate, NaiveTime) {
        (self.date.unwrap_or(current.date), self.time.unwrap_or(current.time))
    }
}

/// HTTP body for booking. Dates and times accept ISO values or app labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub consultation_type: ConsultationType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error("The {time} slot on {date} is no longer available")]
    SlotUnavailable { date: NaiveDate, time: NaiveTime },

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Appointment service unavailable: {0}")]
    Transport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(id) => AppointmentError::DoctorNotFound(id),
            DoctorError::Backend(msg) => AppointmentError::Transport(msg),
            DoctorError::InvalidRequest(msg) => AppointmentError::InvalidRequest(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) | AppointmentError::DoctorNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::SlotUnavailable { .. }
            | AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::Transport(msg) => AppError::ExternalService(msg),
            AppointmentError::InvalidRequest(msg) => AppError::BadRequest(msg),
        }
    }
}
