use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("Doctor service unavailable: {0}")]
    Backend(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(id) => AppError::NotFound(format!("Doctor {} not found", id)),
            DoctorError::Backend(msg) => AppError::ExternalService(msg),
            DoctorError::InvalidRequest(msg) => AppError::BadRequest(msg),
        }
    }
}
