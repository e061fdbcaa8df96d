use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentPatch, NewAppointment};

/// Where workflows submit their changes.
///
/// `patient_id` identifies the caller; appointments owned by someone else are
/// rejected with [`AppointmentError::Unauthorized`].
#[async_trait]
pub trait AppointmentGateway: Send + Sync {
    /// Fails with `DoctorNotFound` for an unknown doctor and `SlotUnavailable`
    /// when the slot was taken since it was shown.
    async fn book_appointment(&self, request: NewAppointment) -> Result<Appointment, AppointmentError>;

    async fn update_appointment(
        &self,
        patient_id: &str,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, AppointmentError>;

    async fn cancel_appointment(&self, patient_id: &str, id: Uuid) -> Result<Appointment, AppointmentError>;
}
