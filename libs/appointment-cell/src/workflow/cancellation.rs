use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_utils::SessionContext;

use crate::models::Appointment;
use crate::services::gateway::AppointmentGateway;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CancellationState {
    #[default]
    Idle,
    ConfirmPending { appointment: Appointment, error: Option<String> },
    Cancelled(Appointment),
}

impl CancellationState {
    /// Asks for confirmation. Appointments that are not upcoming cannot be
    /// cancelled, so the state does not change for them.
    pub fn request(self, appointment: Appointment) -> Self {
        match self {
            CancellationState::Idle | CancellationState::Cancelled(_) if appointment.is_upcoming() => {
                CancellationState::ConfirmPending { appointment, error: None }
            }
            other => {
                debug!("Cancellation request for {} ignored", appointment.id);
                other
            }
        }
    }

    pub fn dismiss(self) -> Self {
        match self {
            CancellationState::ConfirmPending { .. } => CancellationState::Idle,
            other => other,
        }
    }

    /// The appointment to cancel while confirmation is pending.
    pub fn pending_id(&self) -> Option<Uuid> {
        match self {
            CancellationState::ConfirmPending { appointment, .. } => Some(appointment.id),
            _ => None,
        }
    }

    pub fn cancel_succeeded(self, cancelled: Appointment) -> Self {
        match self {
            CancellationState::ConfirmPending { .. } => CancellationState::Cancelled(cancelled),
            other => other,
        }
    }

    pub fn cancel_failed(self, message: impl Into<String>) -> Self {
        match self {
            CancellationState::ConfirmPending { appointment, .. } => CancellationState::ConfirmPending {
                appointment,
                error: Some(message.into()),
            },
            other => other,
        }
    }
}

pub struct CancellationDriver {
    gateway: Arc<dyn AppointmentGateway>,
}

impl CancellationDriver {
    pub fn new(gateway: Arc<dyn AppointmentGateway>) -> Self {
        Self { gateway }
    }

    /// Cancels the pending appointment. Outside `ConfirmPending` this does
    /// nothing, so a repeated confirm never reaches the gateway twice.
    pub async fn confirm(&self, session: &SessionContext, state: CancellationState) -> CancellationState {
        let Some(id) = state.pending_id() else {
            return state;
        };
        let patient_id = match session.require() {
            Ok(session) => session.user_id().to_string(),
            Err(_) => return state.cancel_failed("Please sign in to cancel"),
        };

        match self.gateway.cancel_appointment(&patient_id, id).await {
            Ok(cancelled) => {
                info!("Appointment {} cancelled", id);
                state.cancel_succeeded(cancelled)
            }
            Err(e) => {
                warn!("Cancelling {} failed: {}", id, e);
                state.cancel_failed(e.to_string())
            }
        }
    }
}
