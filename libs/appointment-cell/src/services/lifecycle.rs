use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Status rules shared by the directory and the service.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed.
    /// `Upcoming -> Upcoming` is a reschedule or edit.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Upcoming => vec![
                AppointmentStatus::Upcoming,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    pub fn can_modify(&self, current_status: AppointmentStatus) -> bool {
        !current_status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn upcoming_can_move_anywhere() {
        let lifecycle = AppointmentLifecycleService::new();
        for next in [
            AppointmentStatus::Upcoming,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert!(lifecycle
                .validate_status_transition(AppointmentStatus::Upcoming, next)
                .is_ok());
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        let lifecycle = AppointmentLifecycleService::new();
        for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            assert!(!lifecycle.can_modify(terminal));
            assert_matches!(
                lifecycle.validate_status_transition(terminal, AppointmentStatus::Upcoming),
                Err(AppointmentError::InvalidStatusTransition { from, .. }) if from == terminal
            );
        }
    }
}
