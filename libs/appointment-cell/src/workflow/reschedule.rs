use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::labels::{date_label, time_label};
use doctor_cell::{SlotSource, TimeSlot};
use shared_utils::SessionContext;

use crate::models::{Appointment, AppointmentPatch};
use crate::services::gateway::AppointmentGateway;
use crate::workflow::{install_slots, slot_is_open};

#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleSelection {
    /// The appointment as it was when the dialog opened; shown read-only.
    pub appointment: Appointment,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub slots: Vec<TimeSlot>,
    pub error: Option<String>,
}

impl RescheduleSelection {
    fn new(appointment: Appointment) -> Self {
        Self {
            appointment,
            date: None,
            time: None,
            slots: Vec::new(),
            error: None,
        }
    }

    pub fn current_date_label(&self) -> String {
        self.appointment.date_label()
    }

    pub fn current_time_label(&self) -> String {
        self.appointment.time_label()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleSummary {
    pub appointment: Appointment,
    pub previous_date: NaiveDate,
    pub previous_time: NaiveTime,
}

impl RescheduleSummary {
    pub fn message(&self) -> String {
        format!(
            "Your appointment with {} has been moved from {} at {} to {} at {}.",
            self.appointment.doctor.name,
            date_label(self.previous_date),
            time_label(self.previous_time),
            self.appointment.date_label(),
            self.appointment.time_label(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RescheduleState {
    #[default]
    Closed,
    SelectingDate(RescheduleSelection),
    SelectingTime(RescheduleSelection),
    Submitted(RescheduleSummary),
}

impl RescheduleState {
    /// Opens the dialog for an upcoming appointment. Anything else stays closed.
    pub fn open(appointment: Appointment) -> Self {
        if appointment.is_upcoming() {
            RescheduleState::SelectingDate(RescheduleSelection::new(appointment))
        } else {
            debug!("Appointment {} is {}, not opening reschedule", appointment.id, appointment.status);
            RescheduleState::Closed
        }
    }

    pub fn selection(&self) -> Option<&RescheduleSelection> {
        match self {
            RescheduleState::SelectingDate(selection) | RescheduleState::SelectingTime(selection) => {
                Some(selection)
            }
            RescheduleState::Closed | RescheduleState::Submitted(_) => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.selection().is_some()
    }

    /// Picks a new date and forgets any new time chosen before.
    pub fn select_date(self, date: NaiveDate) -> Self {
        match self {
            RescheduleState::SelectingDate(mut selection) | RescheduleState::SelectingTime(mut selection) => {
                selection.date = Some(date);
                selection.time = None;
                selection.slots.clear();
                selection.error = None;
                RescheduleState::SelectingTime(selection)
            }
            other => other,
        }
    }

    pub fn with_slots(self, date: NaiveDate, slots: Vec<TimeSlot>) -> Self {
        match self {
            RescheduleState::SelectingTime(mut selection) => {
                install_slots(&mut selection.slots, selection.date, date, slots);
                RescheduleState::SelectingTime(selection)
            }
            other => other,
        }
    }

    /// Shows why the slots for `date` are missing, unless the date changed since.
    pub fn slots_failed(self, date: NaiveDate, message: impl Into<String>) -> Self {
        match self {
            RescheduleState::SelectingTime(mut selection) if selection.date == Some(date) => {
                selection.error = Some(message.into());
                RescheduleState::SelectingTime(selection)
            }
            other => other,
        }
    }

    pub fn select_time(self, time: NaiveTime) -> Self {
        match self {
            RescheduleState::SelectingTime(mut selection) => {
                if slot_is_open(&selection.slots, selection.date, time) {
                    selection.time = Some(time);
                }
                RescheduleState::SelectingTime(selection)
            }
            other => other,
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self,
            RescheduleState::SelectingTime(RescheduleSelection { date: Some(_), time: Some(_), .. })
        )
    }

    /// The change to send, present only when `can_submit` holds.
    pub fn submission(&self) -> Option<(Uuid, AppointmentPatch)> {
        match self {
            RescheduleState::SelectingTime(RescheduleSelection {
                appointment,
                date: Some(date),
                time: Some(time),
                ..
            }) => Some((appointment.id, AppointmentPatch::reschedule(*date, *time))),
            _ => None,
        }
    }

    pub fn submit_succeeded(self, updated: Appointment) -> Self {
        match self {
            RescheduleState::SelectingTime(selection) => RescheduleState::Submitted(RescheduleSummary {
                previous_date: selection.appointment.date,
                previous_time: selection.appointment.time,
                appointment: updated,
            }),
            other => other,
        }
    }

    pub fn submit_failed(self, message: impl Into<String>) -> Self {
        match self {
            RescheduleState::SelectingTime(mut selection) => {
                selection.error = Some(message.into());
                RescheduleState::SelectingTime(selection)
            }
            other => other,
        }
    }

    pub fn dismiss_error(self) -> Self {
        match self {
            RescheduleState::SelectingTime(mut selection) => {
                selection.error = None;
                RescheduleState::SelectingTime(selection)
            }
            other => other,
        }
    }

    /// Closes from any state without touching the appointment.
    pub fn close(self) -> Self {
        RescheduleState::Closed
    }
}

pub struct RescheduleDriver {
    gateway: Arc<dyn AppointmentGateway>,
    slots: Arc<dyn SlotSource>,
}

impl RescheduleDriver {
    pub fn new(gateway: Arc<dyn AppointmentGateway>, slots: Arc<dyn SlotSource>) -> Self {
        Self { gateway, slots }
    }

    pub async fn select_date(&self, state: RescheduleState, date: NaiveDate) -> RescheduleState {
        let state = state.select_date(date);
        let Some(selection) = state.selection() else {
            return state;
        };

        let doctor_id = &selection.appointment.doctor.id;
        let fetched = self.slots.get_available_slots(doctor_id, date).await;
        match fetched {
            Ok(fetched) => {
                if fetched.is_degraded() {
                    warn!("Showing fallback slots for doctor {} on {}", doctor_id, date);
                }
                state.with_slots(date, fetched.into_inner())
            }
            Err(e) => {
                warn!("Could not load slots for doctor {} on {}: {}", doctor_id, date, e);
                state.slots_failed(date, e.to_string())
            }
        }
    }

    pub async fn submit(&self, session: &SessionContext, state: RescheduleState) -> RescheduleState {
        let patient_id = match session.require() {
            Ok(session) => session.user_id().to_string(),
            Err(_) => return state.submit_failed("Please sign in to reschedule"),
        };
        let Some((id, patch)) = state.submission() else {
            return state;
        };

        match self.gateway.update_appointment(&patient_id, id, patch).await {
            Ok(updated) => {
                info!("Appointment {} rescheduled to {} {}", id, updated.date, updated.time);
                state.submit_succeeded(updated)
            }
            Err(e) => {
                warn!("Reschedule of {} failed: {}", id, e);
                state.submit_failed(e.to_string())
            }
        }
    }
}
