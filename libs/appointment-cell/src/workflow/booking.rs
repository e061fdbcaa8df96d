use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use doctor_cell::labels::{date_label, time_label};
use doctor_cell::{SlotSource, TimeSlot};
use shared_utils::SessionContext;

use crate::models::{Appointment, ConsultationType, NewAppointment};
use crate::services::consultation::{consultation_details, ConsultationDetails};
use crate::services::gateway::AppointmentGateway;
use crate::workflow::{install_slots, slot_is_open};

/// Choices made so far while booking with one doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub doctor_id: String,
    pub consultation_type: ConsultationType,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// Slots for `date`; empty until they have been fetched.
    pub slots: Vec<TimeSlot>,
    /// Why the slots for `date` could not be loaded.
    pub slots_error: Option<String>,
    pub notes: Option<String>,
}

impl BookingDraft {
    fn new(doctor_id: &str) -> Self {
        Self {
            doctor_id: doctor_id.to_string(),
            consultation_type: ConsultationType::default(),
            date: None,
            time: None,
            slots: Vec::new(),
            slots_error: None,
            notes: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingSummary {
    pub doctor_id: String,
    pub date_label: String,
    pub time_label: String,
    pub details: ConsultationDetails,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingState {
    SelectingType(BookingDraft),
    SelectingDate(BookingDraft),
    SelectingTime(BookingDraft),
    /// `error` holds the last failed confirmation until dismissed.
    ReviewingSummary { draft: BookingDraft, error: Option<String> },
    Confirmed(Appointment),
}

impl BookingState {
    pub fn start(doctor_id: &str) -> Self {
        BookingState::SelectingType(BookingDraft::new(doctor_id))
    }

    pub fn draft(&self) -> Option<&BookingDraft> {
        match self {
            BookingState::SelectingType(draft)
            | BookingState::SelectingDate(draft)
            | BookingState::SelectingTime(draft)
            | BookingState::ReviewingSummary { draft, .. } => Some(draft),
            BookingState::Confirmed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BookingState::ReviewingSummary { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn confirmed(&self) -> Option<&Appointment> {
        match self {
            BookingState::Confirmed(appointment) => Some(appointment),
            _ => None,
        }
    }

    /// Choosing a type on the first step moves on to picking a date.
    pub fn select_type(self, consultation_type: ConsultationType) -> Self {
        match self {
            BookingState::SelectingType(mut draft) => {
                draft.consultation_type = consultation_type;
                BookingState::SelectingDate(draft)
            }
            BookingState::SelectingDate(mut draft) => {
                draft.consultation_type = consultation_type;
                BookingState::SelectingDate(draft)
            }
            BookingState::SelectingTime(mut draft) => {
                draft.consultation_type = consultation_type;
                BookingState::SelectingTime(draft)
            }
            BookingState::ReviewingSummary { mut draft, error } => {
                draft.consultation_type = consultation_type;
                BookingState::ReviewingSummary { draft, error }
            }
            confirmed @ BookingState::Confirmed(_) => confirmed,
        }
    }

    /// Picks a date and forgets any chosen time. The slot list is emptied until
    /// [`BookingState::with_slots`] installs the one fetched for this date.
    pub fn select_date(self, date: NaiveDate) -> Self {
        match self {
            BookingState::SelectingType(mut draft)
            | BookingState::SelectingDate(mut draft)
            | BookingState::SelectingTime(mut draft) => {
                draft.date = Some(date);
                draft.time = None;
                draft.slots.clear();
                draft.slots_error = None;
                BookingState::SelectingTime(draft)
            }
            other => other,
        }
    }

    /// Installs slots fetched for `date`. Ignored when the user has since
    /// picked another date.
    pub fn with_slots(self, date: NaiveDate, slots: Vec<TimeSlot>) -> Self {
        match self {
            BookingState::SelectingTime(mut draft) => {
                if install_slots(&mut draft.slots, draft.date, date, slots) {
                    draft.slots_error = None;
                }
                BookingState::SelectingTime(draft)
            }
            other => other,
        }
    }

    /// Records that the slots for `date` could not be loaded. The list stays
    /// empty so no time can be picked until a retry succeeds.
    pub fn slots_failed(self, date: NaiveDate, message: impl Into<String>) -> Self {
        match self {
            BookingState::SelectingTime(mut draft) if draft.date == Some(date) => {
                draft.slots_error = Some(message.into());
                BookingState::SelectingTime(draft)
            }
            other => other,
        }
    }

    /// Only an available slot of the current date's list can be chosen.
    pub fn select_time(self, time: NaiveTime) -> Self {
        match self {
            BookingState::SelectingTime(mut draft) => {
                if slot_is_open(&draft.slots, draft.date, time) {
                    draft.time = Some(time);
                } else {
                    debug!("Ignoring selection of unavailable time {}", time);
                }
                BookingState::SelectingTime(draft)
            }
            other => other,
        }
    }

    pub fn set_notes(mut self, notes: Option<String>) -> Self {
        if let Some(draft) = self.draft_mut() {
            draft.notes = notes;
        }
        self
    }

    pub fn can_continue(&self) -> bool {
        matches!(self, BookingState::SelectingTime(draft) if draft.is_complete())
    }

    /// Moves to the summary when date and time are chosen; otherwise a no-op.
    pub fn review(self) -> Self {
        match self {
            BookingState::SelectingTime(draft) if draft.is_complete() => {
                BookingState::ReviewingSummary { draft, error: None }
            }
            other => other,
        }
    }

    pub fn summary(&self, clinic_location: &str) -> Option<BookingSummary> {
        let BookingState::ReviewingSummary { draft, .. } = self else {
            return None;
        };
        let (date, time) = (draft.date?, draft.time?);

        Some(BookingSummary {
            doctor_id: draft.doctor_id.clone(),
            date_label: date_label(date),
            time_label: time_label(time),
            details: consultation_details(draft.consultation_type, clinic_location),
            notes: draft.notes.clone(),
        })
    }

    /// The booking to submit, available only while reviewing.
    pub fn booking_request(&self, patient_id: &str) -> Option<NewAppointment> {
        let BookingState::ReviewingSummary { draft, .. } = self else {
            return None;
        };

        Some(NewAppointment {
            patient_id: patient_id.to_string(),
            doctor_id: draft.doctor_id.clone(),
            date: draft.date?,
            time: draft.time?,
            consultation_type: draft.consultation_type,
            notes: draft.notes.clone(),
        })
    }

    pub fn confirm_succeeded(self, appointment: Appointment) -> Self {
        match self {
            BookingState::ReviewingSummary { .. } => BookingState::Confirmed(appointment),
            other => other,
        }
    }

    /// Stays on the summary with the choices intact so the user can retry.
    pub fn confirm_failed(self, message: impl Into<String>) -> Self {
        match self {
            BookingState::ReviewingSummary { draft, .. } => BookingState::ReviewingSummary {
                draft,
                error: Some(message.into()),
            },
            other => other,
        }
    }

    pub fn dismiss_error(self) -> Self {
        match self {
            BookingState::ReviewingSummary { draft, .. } => {
                BookingState::ReviewingSummary { draft, error: None }
            }
            BookingState::SelectingTime(mut draft) => {
                draft.slots_error = None;
                BookingState::SelectingTime(draft)
            }
            other => other,
        }
    }

    /// One step back, keeping every choice made so far.
    pub fn go_back(self) -> Self {
        match self {
            BookingState::SelectingDate(draft) => BookingState::SelectingType(draft),
            BookingState::SelectingTime(draft) => BookingState::SelectingDate(draft),
            BookingState::ReviewingSummary { draft, .. } => BookingState::SelectingTime(draft),
            other => other,
        }
    }

    fn draft_mut(&mut self) -> Option<&mut BookingDraft> {
        match self {
            BookingState::SelectingType(draft)
            | BookingState::SelectingDate(draft)
            | BookingState::SelectingTime(draft)
            | BookingState::ReviewingSummary { draft, .. } => Some(draft),
            BookingState::Confirmed(_) => None,
        }
    }
}

/// Runs the asynchronous steps of a booking.
///
/// Each call takes the state by value and returns the next one. Dropping a
/// pending call abandons it; the directory only changes once the gateway
/// has answered.
pub struct BookingDriver {
    gateway: Arc<dyn AppointmentGateway>,
    slots: Arc<dyn SlotSource>,
}

impl BookingDriver {
    pub fn new(gateway: Arc<dyn AppointmentGateway>, slots: Arc<dyn SlotSource>) -> Self {
        Self { gateway, slots }
    }

    pub async fn select_date(&self, state: BookingState, date: NaiveDate) -> BookingState {
        let state = state.select_date(date);
        let Some(draft) = state.draft() else {
            return state;
        };

        let fetched = self.slots.get_available_slots(&draft.doctor_id, date).await;
        match fetched {
            Ok(fetched) => {
                if fetched.is_degraded() {
                    warn!("Showing fallback slots for doctor {} on {}", draft.doctor_id, date);
                }
                state.with_slots(date, fetched.into_inner())
            }
            Err(e) => {
                warn!("Could not load slots for doctor {} on {}: {}", draft.doctor_id, date, e);
                state.slots_failed(date, e.to_string())
            }
        }
    }

    pub async fn confirm(&self, session: &SessionContext, state: BookingState) -> BookingState {
        let patient_id = match session.require() {
            Ok(session) => session.user_id().to_string(),
            Err(_) => return state.confirm_failed("Please sign in to book an appointment"),
        };
        let Some(request) = state.booking_request(&patient_id) else {
            return state;
        };

        match self.gateway.book_appointment(request).await {
            Ok(appointment) => {
                info!("Booking confirmed with reference {}", appointment.booking_id);
                state.confirm_succeeded(appointment)
            }
            Err(e) => {
                warn!("Booking failed: {}", e);
                state.confirm_failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slots(date: NaiveDate) -> Vec<TimeSlot> {
        vec![
            TimeSlot { date, time: hm(9, 0), is_available: true },
            TimeSlot { date, time: hm(9, 30), is_available: false },
            TimeSlot { date, time: hm(11, 0), is_available: true },
        ]
    }

    fn with_date(date: NaiveDate) -> BookingState {
        BookingState::start("doc-002")
            .select_type(ConsultationType::InPerson)
            .select_date(date)
            .with_slots(date, slots(date))
    }

    #[test]
    fn defaults_to_in_person() {
        let state = BookingState::start("doc-002");
        assert_eq!(state.draft().unwrap().consultation_type, ConsultationType::InPerson);
    }

    #[test]
    fn changing_date_clears_time() {
        let first = ymd(2024, 12, 14);
        let second = ymd(2024, 12, 17);
        let state = with_date(first).select_time(hm(11, 0));
        assert_eq!(state.draft().unwrap().time, Some(hm(11, 0)));

        let state = state.select_date(second);
        let draft = state.draft().unwrap();
        assert_eq!(draft.date, Some(second));
        assert_eq!(draft.time, None);
        assert!(draft.slots.is_empty());
    }

    #[test]
    fn stale_slot_lists_are_discarded() {
        let first = ymd(2024, 12, 14);
        let second = ymd(2024, 12, 17);

        let state = BookingState::start("doc-002")
            .select_date(first)
            .select_date(second)
            .with_slots(first, slots(first));

        assert!(state.draft().unwrap().slots.is_empty());
        assert_eq!(state.clone().select_time(hm(9, 0)).draft().unwrap().time, None);
    }

    #[test]
    fn unavailable_time_cannot_be_selected() {
        let state = with_date(ymd(2024, 12, 14)).select_time(hm(9, 30));
        assert_eq!(state.draft().unwrap().time, None);

        let state = state.select_time(hm(16, 0));
        assert_eq!(state.draft().unwrap().time, None);
    }

    #[test]
    fn continue_requires_date_and_time() {
        let date = ymd(2024, 12, 14);

        // neither
        let nothing = BookingState::start("doc-002").select_type(ConsultationType::Video);
        assert!(!nothing.can_continue());
        assert_eq!(nothing.clone().review(), nothing);

        // date only
        let date_only = with_date(date);
        assert!(!date_only.can_continue());
        assert_eq!(date_only.clone().review(), date_only);

        // time only: a time cannot be held without a date, and changing the
        // date drops it again
        let time_then_new_date = with_date(date).select_time(hm(9, 0)).select_date(ymd(2024, 12, 17));
        assert!(!time_then_new_date.can_continue());

        // both
        let both = with_date(date).select_time(hm(9, 0));
        assert!(both.can_continue());
        assert!(matches!(both.review(), BookingState::ReviewingSummary { error: None, .. }));
    }

    #[test]
    fn summary_describes_the_consultation() {
        let state = with_date(ymd(2024, 12, 14)).select_time(hm(11, 0)).review();

        let summary = state.summary("Trace Expert City, Colombo 10").unwrap();
        assert_eq!(summary.date_label, "Sat, Dec 14, 2024");
        assert_eq!(summary.time_label, "11:00 AM");
        assert_eq!(summary.details.title, "In-person Consultation");
        assert_eq!(summary.details.location.as_deref(), Some("Trace Expert City, Colombo 10"));
    }

    #[test]
    fn go_back_keeps_choices() {
        let reviewing = with_date(ymd(2024, 12, 14)).select_time(hm(11, 0)).review();

        let back = reviewing.go_back();
        assert!(matches!(back, BookingState::SelectingTime(_)));
        assert_eq!(back.draft().unwrap().time, Some(hm(11, 0)));

        let back = back.go_back().go_back();
        assert!(matches!(back, BookingState::SelectingType(_)));
        assert_eq!(back.draft().unwrap().date, Some(ymd(2024, 12, 14)));
    }

    #[test]
    fn failed_confirmation_keeps_selection_until_dismissed() {
        let reviewing = with_date(ymd(2024, 12, 14)).select_time(hm(11, 0)).review();

        let failed = reviewing.clone().confirm_failed("network down");
        assert_eq!(failed.error(), Some("network down"));
        assert_eq!(failed.draft(), reviewing.draft());

        assert_eq!(failed.dismiss_error(), reviewing);
    }

    #[test]
    fn slot_failure_blocks_time_until_refetched() {
        let date = ymd(2024, 12, 14);
        let failed = BookingState::start("doc-002")
            .select_date(date)
            .slots_failed(date, "backend unreachable");

        assert_eq!(failed.draft().unwrap().slots_error.as_deref(), Some("backend unreachable"));
        let failed = failed.select_time(hm(9, 0));
        assert_eq!(failed.draft().unwrap().time, None);

        let retried = failed.with_slots(date, slots(date)).select_time(hm(9, 0));
        let draft = retried.draft().unwrap();
        assert_eq!(draft.slots_error, None);
        assert_eq!(draft.time, Some(hm(9, 0)));
    }

    #[test]
    fn slot_failure_for_an_old_date_is_ignored() {
        let first = ymd(2024, 12, 14);
        let second = ymd(2024, 12, 17);
        let state = BookingState::start("doc-002")
            .select_date(first)
            .select_date(second)
            .slots_failed(first, "timeout");

        assert_eq!(state.draft().unwrap().slots_error, None);
    }
}
