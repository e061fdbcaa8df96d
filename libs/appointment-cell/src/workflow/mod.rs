//! Patient-side flows for booking, rescheduling and cancelling.
//!
//! Each flow is an immutable state value changed only through its named
//! transitions, plus a small driver that performs the async calls between
//! transitions.

pub mod booking;
pub mod cancellation;
pub mod reschedule;

pub use booking::{BookingDraft, BookingDriver, BookingState, BookingSummary};
pub use cancellation::{CancellationDriver, CancellationState};
pub use reschedule::{RescheduleDriver, RescheduleSelection, RescheduleState, RescheduleSummary};

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use doctor_cell::TimeSlot;

/// Replaces `current` with `fetched` when it was fetched for the selected date.
/// Returns whether the list was installed.
pub(crate) fn install_slots(
    current: &mut Vec<TimeSlot>,
    selected: Option<NaiveDate>,
    fetched_for: NaiveDate,
    fetched: Vec<TimeSlot>,
) -> bool {
    if selected != Some(fetched_for) {
        debug!("Discarding slots for {}; selection moved on", fetched_for);
        return false;
    }
    *current = fetched.into_iter().filter(|slot| slot.date == fetched_for).collect();
    true
}

pub(crate) fn slot_is_open(slots: &[TimeSlot], selected: Option<NaiveDate>, time: NaiveTime) -> bool {
    slots
        .iter()
        .any(|slot| Some(slot.date) == selected && slot.time == time && slot.is_available)
}
