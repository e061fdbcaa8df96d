//! The set of known appointments.
//!
//! [`AppointmentDirectory`] is a plain value: every change goes through
//! [`AppointmentDirectory::apply`] (or `upsert` for new bookings), which
//! validates first and only then writes, so a rejected action leaves the
//! directory untouched. [`SharedDirectory`] is the async handle the service
//! and the slot resolver share.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::SlotOccupancy;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::lifecycle::AppointmentLifecycleService;

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryAction {
    Reschedule { id: Uuid, date: NaiveDate, time: NaiveTime },
    UpdateNotes { id: Uuid, notes: Option<String> },
    Cancel { id: Uuid },
    Complete { id: Uuid },
}

impl DirectoryAction {
    pub fn id(&self) -> Uuid {
        match self {
            DirectoryAction::Reschedule { id, .. }
            | DirectoryAction::UpdateNotes { id, .. }
            | DirectoryAction::Cancel { id }
            | DirectoryAction::Complete { id } => *id,
        }
    }

    fn target_status(&self) -> AppointmentStatus {
        match self {
            DirectoryAction::Reschedule { .. } | DirectoryAction::UpdateNotes { .. } => {
                AppointmentStatus::Upcoming
            }
            DirectoryAction::Cancel { .. } => AppointmentStatus::Cancelled,
            DirectoryAction::Complete { .. } => AppointmentStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentDirectory {
    appointments: HashMap<Uuid, Appointment>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_appointments(appointments: impl IntoIterator<Item = Appointment>) -> Self {
        let mut directory = Self::new();
        for appointment in appointments {
            directory.upsert(appointment);
        }
        directory
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Appointment> {
        self.appointments.get(&id)
    }

    /// Appointments ordered by date then time, optionally restricted to one status.
    pub fn list(&self, filter: Option<AppointmentStatus>) -> Vec<Appointment> {
        self.sorted(|appointment| filter.map_or(true, |status| appointment.status == status))
    }

    pub fn upcoming(&self) -> Vec<Appointment> {
        self.list(Some(AppointmentStatus::Upcoming))
    }

    /// Completed and cancelled appointments.
    pub fn past(&self) -> Vec<Appointment> {
        self.sorted(|appointment| appointment.status.is_terminal())
    }

    pub fn for_patient(&self, patient_id: &str) -> AppointmentDirectory {
        Self {
            appointments: self
                .appointments
                .iter()
                .filter(|(_, appointment)| appointment.patient_id == patient_id)
                .map(|(id, appointment)| (*id, appointment.clone()))
                .collect(),
            lifecycle: self.lifecycle,
        }
    }

    /// Inserts, or replaces the appointment with the same id.
    pub fn upsert(&mut self, appointment: Appointment) -> Option<Appointment> {
        self.appointments.insert(appointment.id, appointment)
    }

    pub fn occupied_times(&self, doctor_id: &str, date: NaiveDate) -> HashSet<NaiveTime> {
        self.appointments
            .values()
            .filter(|appointment| {
                appointment.is_upcoming() && appointment.doctor.id == doctor_id && appointment.date == date
            })
            .map(|appointment| appointment.time)
            .collect()
    }

    /// Whether an upcoming appointment other than `exclude` holds the slot.
    pub fn is_slot_taken(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> bool {
        self.appointments.values().any(|appointment| {
            Some(appointment.id) != exclude && appointment.occupies(doctor_id, date, time)
        })
    }

    /// Applies `action` to the appointment it names and returns the result.
    ///
    /// Cancelling a cancelled appointment, or completing a completed one, is a
    /// no-op that returns the stored value unchanged.
    pub fn apply(
        &mut self,
        action: DirectoryAction,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let id = action.id();
        let current = self.appointments.get(&id).ok_or(AppointmentError::NotFound(id))?;

        let target = action.target_status();
        if current.status == target && target.is_terminal() {
            debug!("Appointment {} already {}, nothing to do", id, target);
            return Ok(current.clone());
        }
        self.lifecycle.validate_status_transition(current.status, target)?;

        let mut updated = current.clone();
        match action {
            DirectoryAction::Reschedule { date, time, .. } => {
                updated.date = date;
                updated.time = time;
            }
            DirectoryAction::UpdateNotes { notes, .. } => updated.notes = notes,
            DirectoryAction::Cancel { .. } | DirectoryAction::Complete { .. } => {
                updated.status = target;
            }
        }
        updated.updated_at = now;

        self.appointments.insert(id, updated.clone());
        Ok(updated)
    }

    fn sorted(&self, keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        let mut selected: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|appointment| keep(appointment))
            .cloned()
            .collect();
        selected.sort_by(|a, b| (a.date, a.time, a.created_at).cmp(&(b.date, b.time, b.created_at)));
        selected
    }
}

/// Async handle over one [`AppointmentDirectory`]; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct SharedDirectory {
    inner: Arc<RwLock<AppointmentDirectory>>,
}

impl SharedDirectory {
    pub fn new(directory: AppointmentDirectory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(directory)),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, AppointmentDirectory> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, AppointmentDirectory> {
        self.inner.write().await
    }

    pub async fn snapshot(&self) -> AppointmentDirectory {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl SlotOccupancy for SharedDirectory {
    async fn occupied_times(&self, doctor_id: &str, date: NaiveDate) -> HashSet<NaiveTime> {
        self.inner.read().await.occupied_times(doctor_id, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    use doctor_cell::DoctorSpecialty;

    use crate::models::{BookingId, Consultation, DoctorSnapshot};

    fn appointment(patient: &str, day: u32, hour: u32, status: AppointmentStatus) -> Appointment {
        let created = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.to_string(),
            doctor: DoctorSnapshot {
                id: "doc-002".to_string(),
                name: "Dr. Michael Chen".to_string(),
                specialty: DoctorSpecialty::Endocrinologist,
                image_url: None,
            },
            date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            consultation: Consultation::Video,
            status,
            booking_id: BookingId::generate(),
            notes: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn upcoming_filter_never_yields_terminal_appointments() {
        let directory = AppointmentDirectory::from_appointments([
            appointment("p1", 14, 9, AppointmentStatus::Upcoming),
            appointment("p1", 12, 10, AppointmentStatus::Cancelled),
            appointment("p1", 10, 11, AppointmentStatus::Completed),
            appointment("p1", 13, 15, AppointmentStatus::Upcoming),
        ]);

        let upcoming = directory.upcoming();
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming.iter().all(|a| a.status == AppointmentStatus::Upcoming));
        assert!(upcoming[0].date < upcoming[1].date);

        let past = directory.past();
        assert_eq!(past.len(), 2);
        assert!(past.iter().all(|a| a.status.is_terminal()));
        assert_eq!(directory.list(None).len(), 4);
    }

    #[test]
    fn patient_view_only_contains_their_appointments() {
        let directory = AppointmentDirectory::from_appointments([
            appointment("p1", 14, 9, AppointmentStatus::Upcoming),
            appointment("p2", 14, 10, AppointmentStatus::Upcoming),
        ]);

        let mine = directory.for_patient("p1");
        assert_eq!(mine.len(), 1);
        assert!(mine.list(None).iter().all(|a| a.patient_id == "p1"));
    }

    #[test]
    fn reschedule_changes_only_date_and_time() {
        let original = appointment("p1", 14, 11, AppointmentStatus::Upcoming);
        let mut directory = AppointmentDirectory::from_appointments([original.clone()]);
        let new_date = NaiveDate::from_ymd_opt(2024, 12, 16).unwrap();
        let new_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let later = original.updated_at + Duration::minutes(5);

        let updated = directory
            .apply(
                DirectoryAction::Reschedule { id: original.id, date: new_date, time: new_time },
                later,
            )
            .unwrap();

        assert_eq!(updated.date, new_date);
        assert_eq!(updated.time, new_time);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.booking_id, original.booking_id);
        assert_eq!(updated.status, AppointmentStatus::Upcoming);
        assert_eq!(updated.updated_at, later);
        assert_eq!(directory.get(original.id), Some(&updated));
    }

    #[test]
    fn cancel_is_idempotent() {
        let original = appointment("p1", 14, 11, AppointmentStatus::Upcoming);
        let mut directory = AppointmentDirectory::from_appointments([original.clone()]);

        let first = directory.apply(DirectoryAction::Cancel { id: original.id }, Utc::now()).unwrap();
        let second = directory.apply(DirectoryAction::Cancel { id: original.id }, Utc::now()).unwrap();

        assert_eq!(first.status, AppointmentStatus::Cancelled);
        assert_eq!(first, second);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn terminal_appointments_reject_mutation() {
        let cancelled = appointment("p1", 14, 11, AppointmentStatus::Cancelled);
        let completed = appointment("p1", 15, 11, AppointmentStatus::Completed);
        let mut directory = AppointmentDirectory::from_appointments([cancelled.clone(), completed.clone()]);
        let before = directory.list(None);

        assert_matches!(
            directory.apply(
                DirectoryAction::Reschedule { id: cancelled.id, date: cancelled.date, time: cancelled.time },
                Utc::now()
            ),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
        assert_matches!(
            directory.apply(DirectoryAction::Complete { id: cancelled.id }, Utc::now()),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
        assert_matches!(
            directory.apply(DirectoryAction::Cancel { id: completed.id }, Utc::now()),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );

        assert_eq!(directory.list(None), before);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut directory = AppointmentDirectory::new();
        let id = Uuid::new_v4();

        assert_matches!(
            directory.apply(DirectoryAction::Cancel { id }, Utc::now()),
            Err(AppointmentError::NotFound(missing)) if missing == id
        );
    }

    #[test]
    fn occupancy_ignores_cancelled_appointments() {
        let taken = appointment("p1", 14, 11, AppointmentStatus::Upcoming);
        let freed = appointment("p2", 14, 10, AppointmentStatus::Cancelled);
        let directory = AppointmentDirectory::from_appointments([taken.clone(), freed.clone()]);

        let occupied = directory.occupied_times("doc-002", taken.date);
        assert!(occupied.contains(&taken.time));
        assert!(!occupied.contains(&freed.time));
        assert!(directory.is_slot_taken("doc-002", taken.date, taken.time, None));
        assert!(!directory.is_slot_taken("doc-002", taken.date, taken.time, Some(taken.id)));
    }
}
