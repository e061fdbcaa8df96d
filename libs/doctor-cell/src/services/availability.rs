use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::DoctorError;
use crate::models::{DoctorSchedule, Fetched, TimeSlot};
use crate::services::directory::DoctorDirectory;

/// Produces the bookable slots for a doctor on a date.
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// Chronologically ordered. An unknown doctor yields an empty list; a
    /// failed doctor lookup is an error, never an empty list.
    async fn get_available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Fetched<Vec<TimeSlot>>, DoctorError>;
}

/// Times already taken by upcoming appointments.
#[async_trait]
pub trait SlotOccupancy: Send + Sync {
    async fn occupied_times(&self, doctor_id: &str, date: NaiveDate) -> HashSet<NaiveTime>;
}

/// Occupancy for setups with no appointment store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOccupancy;

#[async_trait]
impl SlotOccupancy for NoOccupancy {
    async fn occupied_times(&self, _doctor_id: &str, _date: NaiveDate) -> HashSet<NaiveTime> {
        HashSet::new()
    }
}

type BlockedSlot = (String, NaiveDate, NaiveTime);

pub struct AvailabilityService {
    directory: Arc<dyn DoctorDirectory>,
    occupancy: Arc<dyn SlotOccupancy>,
    blocked: RwLock<HashSet<BlockedSlot>>,
}

impl AvailabilityService {
    pub fn new(directory: Arc<dyn DoctorDirectory>, occupancy: Arc<dyn SlotOccupancy>) -> Self {
        Self {
            directory,
            occupancy,
            blocked: RwLock::new(HashSet::new()),
        }
    }

    /// Marks a slot unavailable regardless of bookings.
    pub async fn block_slot(&self, doctor_id: &str, date: NaiveDate, time: NaiveTime) {
        debug!("Blocking slot {} {} for doctor {}", date, time, doctor_id);
        self.blocked
            .write()
            .await
            .insert((doctor_id.to_string(), date, time));
    }

    pub async fn unblock_slot(&self, doctor_id: &str, date: NaiveDate, time: NaiveTime) {
        self.blocked
            .write()
            .await
            .remove(&(doctor_id.to_string(), date, time));
    }

    async fn schedule_for(&self, doctor_id: &str) -> Result<Fetched<Option<DoctorSchedule>>, DoctorError> {
        let fetched = self
            .directory
            .get_doctor_by_id(doctor_id)
            .await
            .inspect_err(|e| warn!("Could not load schedule for doctor {}: {}", doctor_id, e))?;
        if fetched.is_degraded() {
            warn!("Slot lookup for doctor {} is using fallback data", doctor_id);
        }
        Ok(fetched.map(|doctor| doctor.map(|doctor| DoctorSchedule::for_doctor(&doctor))))
    }

    async fn resolve(&self, doctor_id: &str, date: NaiveDate, schedule: Option<DoctorSchedule>) -> Vec<TimeSlot> {
        let Some(schedule) = schedule else {
            debug!("No schedule for doctor {}, returning no slots", doctor_id);
            return Vec::new();
        };

        if !schedule.works_on(date) {
            debug!("Doctor {} does not work on {}", doctor_id, date);
            return Vec::new();
        }

        let occupied = self.occupancy.occupied_times(doctor_id, date).await;
        let blocked = self.blocked.read().await;

        let mut slots: Vec<TimeSlot> = schedule
            .slot_times
            .iter()
            .map(|&time| {
                let taken = occupied.contains(&time)
                    || blocked.contains(&(doctor_id.to_string(), date, time));
                TimeSlot {
                    date,
                    time,
                    is_available: schedule.accepting_patients && !taken,
                }
            })
            .collect();
        slots.sort_by_key(|slot| slot.time);

        debug!(
            "Resolved {} slots ({} available) for doctor {} on {}",
            slots.len(),
            slots.iter().filter(|slot| slot.is_available).count(),
            doctor_id,
            date
        );

        slots
    }
}

#[async_trait]
impl SlotSource for AvailabilityService {
    async fn get_available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Fetched<Vec<TimeSlot>>, DoctorError> {
        Ok(match self.schedule_for(doctor_id).await? {
            Fetched::Live(schedule) => Fetched::Live(self.resolve(doctor_id, date, schedule).await),
            Fetched::Degraded { value, reason } => Fetched::Degraded {
                value: self.resolve(doctor_id, date, value).await,
                reason,
            },
        })
    }
}
