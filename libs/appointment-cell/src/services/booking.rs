use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::{Doctor, DoctorDirectory, SlotSource};
use shared_config::AppConfig;

use crate::directory::{AppointmentDirectory, DirectoryAction, SharedDirectory};
use crate::models::{
    Appointment, AppointmentError, AppointmentPatch, AppointmentStatus, BookingId, Consultation,
    DoctorSnapshot, NewAppointment,
};
use crate::services::gateway::AppointmentGateway;
use crate::services::lifecycle::AppointmentLifecycleService;

// Retries when a concurrent change moves the appointment during the slot check.
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Books and edits appointments against the shared directory.
///
/// Slot availability is checked with the slot resolver before taking the
/// directory write lock, then re-checked against the directory under the lock
/// so two concurrent bookings cannot take the same slot.
pub struct AppointmentBookingService {
    directory: SharedDirectory,
    doctors: Arc<dyn DoctorDirectory>,
    slots: Arc<dyn SlotSource>,
    lifecycle_service: AppointmentLifecycleService,
    clinic_location: String,
}

impl AppointmentBookingService {
    pub fn new(
        config: &AppConfig,
        directory: SharedDirectory,
        doctors: Arc<dyn DoctorDirectory>,
        slots: Arc<dyn SlotSource>,
    ) -> Self {
        Self {
            directory,
            doctors,
            slots,
            lifecycle_service: AppointmentLifecycleService::new(),
            clinic_location: config.clinic_location.clone(),
        }
    }

    pub fn directory(&self) -> &SharedDirectory {
        &self.directory
    }

    pub async fn get_appointment(&self, patient_id: &str, id: Uuid) -> Result<Appointment, AppointmentError> {
        let directory = self.directory.read().await;
        owned(&directory, patient_id, id).cloned()
    }

    pub async fn list_appointments(
        &self,
        patient_id: &str,
        status: Option<AppointmentStatus>,
    ) -> Vec<Appointment> {
        self.directory.read().await.for_patient(patient_id).list(status)
    }

    pub async fn upcoming_appointments(&self, patient_id: &str) -> Vec<Appointment> {
        self.directory.read().await.for_patient(patient_id).upcoming()
    }

    pub async fn past_appointments(&self, patient_id: &str) -> Vec<Appointment> {
        self.directory.read().await.for_patient(patient_id).past()
    }

    pub async fn reschedule_appointment(
        &self,
        patient_id: &str,
        id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Appointment, AppointmentError> {
        self.update_appointment(patient_id, id, AppointmentPatch::reschedule(date, time)).await
    }

    /// Marks a held appointment as completed. Not tied to a patient.
    pub async fn complete_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let completed = self
            .directory
            .write()
            .await
            .apply(DirectoryAction::Complete { id }, Utc::now())?;

        info!("Appointment {} completed", id);
        Ok(completed)
    }

    async fn load_doctor(&self, doctor_id: &str) -> Result<Doctor, AppointmentError> {
        let fetched = self.doctors.get_doctor_by_id(doctor_id).await?;
        if fetched.is_degraded() {
            warn!("Booking against fallback data for doctor {}", doctor_id);
        }

        fetched
            .into_inner()
            .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.to_string()))
    }

    async fn ensure_slot_available(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), AppointmentError> {
        let fetched = self.slots.get_available_slots(doctor_id, date).await?;
        if fetched.is_degraded() {
            warn!("Checking slot {} {} for doctor {} against fallback data", date, time, doctor_id);
        }

        let open = fetched.value().iter().any(|slot| slot.time == time && slot.is_available);
        if !open {
            debug!("Slot {} {} is not open for doctor {}", date, time, doctor_id);
            return Err(AppointmentError::SlotUnavailable { date, time });
        }
        Ok(())
    }
}

fn owned<'a>(
    directory: &'a AppointmentDirectory,
    patient_id: &str,
    id: Uuid,
) -> Result<&'a Appointment, AppointmentError> {
    let appointment = directory.get(id).ok_or(AppointmentError::NotFound(id))?;
    if appointment.patient_id != patient_id {
        warn!("Patient {} attempted to access appointment {}", patient_id, id);
        return Err(AppointmentError::Unauthorized);
    }
    Ok(appointment)
}

#[async_trait]
impl AppointmentGateway for AppointmentBookingService {
    async fn book_appointment(&self, request: NewAppointment) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking {} appointment with doctor {} on {} at {}",
            request.consultation_type, request.doctor_id, request.date, request.time
        );

        let doctor = self.load_doctor(&request.doctor_id).await?;
        self.ensure_slot_available(&doctor.id, request.date, request.time).await?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor: DoctorSnapshot::from(&doctor),
            date: request.date,
            time: request.time,
            consultation: Consultation::new(request.consultation_type, &self.clinic_location),
            status: AppointmentStatus::Upcoming,
            booking_id: BookingId::generate(),
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        let mut directory = self.directory.write().await;
        if directory.is_slot_taken(&doctor.id, appointment.date, appointment.time, None) {
            warn!("Slot {} {} for doctor {} was taken concurrently", appointment.date, appointment.time, doctor.id);
            return Err(AppointmentError::SlotUnavailable {
                date: appointment.date,
                time: appointment.time,
            });
        }
        directory.upsert(appointment.clone());

        info!(
            "Appointment {} booked for patient {} ({})",
            appointment.id, appointment.patient_id, appointment.booking_id
        );
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        patient_id: &str,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, AppointmentError> {
        let mut current = {
            let directory = self.directory.read().await;
            owned(&directory, patient_id, id)?.clone()
        };

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            self.lifecycle_service
                .validate_status_transition(current.status, AppointmentStatus::Upcoming)?;

            if patch.is_empty() {
                return Ok(current);
            }

            let (date, time) = patch.target(&current);
            let moves = (date, time) != (current.date, current.time);

            if moves {
                self.ensure_slot_available(&current.doctor.id, date, time).await?;
            }

            let now = Utc::now();
            let mut directory = self.directory.write().await;

            // A missing date or time is filled from the appointment as it was
            // before the slot check; if it moved since, start over from the
            // state held under the lock.
            let latest = owned(&directory, patient_id, id)?;
            if (latest.date, latest.time, latest.status) != (current.date, current.time, current.status) {
                debug!("Appointment {} changed during the slot check, retrying", id);
                current = latest.clone();
                continue;
            }

            if moves && directory.is_slot_taken(&current.doctor.id, date, time, Some(id)) {
                return Err(AppointmentError::SlotUnavailable { date, time });
            }

            // Both actions need an upcoming appointment, so once the first one
            // succeeds under this lock the second cannot be rejected.
            let mut updated = latest.clone();
            if moves {
                updated = directory.apply(DirectoryAction::Reschedule { id, date, time }, now)?;
            }
            if let Some(notes) = &patch.notes {
                let notes = Some(notes.clone()).filter(|notes| !notes.trim().is_empty());
                updated = directory.apply(DirectoryAction::UpdateNotes { id, notes }, now)?;
            }

            info!("Appointment {} updated for patient {}", id, patient_id);
            return Ok(updated);
        }

        let (date, time) = patch.target(&current);
        warn!("Appointment {} kept moving while being updated, giving up", id);
        Err(AppointmentError::SlotUnavailable { date, time })
    }

    async fn cancel_appointment(&self, patient_id: &str, id: Uuid) -> Result<Appointment, AppointmentError> {
        let mut directory = self.directory.write().await;
        owned(&directory, patient_id, id)?;

        let cancelled = directory.apply(DirectoryAction::Cancel { id }, Utc::now())?;

        info!("Appointment {} cancelled by patient {}", id, patient_id);
        Ok(cancelled)
    }
}
