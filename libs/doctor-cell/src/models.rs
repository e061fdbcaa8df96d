use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::labels::{date_label, time_label};

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorSpecialty {
    Cardiologist,
    Neurologist,
    Dermatologist,
    Pediatrician,
    Orthopedic,
    Gynecologist,
    Ophthalmologist,
    Psychiatrist,
    Endocrinologist,
    General,
}

impl DoctorSpecialty {
    /// Maps backend spellings ("Cardiology", "general practitioner", ...) onto
    /// the app's specialties. Anything unrecognised is treated as general.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "cardiology" | "cardiologist" => DoctorSpecialty::Cardiologist,
            "neurology" | "neurologist" => DoctorSpecialty::Neurologist,
            "dermatology" | "dermatologist" => DoctorSpecialty::Dermatologist,
            "pediatrics" | "pediatrician" => DoctorSpecialty::Pediatrician,
            "orthopedics" | "orthopedic" => DoctorSpecialty::Orthopedic,
            "gynecology" | "gynecologist" => DoctorSpecialty::Gynecologist,
            "ophthalmology" | "ophthalmologist" => DoctorSpecialty::Ophthalmologist,
            "psychiatry" | "psychiatrist" => DoctorSpecialty::Psychiatrist,
            "endocrinology" | "endocrinologist" => DoctorSpecialty::Endocrinologist,
            _ => DoctorSpecialty::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorSpecialty::Cardiologist => "cardiologist",
            DoctorSpecialty::Neurologist => "neurologist",
            DoctorSpecialty::Dermatologist => "dermatologist",
            DoctorSpecialty::Pediatrician => "pediatrician",
            DoctorSpecialty::Orthopedic => "orthopedic",
            DoctorSpecialty::Gynecologist => "gynecologist",
            DoctorSpecialty::Ophthalmologist => "ophthalmologist",
            DoctorSpecialty::Psychiatrist => "psychiatrist",
            DoctorSpecialty::Endocrinologist => "endocrinologist",
            DoctorSpecialty::General => "general",
        }
    }
}

impl fmt::Display for DoctorSpecialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: DoctorSpecialty,
    pub hospital: String,
    pub experience_years: u32,
    pub rating: f32,
    pub review_count: u32,
    pub image_url: Option<String>,
    pub about: String,
    pub qualifications: Vec<String>,
    /// Weekday names as entered by the clinic, e.g. "Monday".
    pub available_days: Vec<String>,
    pub consultation_fee: f64,
    pub is_available: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Doctor {
    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            specialty: self.specialty,
            hospital: self.hospital.clone(),
            rating: self.rating,
            image_url: self.image_url.clone(),
            is_available: self.is_available,
        }
    }

    /// Weekdays parsed from `available_days`; unreadable entries are skipped.
    pub fn working_days(&self) -> Vec<Weekday> {
        self.available_days
            .iter()
            .filter_map(|day| day.trim().parse::<Weekday>().ok())
            .collect()
    }

    /// Case-insensitive match on name, specialty or hospital.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.specialty.as_str().contains(&query)
            || self.hospital.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: String,
    pub name: String,
    pub specialty: DoctorSpecialty,
    pub hospital: String,
    pub rating: f32,
    pub image_url: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorPage {
    pub doctors: Vec<DoctorSummary>,
    pub total_pages: u32,
    pub total_elements: u64,
}

// ==============================================================================
// BACKEND DTOs
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorBackendDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub hospital: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Comma separated.
    pub qualifications: Option<String>,
    pub image_url: Option<String>,
    pub address: Option<String>,
    pub is_available: Option<bool>,
    /// Comma separated weekday names.
    pub available_days: Option<String>,
    #[serde(default)]
    pub consultation_fees: Vec<ConsultationFeeDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationFeeDto {
    pub id: Option<i64>,
    pub fee_type: Option<String>,
    pub amount: f64,
    pub currency: Option<String>,
}

// The backend does not track these yet.
const DEFAULT_RATING: f32 = 4.5;

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl From<DoctorBackendDto> for Doctor {
    fn from(dto: DoctorBackendDto) -> Self {
        let consultation_fee = dto.consultation_fees.first().map(|fee| fee.amount).unwrap_or(0.0);

        Doctor {
            id: dto.id.to_string(),
            name: dto.name,
            specialty: DoctorSpecialty::normalize(&dto.specialty),
            hospital: dto.hospital,
            experience_years: 0,
            rating: DEFAULT_RATING,
            review_count: 0,
            image_url: dto.image_url,
            about: String::new(),
            qualifications: split_list(dto.qualifications.as_deref()),
            available_days: split_list(dto.available_days.as_deref()),
            consultation_fee,
            is_available: dto.is_available.unwrap_or(true),
            phone: dto.phone,
            email: dto.email,
        }
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_available: bool,
}

impl TimeSlot {
    pub fn label(&self) -> String {
        time_label(self.time)
    }

    pub fn date_label(&self) -> String {
        date_label(self.date)
    }
}

/// Weekly schedule a doctor's slots are drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorSchedule {
    pub doctor_id: String,
    pub working_days: Vec<Weekday>,
    pub slot_times: Vec<NaiveTime>,
    pub accepting_patients: bool,
}

impl DoctorSchedule {
    pub fn for_doctor(doctor: &Doctor) -> Self {
        Self {
            doctor_id: doctor.id.clone(),
            working_days: doctor.working_days(),
            slot_times: clinic_slot_grid(),
            accepting_patients: doctor.is_available,
        }
    }

    pub fn works_on(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday())
    }
}

/// The clinic's bookable times: every 30 minutes, 9:00-11:30 and 14:00-16:30.
pub fn clinic_slot_grid() -> Vec<NaiveTime> {
    [9, 10, 11, 14, 15, 16]
        .iter()
        .flat_map(|&hour| [0, 30].map(move |minute| NaiveTime::from_hms_opt(hour, minute, 0)))
        .flatten()
        .collect()
}

// ==============================================================================
// FETCH RESULT
// ==============================================================================

/// Result of a lookup that may have been answered from fallback data.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Live(T),
    Degraded { value: T, reason: String },
}

impl<T> Fetched<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Fetched::Live(value) | Fetched::Degraded { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Live(value) | Fetched::Degraded { value, .. } => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Live(value) => Fetched::Live(f(value)),
            Fetched::Degraded { value, reason } => Fetched::Degraded { value: f(value), reason },
        }
    }
}

impl<T> Fetched<Option<T>> {
    /// `None` when the lookup found nothing, keeping the degraded marker otherwise.
    pub fn transpose(self) -> Option<Fetched<T>> {
        match self {
            Fetched::Live(value) => value.map(Fetched::Live),
            Fetched::Degraded { value, reason } => {
                value.map(|value| Fetched::Degraded { value, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn specialty_normalization() {
        assert_eq!(DoctorSpecialty::normalize(" Cardiology "), DoctorSpecialty::Cardiologist);
        assert_eq!(DoctorSpecialty::normalize("general practitioner"), DoctorSpecialty::General);
        assert_eq!(DoctorSpecialty::normalize("radiology"), DoctorSpecialty::General);
    }

    #[test]
    fn backend_dto_mapping() {
        let dto: DoctorBackendDto = serde_json::from_value(json!({
            "id": 7,
            "name": "Dr. Test",
            "specialty": "Neurology",
            "hospital": "Nawaloka Hospital",
            "qualifications": "MBBS, MD Neurology,",
            "availableDays": "Monday , Thursday",
            "consultationFees": [{ "id": 1, "feeType": "IN_PERSON", "amount": 4000, "currency": "LKR" }]
        }))
        .unwrap();

        let doctor = Doctor::from(dto);
        assert_eq!(doctor.id, "7");
        assert_eq!(doctor.specialty, DoctorSpecialty::Neurologist);
        assert_eq!(doctor.qualifications, vec!["MBBS", "MD Neurology"]);
        assert_eq!(doctor.working_days(), vec![Weekday::Mon, Weekday::Thu]);
        assert_eq!(doctor.consultation_fee, 4000.0);
        assert!(doctor.is_available);
    }

    #[test]
    fn missing_fees_default_to_zero() {
        let dto: DoctorBackendDto = serde_json::from_value(json!({
            "id": 8,
            "name": "Dr. Fee",
            "isAvailable": false
        }))
        .unwrap();

        let doctor = Doctor::from(dto);
        assert_eq!(doctor.consultation_fee, 0.0);
        assert!(!doctor.is_available);
        assert!(doctor.available_days.is_empty());
    }

    #[test]
    fn clinic_grid_is_chronological() {
        let grid = clinic_slot_grid();
        assert_eq!(grid.len(), 12);
        assert!(grid.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(grid[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(grid[11], NaiveTime::from_hms_opt(16, 30, 0).unwrap());
    }

    #[test]
    fn fetched_map_keeps_reason() {
        let fetched = Fetched::Degraded { value: 2, reason: "offline".to_string() }.map(|v| v * 2);
        assert!(fetched.is_degraded());
        assert_eq!(*fetched.value(), 4);
    }
}
