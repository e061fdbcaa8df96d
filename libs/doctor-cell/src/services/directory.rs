use async_trait::async_trait;
use tracing::debug;

use shared_models::PaginationResponse;

use crate::error::DoctorError;
use crate::models::{Doctor, DoctorPage, DoctorSpecialty, DoctorSummary, Fetched};

/// Read access to the doctor catalog.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// `Ok(None)` when no doctor has this id.
    async fn get_doctor_by_id(&self, id: &str) -> Result<Fetched<Option<Doctor>>, DoctorError>;

    async fn list_doctors(&self, page: u32, size: u32) -> Result<Fetched<DoctorPage>, DoctorError>;

    async fn doctors_by_specialty(
        &self,
        specialty: DoctorSpecialty,
        page: u32,
        size: u32,
    ) -> Result<Fetched<DoctorPage>, DoctorError>;

    async fn search_doctors(&self, query: &str) -> Result<Fetched<Vec<DoctorSummary>>, DoctorError>;

    /// Doctors currently accepting appointments, unpaged.
    async fn available_doctors(&self) -> Result<Fetched<Vec<DoctorSummary>>, DoctorError>;
}

pub(crate) fn page_of(doctors: Vec<DoctorSummary>, page: u32, size: u32) -> DoctorPage {
    let paged = PaginationResponse::paginate(doctors, page, size);
    DoctorPage {
        doctors: paged.content,
        total_pages: paged.total_pages,
        total_elements: paged.total_elements,
    }
}

/// Catalog held in memory. Used when no backend is configured and as the
/// fallback source for [`crate::RemoteDoctorDirectory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDoctorDirectory {
    doctors: Vec<Doctor>,
}

impl InMemoryDoctorDirectory {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }

    pub fn demo() -> Self {
        Self::new(demo_doctors())
    }

    pub fn find(&self, id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|doctor| doctor.id == id)
    }

    pub fn page(&self, page: u32, size: u32) -> DoctorPage {
        page_of(self.doctors.iter().map(Doctor::summary).collect(), page, size)
    }

    pub fn specialty_page(&self, specialty: DoctorSpecialty, page: u32, size: u32) -> DoctorPage {
        let matching = self
            .doctors
            .iter()
            .filter(|doctor| doctor.specialty == specialty)
            .map(Doctor::summary)
            .collect();
        page_of(matching, page, size)
    }

    pub fn available(&self) -> Vec<DoctorSummary> {
        self.doctors
            .iter()
            .filter(|doctor| doctor.is_available)
            .map(Doctor::summary)
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<DoctorSummary> {
        self.doctors
            .iter()
            .filter(|doctor| doctor.matches(query))
            .map(Doctor::summary)
            .collect()
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get_doctor_by_id(&self, id: &str) -> Result<Fetched<Option<Doctor>>, DoctorError> {
        debug!("Looking up doctor {} in local catalog", id);
        Ok(Fetched::Live(self.find(id).cloned()))
    }

    async fn list_doctors(&self, page: u32, size: u32) -> Result<Fetched<DoctorPage>, DoctorError> {
        Ok(Fetched::Live(self.page(page, size)))
    }

    async fn doctors_by_specialty(
        &self,
        specialty: DoctorSpecialty,
        page: u32,
        size: u32,
    ) -> Result<Fetched<DoctorPage>, DoctorError> {
        Ok(Fetched::Live(self.specialty_page(specialty, page, size)))
    }

    async fn search_doctors(&self, query: &str) -> Result<Fetched<Vec<DoctorSummary>>, DoctorError> {
        Ok(Fetched::Live(self.search(query)))
    }

    async fn available_doctors(&self) -> Result<Fetched<Vec<DoctorSummary>>, DoctorError> {
        Ok(Fetched::Live(self.available()))
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_doctor(
    id: &str,
    name: &str,
    specialty: DoctorSpecialty,
    hospital: &str,
    experience_years: u32,
    rating: f32,
    review_count: u32,
    image_url: &str,
    about: &str,
    qualifications: &[&str],
    available_days: &[&str],
    consultation_fee: f64,
    is_available: bool,
    phone: &str,
    email: &str,
) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialty,
        hospital: hospital.to_string(),
        experience_years,
        rating,
        review_count,
        image_url: Some(image_url.to_string()),
        about: about.to_string(),
        qualifications: qualifications.iter().map(|q| q.to_string()).collect(),
        available_days: available_days.iter().map(|d| d.to_string()).collect(),
        consultation_fee,
        is_available,
        phone: Some(phone.to_string()),
        email: Some(email.to_string()),
    }
}

/// The bundled demo catalog.
pub fn demo_doctors() -> Vec<Doctor> {
    vec![
        demo_doctor(
            "doc-001",
            "Dr. Sarah Johnson",
            DoctorSpecialty::Cardiologist,
            "National Hospital, Colombo",
            15,
            4.9,
            234,
            "https://randomuser.me/api/portraits/women/45.jpg",
            "Dr. Sarah Johnson is a highly experienced cardiologist with over 15 years of expertise in treating cardiovascular diseases.",
            &["MBBS", "MD Cardiology", "FACC"],
            &["Monday", "Wednesday", "Friday"],
            3500.0,
            true,
            "+94 11 234 5678",
            "dr.johnson@hospital.com",
        ),
        demo_doctor(
            "doc-002",
            "Dr. Michael Chen",
            DoctorSpecialty::Endocrinologist,
            "Lanka Hospitals",
            12,
            4.8,
            189,
            "https://randomuser.me/api/portraits/men/32.jpg",
            "Dr. Michael Chen is an expert endocrinologist focusing on diabetes management and thyroid disorders.",
            &["MBBS", "MD Internal Medicine", "DM Endocrinology"],
            &["Tuesday", "Thursday", "Saturday"],
            3000.0,
            true,
            "+94 11 345 6789",
            "dr.chen@lankahospitals.com",
        ),
        demo_doctor(
            "doc-003",
            "Dr. Amanda Williams",
            DoctorSpecialty::General,
            "Asiri Medical Hospital",
            8,
            4.7,
            156,
            "https://randomuser.me/api/portraits/women/68.jpg",
            "Dr. Amanda Williams is a dedicated general practitioner with expertise in preventive medicine.",
            &["MBBS", "MRCGP"],
            &["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
            2000.0,
            true,
            "+94 11 456 7890",
            "dr.williams@asiri.com",
        ),
        demo_doctor(
            "doc-004",
            "Dr. Robert Lee",
            DoctorSpecialty::Neurologist,
            "Nawaloka Hospital",
            20,
            4.9,
            312,
            "https://randomuser.me/api/portraits/men/55.jpg",
            "Dr. Robert Lee is a renowned neurologist with two decades of experience in treating complex neurological conditions.",
            &["MBBS", "MD Neurology", "Fellowship in Movement Disorders"],
            &["Monday", "Thursday"],
            4000.0,
            true,
            "+94 11 567 8901",
            "dr.lee@nawaloka.com",
        ),
        demo_doctor(
            "doc-005",
            "Dr. Priya Sharma",
            DoctorSpecialty::Cardiologist,
            "Durdans Hospital",
            10,
            4.6,
            145,
            "https://randomuser.me/api/portraits/women/33.jpg",
            "Dr. Priya Sharma is a cardiac specialist focusing on interventional cardiology.",
            &["MBBS", "MD Cardiology", "DM Interventional Cardiology"],
            &["Tuesday", "Wednesday", "Friday", "Saturday"],
            3500.0,
            false,
            "+94 11 678 9012",
            "dr.sharma@durdans.com",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_catalog_lookup() {
        let directory = InMemoryDoctorDirectory::demo();

        let found = directory.get_doctor_by_id("doc-002").await.unwrap();
        assert!(!found.is_degraded());
        assert_eq!(found.into_inner().unwrap().name, "Dr. Michael Chen");

        let missing = directory.get_doctor_by_id("doc-999").await.unwrap();
        assert!(missing.into_inner().is_none());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let directory = InMemoryDoctorDirectory::demo();

        let by_hospital = directory.search_doctors("nawaloka").await.unwrap().into_inner();
        assert_eq!(by_hospital.len(), 1);
        assert_eq!(by_hospital[0].id, "doc-004");

        let by_specialty = directory.search_doctors("CARDIO").await.unwrap().into_inner();
        let ids: Vec<_> = by_specialty.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-001", "doc-005"]);
    }

    #[tokio::test]
    async fn specialty_listing_is_paged() {
        let directory = InMemoryDoctorDirectory::demo();

        let page = directory
            .doctors_by_specialty(DoctorSpecialty::Cardiologist, 0, 1)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.doctors.len(), 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test]
    async fn available_skips_doctors_not_accepting_patients() {
        let directory = InMemoryDoctorDirectory::demo();

        let available = directory.available_doctors().await.unwrap().into_inner();
        let ids: Vec<_> = available.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-001", "doc-002", "doc-003", "doc-004"]);
        assert!(available.iter().all(|d| d.is_available));
    }
}
