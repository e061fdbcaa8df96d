use async_trait::async_trait;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{is_not_found, JendoApiClient};
use shared_models::PaginationResponse;

use crate::error::DoctorError;
use crate::models::{Doctor, DoctorBackendDto, DoctorPage, DoctorSpecialty, DoctorSummary, Fetched};
use crate::services::directory::{DoctorDirectory, InMemoryDoctorDirectory};

// The backend has no search endpoint; search filters one large page.
const SEARCH_PAGE_SIZE: u32 = 100;

/// Doctor catalog served by the Jendo backend.
///
/// When `allow_fallback` is set, backend failures are answered from the local
/// catalog and the result is returned as [`Fetched::Degraded`]. Otherwise the
/// failure is propagated as [`DoctorError::Backend`].
pub struct RemoteDoctorDirectory {
    client: JendoApiClient,
    fallback: Option<InMemoryDoctorDirectory>,
}

impl RemoteDoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        let fallback = config.allow_fallback.then(InMemoryDoctorDirectory::demo);
        Self {
            client: JendoApiClient::new(config),
            fallback,
        }
    }

    pub fn with_client(client: JendoApiClient, fallback: Option<InMemoryDoctorDirectory>) -> Self {
        Self { client, fallback }
    }

    fn degrade<T>(
        &self,
        operation: &str,
        err: anyhow::Error,
        from_fallback: impl FnOnce(&InMemoryDoctorDirectory) -> T,
    ) -> Result<Fetched<T>, DoctorError> {
        match &self.fallback {
            Some(fallback) => {
                warn!("{} failed against backend, serving demo catalog: {}", operation, err);
                Ok(Fetched::Degraded {
                    value: from_fallback(fallback),
                    reason: err.to_string(),
                })
            }
            None => Err(DoctorError::Backend(format!("{}: {}", operation, err))),
        }
    }

    async fn fetch_page(&self, path: &str) -> anyhow::Result<DoctorPage> {
        let page: PaginationResponse<DoctorBackendDto> = self.client.get_data(path, None).await?;
        Ok(DoctorPage {
            doctors: page
                .content
                .into_iter()
                .map(|dto| Doctor::from(dto).summary())
                .collect(),
            total_pages: page.total_pages,
            total_elements: page.total_elements,
        })
    }
}

#[async_trait]
impl DoctorDirectory for RemoteDoctorDirectory {
    async fn get_doctor_by_id(&self, id: &str) -> Result<Fetched<Option<Doctor>>, DoctorError> {
        debug!("Fetching doctor {} from backend", id);

        let path = format!("/api/doctors/{}", id);
        match self.client.get_data::<DoctorBackendDto>(&path, None).await {
            Ok(dto) => Ok(Fetched::Live(Some(Doctor::from(dto)))),
            Err(err) if is_not_found(&err) => {
                debug!("Backend has no doctor {}", id);
                Ok(Fetched::Live(None))
            }
            Err(err) => self.degrade("get_doctor_by_id", err, |local| local.find(id).cloned()),
        }
    }

    async fn list_doctors(&self, page: u32, size: u32) -> Result<Fetched<DoctorPage>, DoctorError> {
        let path = format!("/api/doctors?page={}&size={}", page, size);
        match self.fetch_page(&path).await {
            Ok(result) => Ok(Fetched::Live(result)),
            Err(err) => self.degrade("list_doctors", err, |local| local.page(page, size)),
        }
    }

    async fn doctors_by_specialty(
        &self,
        specialty: DoctorSpecialty,
        page: u32,
        size: u32,
    ) -> Result<Fetched<DoctorPage>, DoctorError> {
        let path = format!("/api/doctors/specialty/{}?page={}&size={}", specialty, page, size);
        match self.fetch_page(&path).await {
            Ok(result) => Ok(Fetched::Live(result)),
            Err(err) => self.degrade("doctors_by_specialty", err, |local| {
                local.specialty_page(specialty, page, size)
            }),
        }
    }

    async fn search_doctors(&self, query: &str) -> Result<Fetched<Vec<DoctorSummary>>, DoctorError> {
        let path = format!("/api/doctors?page=0&size={}", SEARCH_PAGE_SIZE);
        let page: anyhow::Result<PaginationResponse<DoctorBackendDto>> =
            self.client.get_data(&path, None).await;

        match page {
            Ok(page) => {
                let matches = page
                    .content
                    .into_iter()
                    .map(Doctor::from)
                    .filter(|doctor| doctor.matches(query))
                    .map(|doctor| doctor.summary())
                    .collect();
                Ok(Fetched::Live(matches))
            }
            Err(err) => self.degrade("search_doctors", err, |local| local.search(query)),
        }
    }

    async fn available_doctors(&self) -> Result<Fetched<Vec<DoctorSummary>>, DoctorError> {
        let available: anyhow::Result<Vec<DoctorBackendDto>> =
            self.client.get_data("/api/doctors/available", None).await;

        match available {
            Ok(doctors) => Ok(Fetched::Live(
                doctors.into_iter().map(|dto| Doctor::from(dto).summary()).collect(),
            )),
            Err(err) => self.degrade("available_doctors", err, InMemoryDoctorDirectory::available),
        }
    }
}
