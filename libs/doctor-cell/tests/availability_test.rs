use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::{
    clinic_slot_grid, AvailabilityService, DoctorError, Fetched, InMemoryDoctorDirectory,
    NoOccupancy, RemoteDoctorDirectory, SlotOccupancy, SlotSource, TimeSlot,
};
use shared_database::JendoApiClient;
use shared_utils::test_utils::MockBackendResponses;

struct FixedOccupancy(HashSet<NaiveTime>);

#[async_trait]
impl SlotOccupancy for FixedOccupancy {
    async fn occupied_times(&self, doctor_id: &str, _date: NaiveDate) -> HashSet<NaiveTime> {
        if doctor_id == "doc-002" {
            self.0.clone()
        } else {
            HashSet::new()
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn service(occupancy: Arc<dyn SlotOccupancy>) -> AvailabilityService {
    AvailabilityService::new(Arc::new(InMemoryDoctorDirectory::demo()), occupancy)
}

/// Slots from a live lookup.
async fn live_slots(service: &AvailabilityService, doctor_id: &str, date: NaiveDate) -> Vec<TimeSlot> {
    let fetched = service.get_available_slots(doctor_id, date).await.unwrap();
    assert_matches!(fetched, Fetched::Live(slots) => slots)
}

fn remote_service(server: &MockServer, allow_fallback: bool) -> AvailabilityService {
    let fallback = allow_fallback.then(InMemoryDoctorDirectory::demo);
    let directory = RemoteDoctorDirectory::with_client(JendoApiClient::with_base_url(&server.uri()), fallback);
    AvailabilityService::new(Arc::new(directory), Arc::new(NoOccupancy))
}

async fn backend_down() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn working_day_offers_the_clinic_grid_in_order() {
    let saturday = date(2024, 12, 14);
    assert_eq!(saturday.weekday(), Weekday::Sat);

    let slots = live_slots(&service(Arc::new(NoOccupancy)), "doc-002", saturday).await;

    let times: Vec<_> = slots.iter().map(|slot| slot.time).collect();
    assert_eq!(times, clinic_slot_grid());
    assert!(slots.iter().all(|slot| slot.is_available && slot.date == saturday));
    assert_eq!(slots[4].label(), "11:00 AM");
}

#[tokio::test]
async fn non_working_day_and_unknown_doctor_are_empty() {
    let service = service(Arc::new(NoOccupancy));

    // doc-001 works Monday, Wednesday and Friday.
    assert!(live_slots(&service, "doc-001", date(2024, 12, 14)).await.is_empty());
    assert!(live_slots(&service, "doc-404", date(2024, 12, 16)).await.is_empty());
}

#[tokio::test]
async fn occupied_and_blocked_slots_are_unavailable() {
    let occupied = HashSet::from([time(11, 0)]);
    let service = service(Arc::new(FixedOccupancy(occupied)));
    let saturday = date(2024, 12, 14);

    service.block_slot("doc-002", saturday, time(14, 30)).await;

    let slots = live_slots(&service, "doc-002", saturday).await;
    let unavailable: Vec<_> = slots
        .iter()
        .filter(|slot| !slot.is_available)
        .map(|slot| slot.time)
        .collect();
    assert_eq!(unavailable, vec![time(11, 0), time(14, 30)]);

    service.unblock_slot("doc-002", saturday, time(14, 30)).await;
    let slots = live_slots(&service, "doc-002", saturday).await;
    assert_eq!(slots.iter().filter(|slot| !slot.is_available).count(), 1);
}

#[tokio::test]
async fn doctor_not_accepting_patients_has_no_open_slots() {
    // doc-005 is listed but not taking appointments.
    let slots = live_slots(&service(Arc::new(NoOccupancy)), "doc-005", date(2024, 12, 14)).await;

    assert_eq!(slots.len(), clinic_slot_grid().len());
    assert!(slots.iter().all(|slot| !slot.is_available));
}

#[tokio::test]
async fn repeated_queries_are_stable() {
    let service = service(Arc::new(FixedOccupancy(HashSet::from([time(9, 30)]))));
    let saturday = date(2024, 12, 14);

    let first = live_slots(&service, "doc-002", saturday).await;
    let second = live_slots(&service, "doc-002", saturday).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn backend_outage_is_an_error_not_an_empty_day() {
    let server = backend_down().await;

    let result = remote_service(&server, false)
        .get_available_slots("12", date(2024, 12, 16))
        .await;

    assert_matches!(result, Err(DoctorError::Backend(_)));
}

#[tokio::test]
async fn backend_outage_with_fallback_is_flagged_degraded() {
    let server = backend_down().await;

    let fetched = remote_service(&server, true)
        .get_available_slots("doc-001", date(2024, 12, 16))
        .await
        .unwrap();

    let slots = assert_matches!(fetched, Fetched::Degraded { value, .. } => value);
    assert_eq!(slots.len(), clinic_slot_grid().len());
}

#[tokio::test]
async fn backend_unknown_doctor_is_an_empty_live_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/doctors/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockBackendResponses::error_response("Doctor not found")))
        .mount(&server)
        .await;

    let fetched = remote_service(&server, false)
        .get_available_slots("404", date(2024, 12, 16))
        .await
        .unwrap();

    assert_eq!(fetched, Fetched::Live(Vec::new()));
}
