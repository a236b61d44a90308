// libs/dentist-cell/tests/availability_test.rs

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dentist_cell::models::DentistError;
use dentist_cell::services::AvailabilityService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn dentist_with_hours(id: &str, working_hours: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "full_name": "Dr. Test Dentist",
        "email": "dentist@example.com",
        "is_available": true,
        "working_hours": working_hours,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn short_monday() -> serde_json::Value {
    json!({
        "monday": {"start": "09:00", "end": "10:00"},
        "tuesday": {"closed": true},
        "wednesday": {"closed": true},
        "thursday": {"closed": true},
        "friday": {"closed": true},
        "saturday": {"closed": true},
        "sunday": {"closed": true}
    })
}

async fn mount_dentist(server: &MockServer, dentist: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([dentist])))
        .mount(server)
        .await;
}

async fn mount_appointments(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

fn service_for(server: &MockServer) -> AvailabilityService {
    let state = TestConfig::with_store_url(&server.uri()).to_state();
    AvailabilityService::new(&state)
}

fn slot_strings(slots: &[shared_models::schedule::SlotTime]) -> Vec<String> {
    slots.iter().map(|s| s.to_string()).collect()
}

// 2025-06-02 is a Monday
const MONDAY: &str = "2025-06-02";
const SATURDAY: &str = "2025-06-07";

#[tokio::test]
async fn full_grid_when_nothing_is_booked() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    mount_appointments(&server, json!([])).await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert!(result.available);
    assert_eq!(slot_strings(&result.time_slots), vec!["09:00", "09:30"]);

    let hours = result.working_hours.unwrap();
    assert_eq!(hours.start.to_string(), "09:00");
    assert_eq!(hours.end.to_string(), "10:00");
}

#[tokio::test]
async fn confirmed_appointment_removes_its_slot() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    mount_appointments(
        &server,
        json!([MockStoreResponses::appointment_record(
            &patient_id,
            &dentist_id,
            MONDAY,
            "09:00",
            "confirmed"
        )]),
    )
    .await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert!(result.available);
    assert_eq!(slot_strings(&result.time_slots), vec!["09:30"]);
}

#[tokio::test]
async fn range_format_slot_is_normalized_to_its_start() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    mount_appointments(
        &server,
        json!([MockStoreResponses::appointment_record(
            &patient_id,
            &dentist_id,
            MONDAY,
            "09:30-10:00",
            "pending"
        )]),
    )
    .await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(slot_strings(&result.time_slots), vec!["09:00"]);
}

#[tokio::test]
async fn off_grid_booked_slot_has_no_effect() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    // Legacy odd time that does not line up with the 30-minute grid
    mount_appointments(
        &server,
        json!([MockStoreResponses::appointment_record(
            &patient_id,
            &dentist_id,
            MONDAY,
            "09:15",
            "confirmed"
        )]),
    )
    .await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(slot_strings(&result.time_slots), vec!["09:00", "09:30"]);
}

#[tokio::test]
async fn closed_day_is_a_normal_negative_result() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    mount_appointments(&server, json!([])).await;

    let result = service_for(&server)
        .get_availability(&dentist_id, SATURDAY.parse().unwrap())
        .await
        .unwrap();

    assert!(!result.available);
    assert!(result.time_slots.is_empty());
    assert!(result.message.is_some());
    assert!(result.working_hours.is_none());
}

#[tokio::test]
async fn globally_unavailable_dentist_yields_no_slots() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();

    mount_dentist(
        &server,
        MockStoreResponses::dentist_record(&dentist_id, false),
    )
    .await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert!(!result.available);
    assert!(result.time_slots.is_empty());
    assert!(result.message.is_some());
}

#[tokio::test]
async fn unknown_dentist_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .get_availability(&Uuid::new_v4().to_string(), MONDAY.parse().unwrap())
        .await;

    assert_matches!(result, Err(DentistError::NotFound));
}

#[tokio::test]
async fn resolver_is_idempotent_without_data_changes() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    mount_appointments(&server, json!([])).await;

    let service = service_for(&server);
    let first = service
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();
    let second = service
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(first.available, second.available);
    assert_eq!(first.time_slots, second.time_slots);
}

#[tokio::test]
async fn slots_stay_within_working_hours() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();

    mount_dentist(
        &server,
        MockStoreResponses::dentist_record(&dentist_id, true),
    )
    .await;
    mount_appointments(&server, json!([])).await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    let hours = result.working_hours.unwrap();
    for slot in &result.time_slots {
        assert!(hours.start <= *slot && *slot < hours.end);
    }

    // Strictly increasing by the 30-minute interval
    for pair in result.time_slots.windows(2) {
        assert_eq!(pair[1].minute_of_day(), pair[0].minute_of_day() + 30);
    }
}

#[tokio::test]
async fn booked_filter_only_counts_slot_occupying_statuses() {
    let server = MockServer::start().await;
    let dentist_id = Uuid::new_v4().to_string();

    mount_dentist(&server, dentist_with_hours(&dentist_id, short_monday())).await;
    // The service asks the store for pending/confirmed rows only; a cancelled
    // row therefore never reaches it. Prove the filter is in the query.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(pending,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .get_availability(&dentist_id, MONDAY.parse().unwrap())
        .await
        .unwrap();

    assert_eq!(slot_strings(&result.time_slots), vec!["09:00", "09:30"]);
}
