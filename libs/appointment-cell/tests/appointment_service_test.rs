use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentStatus, BookingForm};
use appointment_cell::services::{AppointmentBookingService, AppointmentService};
use shared_database::DataSource;
use shared_models::error::{AppError, GENERIC_ERROR_MESSAGE};
use shared_utils::test_utils::{MockApiResponses, TestConfig};

const DOCTOR_ID: &str = "5";
const TOKEN: &str = "doctor-token";

fn config(base_url: &str, cache_dir: &std::path::Path) -> shared_config::AppConfig {
    TestConfig::with_base_url(base_url)
        .with_cache_dir(cache_dir)
        .to_app_config()
}

async fn mount_appointments(mock_server: &MockServer, statuses: &[&str]) {
    let data: Vec<serde_json::Value> = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| MockApiResponses::appointment_response(i as i64 + 1, DOCTOR_ID, status, "2024-06-01", "10:00"))
        .collect();

    Mock::given(method("GET"))
        .and(path("/doctors/5/appointments"))
        .and(header("Authorization", "Bearer doctor-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_list_for_doctor_parses_and_caches() {
    let mock_server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();
    mount_appointments(&mock_server, &["pending", "confirmed", "unknown-status"]).await;

    let service = AppointmentService::new(&config(&mock_server.uri(), cache_dir.path()));
    let listing = service.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();

    assert_eq!(listing.source, DataSource::Network);
    assert_eq!(listing.items.len(), 2);
    assert_eq!(listing.items[0].id, "1");
    assert_eq!(listing.items[1].status, AppointmentStatus::Confirmed);

    let offline = AppointmentService::new(&config("http://127.0.0.1:1", cache_dir.path()));
    let cached = offline.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();

    assert_matches!(cached.source, DataSource::OfflineCache { .. });
    assert_eq!(cached.items, listing.items);
}

#[tokio::test]
async fn test_gateway_outage_serves_cached_appointments() {
    let cache_dir = tempfile::tempdir().unwrap();

    let online = MockServer::start().await;
    mount_appointments(&online, &["pending", "confirmed"]).await;
    let warm = AppointmentService::new(&config(&online.uri(), cache_dir.path()))
        .list_for_doctor(DOCTOR_ID, TOKEN)
        .await
        .unwrap();

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doctors/5/appointments"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "Service Unavailable"})))
        .mount(&down)
        .await;

    let service = AppointmentService::new(&config(&down.uri(), cache_dir.path()));
    let listing = service.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();

    assert_matches!(listing.source, DataSource::OfflineCache { .. });
    assert_eq!(listing.items, warm.items);
}

#[tokio::test]
async fn test_server_error_is_not_masked_by_cache() {
    let cache_dir = tempfile::tempdir().unwrap();

    let online = MockServer::start().await;
    mount_appointments(&online, &["pending"]).await;
    AppointmentService::new(&config(&online.uri(), cache_dir.path()))
        .list_for_doctor(DOCTOR_ID, TOKEN)
        .await
        .unwrap();

    let failing = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doctors/5/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Query failed"})))
        .mount(&failing)
        .await;

    let service = AppointmentService::new(&config(&failing.uri(), cache_dir.path()));
    let result = service.list_for_doctor(DOCTOR_ID, TOKEN).await;

    assert_matches!(result, Err(AppError::Backend { status: 500, .. }));
}

#[tokio::test]
async fn test_appointments_envelope_key() {
    let mock_server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/doctors/5/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appointments": [MockApiResponses::appointment_response(9, DOCTOR_ID, "completed", "2024-06-03", "15:00")]
        })))
        .mount(&mock_server)
        .await;

    let service = AppointmentService::new(&config(&mock_server.uri(), cache_dir.path()));
    let listing = service.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();

    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn test_confirm_patches_status_then_refetches() {
    let mock_server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();
    mount_appointments(&mock_server, &["pending"]).await;

    Mock::given(method("PATCH"))
        .and(path("/appointments/1/status"))
        .and(body_json(json!({"status": "confirmed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = AppointmentService::new(&config(&mock_server.uri(), cache_dir.path()));
    let listing = service.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();
    let pending = listing.items[0].clone();

    service.confirm(DOCTOR_ID, &pending, TOKEN).await.unwrap();

    let gets = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.method.as_str() == "GET")
        .count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn test_invalid_transition_is_not_sent() {
    let mock_server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();
    mount_appointments(&mock_server, &["confirmed", "cancelled"]).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = AppointmentService::new(&config(&mock_server.uri(), cache_dir.path()));
    let listing = service.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();

    let confirmed = &listing.items[0];
    let cancelled = &listing.items[1];

    assert_matches!(
        service.cancel(DOCTOR_ID, confirmed, TOKEN).await,
        Err(AppError::InvalidTransition { .. })
    );
    assert_matches!(
        service
            .update_status(DOCTOR_ID, cancelled, AppointmentStatus::Confirmed, TOKEN)
            .await,
        Err(AppError::InvalidTransition { .. })
    );
}

#[tokio::test]
async fn test_backend_error_message_surfaces() {
    let mock_server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();
    mount_appointments(&mock_server, &["pending", "pending"]).await;

    Mock::given(method("PATCH"))
        .and(path("/appointments/1/status"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"data": {"message": "Already handled"}})))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/appointments/2/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let service = AppointmentService::new(&config(&mock_server.uri(), cache_dir.path()));
    let listing = service.list_for_doctor(DOCTOR_ID, TOKEN).await.unwrap();

    let first = service.confirm(DOCTOR_ID, &listing.items[0], TOKEN).await.unwrap_err();
    assert_eq!(first.user_message(), "Already handled");

    let second = service.cancel(DOCTOR_ID, &listing.items[1], TOKEN).await.unwrap_err();
    assert_eq!(second.user_message(), GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_booking_posts_composed_phone_number() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .and(body_json(json!({
            "doctor_id": "5",
            "patient_name": "Huda",
            "phone_number": "+9647711112222",
            "appointment_date": "2024-06-02",
            "appointment_time": "11:00",
            "notes": "First visit"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": MockApiResponses::appointment_response(31, "5", "pending", "2024-06-02", "11:00")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&TestConfig::with_base_url(&mock_server.uri()).to_app_config());
    let form = BookingForm {
        doctor_id: "5".to_string(),
        patient_name: "Huda".to_string(),
        local_phone: "771 111 2222".to_string(),
        dial_code: None,
        appointment_date: "2024-06-02".to_string(),
        appointment_time: "11:00".to_string(),
        notes: Some("First visit".to_string()),
    };

    let appointment = service.create(&form, None).await.unwrap();
    assert_eq!(appointment.id, "31");
    assert_eq!(appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_booking_with_blank_name_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&TestConfig::with_base_url(&mock_server.uri()).to_app_config());
    let form = BookingForm {
        doctor_id: "5".to_string(),
        local_phone: "7711112222".to_string(),
        appointment_date: "2024-06-02".to_string(),
        appointment_time: "11:00".to_string(),
        ..Default::default()
    };

    assert_matches!(service.create(&form, None).await, Err(AppError::ValidationError(_)));
}
