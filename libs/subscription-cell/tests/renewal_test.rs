use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_models::error::AppError;
use shared_utils::test_utils::{MockApiResponses, TestConfig};
use subscription_cell::models::{ReceiptFile, RenewalRequest, SubscriptionPlan, SubscriptionType};
use subscription_cell::services::RenewalService;

const DOCTOR_ID: &str = "8";
const TOKEN: &str = "doctor-token";

fn create_service(mock_server: &MockServer) -> RenewalService {
    RenewalService::new(&TestConfig::with_base_url(&mock_server.uri()).to_app_config())
}

fn monthly_plan() -> SubscriptionPlan {
    serde_json::from_value(MockApiResponses::plan_response(3, "monthly", 25000.0, 30)).unwrap()
}

fn renewal_request() -> RenewalRequest {
    RenewalRequest {
        doctor_id: DOCTOR_ID.to_string(),
        plan: monthly_plan(),
        plans: vec![monthly_plan()],
        subscription_type: SubscriptionType::Monthly,
        payment_method: "qr_code".to_string(),
        receipt: Some(ReceiptFile {
            file_name: "receipt.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }),
    }
}

async fn mount_receipt_upload(mock_server: &MockServer, payment_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/payments/{}/receipt", payment_id)))
        .and(body_string_contains("name=\"file\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"receipt_url": "https://files.example.com/r.png"}
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_repeated_renewals_reuse_the_pending_payment() {
    let mock_server = MockServer::start().await;
    let service = create_service(&mock_server);
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    // No pending payment on the first read, one afterwards.
    Mock::given(method("GET"))
        .and(path("/doctors/8/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payments": []})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doctors/8/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"payments": [MockApiResponses::payment_response(77, DOCTOR_ID, "pending", "2024-03-01T12:00:00Z")]}
        })))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(body_partial_json(json!({
            "doctor_id": "8",
            "payment_type": "subscription",
            "subscription_plan_id": "3",
            "subscription_type": "monthly"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "payment": MockApiResponses::payment_response(77, DOCTOR_ID, "pending", "2024-03-01T12:00:00Z")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/payments/77/subscription-type"))
        .and(body_partial_json(json!({"subscription_type": "monthly", "subscription_plan_id": "3"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(2)
        .mount(&mock_server)
        .await;

    mount_receipt_upload(&mock_server, "77").await;

    let first = service.renew(renewal_request(), TOKEN, now).await.unwrap();
    assert!(!first.reused_pending_payment);
    assert_eq!(first.payment_id, "77");
    assert_eq!(first.receipt_url.as_deref(), Some("https://files.example.com/r.png"));

    for _ in 0..2 {
        let again = service.renew(renewal_request(), TOKEN, now).await.unwrap();
        assert!(again.reused_pending_payment);
        assert_eq!(again.payment_id, "77");
    }
}

#[tokio::test]
async fn test_renewal_extends_from_current_expiry() {
    let mock_server = MockServer::start().await;
    let service = create_service(&mock_server);
    let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/doctors/8/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payments": [MockApiResponses::payment_response(5, DOCTOR_ID, "paid", "2024-01-01T00:00:00Z")]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(body_partial_json(json!({
            "start_date": "2024-01-31T00:00:00+00:00",
            "is_renewal": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": MockApiResponses::payment_response(6, DOCTOR_ID, "pending", "2024-01-20T00:00:00Z")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_receipt_upload(&mock_server, "6").await;

    let outcome = service.renew(renewal_request(), TOKEN, now).await.unwrap();
    assert_eq!(outcome.payment_id, "6");
    assert!(!outcome.reused_pending_payment);
}

#[tokio::test]
async fn test_renewal_sizes_current_window_from_its_own_plan() {
    let mock_server = MockServer::start().await;
    let service = create_service(&mock_server);
    let now = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();

    // Paid on a 90 day plan; neither the payment nor its type give the length.
    Mock::given(method("GET"))
        .and(path("/doctors/8/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payments": [{
                "id": 5,
                "doctor_id": DOCTOR_ID,
                "amount": 60000,
                "payment_type": "subscription",
                "subscription_plan_id": 9,
                "status": "paid",
                "start_date": "2024-01-01T00:00:00Z",
                "created_at": "2024-01-01T00:00:00Z"
            }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(body_partial_json(json!({
            "subscription_plan_id": "3",
            "start_date": "2024-03-31T00:00:00+00:00",
            "is_renewal": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": MockApiResponses::payment_response(6, DOCTOR_ID, "pending", "2024-02-10T00:00:00Z")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_receipt_upload(&mock_server, "6").await;

    let quarterly: SubscriptionPlan =
        serde_json::from_value(MockApiResponses::plan_response(9, "monthly", 60000.0, 90)).unwrap();
    let mut request = renewal_request();
    request.plans = vec![quarterly, monthly_plan()];

    let outcome = service.renew(request, TOKEN, now).await.unwrap();
    assert_eq!(outcome.payment_id, "6");
}

#[tokio::test]
async fn test_missing_receipt_blocks_renewal_before_any_request() {
    let mock_server = MockServer::start().await;
    let service = create_service(&mock_server);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payments": []})))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut request = renewal_request();
    request.receipt = None;

    let result = service.renew(request, TOKEN, Utc::now()).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}
