use std::path::PathBuf;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub offline_cache_dir: PathBuf,
    pub approval_poll_interval_seconds: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            offline_cache_dir: std::env::temp_dir().join(format!("doctor-booking-test-{}", Uuid::new_v4())),
            approval_poll_interval_seconds: 10,
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.offline_cache_dir = dir.into();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            request_timeout_seconds: 5,
            offline_cache_dir: self.offline_cache_dir.clone(),
            approval_poll_interval_seconds: self.approval_poll_interval_seconds,
            default_dial_code: "+964".to_string(),
            session_token: None,
        }
    }
}

pub struct TestDoctor {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl Default for TestDoctor {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "doctor@example.com".to_string(),
            name: "Dr. Test".to_string(),
        }
    }
}

impl TestDoctor {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(doctor: &TestDoctor, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": doctor.id,
            "email": doctor.email,
            "role": "doctor",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(doctor: &TestDoctor, secret: &str) -> String {
        Self::create_test_token(doctor, secret, Some(-1))
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn doctor_response(doctor_id: &str) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "full_name": "Dr. Test",
            "category": {"id": 2, "name": "Cardiology"},
            "clinic": {"area": "Karrada"},
            "user": {"phone": "+9647700000000", "email": "doctor@example.com"},
            "status": "active"
        })
    }

    pub fn schedule_entry(day: &str, start: &str, end: &str, active: bool) -> serde_json::Value {
        json!({
            "day_of_week": day,
            "start_time": start,
            "end_time": end,
            "appointment_duration": 30,
            "break_duration": 5,
            "is_active": active
        })
    }

    pub fn appointment_response(id: i64, doctor_id: &str, status: &str, date: &str, time: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_name": format!("Patient {}", id),
            "phone_number": "+9647701234567",
            "appointment_date": date,
            "appointment_time": time,
            "status": status,
            "notes": null
        })
    }

    pub fn payment_response(id: i64, doctor_id: &str, status: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "amount": "25000.00",
            "currency": "IQD",
            "payment_type": "subscription",
            "payment_method": "qr_code",
            "subscription_plan_id": 1,
            "subscription_type": "monthly",
            "status": status,
            "start_date": created_at,
            "duration_days": 30,
            "created_at": created_at
        })
    }

    pub fn plan_response(id: i64, plan_type: &str, price: f64, duration_days: i64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("{} plan", plan_type),
            "price": price,
            "currency": "IQD",
            "type": plan_type,
            "duration_days": duration_days
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "success": false,
            "message": message
        })
    }
}
