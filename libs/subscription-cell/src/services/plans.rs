use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::ApiClient;
use shared_models::error::AppError;
use shared_utils::normalize::{extract_list, extract_object};

use crate::models::{PaymentQrCode, SubscriptionPlan};

pub struct PlanService {
    api: ApiClient,
}

impl PlanService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }

    pub async fn list_plans(&self, auth_token: Option<&str>) -> Result<Vec<SubscriptionPlan>, AppError> {
        debug!("Fetching subscription plans");

        let body = self
            .api
            .request_value(Method::GET, "/subscription-plans", auth_token, None)
            .await?;

        let Some(items) = extract_list(&body, &["plans", "data", "data.plans"]) else {
            debug!("Unrecognised plans payload: {}", body);
            return Ok(Vec::new());
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<SubscriptionPlan>(item) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    debug!("Skipping plan entry: {}", e);
                    None
                }
            })
            .collect())
    }

    /// QR code the doctor pays against before uploading a receipt
    pub async fn payment_qr_code(&self, auth_token: Option<&str>) -> Result<PaymentQrCode, AppError> {
        let body = self
            .api
            .request_value(Method::GET, "/payment-qr-code", auth_token, None)
            .await?;

        let raw = extract_object(&body, &["data"]).unwrap_or(body);
        serde_json::from_value(raw).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }
}
