use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{ApiClient, FileUpload};
use shared_models::error::AppError;
use shared_utils::normalize::{extract_list, extract_object, lookup};

use crate::models::{CreatePaymentRequest, Payment, ReceiptFile, SubscriptionType};

/// Thin wrapper over the payment endpoints.
#[derive(Clone)]
pub struct PaymentService {
    api: ApiClient,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }

    pub async fn list_for_doctor(&self, doctor_id: &str, auth_token: &str) -> Result<Vec<Payment>, AppError> {
        debug!("Fetching payments for doctor: {}", doctor_id);

        let path = format!("/doctors/{}/payments", urlencoding::encode(doctor_id));
        let body = self
            .api
            .request_value(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(parse_payments(&body))
    }

    pub async fn create(&self, request: &CreatePaymentRequest, auth_token: &str) -> Result<Payment, AppError> {
        debug!(
            "Creating {} payment for doctor {} (plan {})",
            request.subscription_type, request.doctor_id, request.subscription_plan_id
        );

        let body = serde_json::to_value(request).map_err(|e| AppError::Internal(e.to_string()))?;
        let response = self
            .api
            .request_value(Method::POST, "/payments", Some(auth_token), Some(body))
            .await?;

        let raw = extract_object(&response, &["payment", "data", "data.payment"])
            .ok_or_else(|| AppError::InvalidResponse("Payment missing from response".to_string()))?;
        serde_json::from_value(raw).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }

    /// Switch an existing payment to another plan
    pub async fn update_subscription_type(
        &self,
        payment_id: &str,
        subscription_type: SubscriptionType,
        subscription_plan_id: &str,
        auth_token: &str,
    ) -> Result<(), AppError> {
        debug!("Switching payment {} to {} plan {}", payment_id, subscription_type, subscription_plan_id);

        let path = format!("/payments/{}/subscription-type", urlencoding::encode(payment_id));
        self.api
            .request_value(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "subscription_type": subscription_type,
                    "subscription_plan_id": subscription_plan_id,
                })),
            )
            .await?;
        Ok(())
    }

    /// Upload a receipt and return its stored URL when the backend echoes one
    pub async fn upload_receipt(
        &self,
        payment_id: &str,
        receipt: ReceiptFile,
        auth_token: &str,
    ) -> Result<Option<String>, AppError> {
        let path = format!("/payments/{}/receipt", urlencoding::encode(payment_id));
        let upload = FileUpload {
            file_name: receipt.file_name,
            content_type: receipt.content_type,
            bytes: receipt.bytes,
        };

        let response = self.api.upload_file(&path, "file", upload, Some(auth_token)).await?;

        Ok(["receipt_url", "data.receipt_url", "payment.receipt_url"]
            .iter()
            .filter_map(|key| lookup(&response, key))
            .find_map(|value| value.as_str().map(str::to_string)))
    }
}

pub fn parse_payments(body: &Value) -> Vec<Payment> {
    let Some(items) = extract_list(body, &["payments", "data.payments", "data"]) else {
        debug!("Unrecognised payments payload: {}", body);
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Payment>(item) {
            Ok(payment) => Some(payment),
            Err(e) => {
                debug!("Skipping payment entry: {}", e);
                None
            }
        })
        .collect()
}
