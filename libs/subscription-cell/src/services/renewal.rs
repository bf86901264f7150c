use chrono::{DateTime, Utc};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreatePaymentRequest, PaymentType, ReceiptFile, RenewalOutcome, RenewalRequest, SubscriptionPlan};
use crate::services::ledger::{compute_current_window, renewal_start};
use crate::services::payments::PaymentService;

pub struct RenewalService {
    payments: PaymentService,
}

impl RenewalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            payments: PaymentService::new(config),
        }
    }

    pub fn validate_receipt(receipt: Option<&ReceiptFile>) -> Result<&ReceiptFile, AppError> {
        let receipt = receipt
            .ok_or_else(|| AppError::ValidationError("Please attach the payment receipt".to_string()))?;

        if receipt.bytes.is_empty() {
            return Err(AppError::ValidationError("The receipt file is empty".to_string()));
        }
        if !receipt.is_supported_type() {
            return Err(AppError::ValidationError(
                "The receipt must be an image or a PDF".to_string(),
            ));
        }

        Ok(receipt)
    }

    /// Submit a subscription renewal.
    ///
    /// A pending subscription payment is switched to the chosen plan
    /// instead of creating a second one. A new payment starts at the
    /// current expiry while the subscription is still running. The
    /// receipt is checked before any request and uploaded last.
    pub async fn renew(
        &self,
        request: RenewalRequest,
        auth_token: &str,
        now: DateTime<Utc>,
    ) -> Result<RenewalOutcome, AppError> {
        Self::validate_receipt(request.receipt.as_ref())?;

        let payments = self.payments.list_for_doctor(&request.doctor_id, auth_token).await?;
        let pending = payments.iter().find(|payment| payment.is_pending_subscription());

        let (payment_id, reused_pending_payment) = match pending {
            Some(payment) => {
                debug!("Reusing pending payment {} for renewal", payment.id);
                self.payments
                    .update_subscription_type(&payment.id, request.subscription_type, &request.plan.id, auth_token)
                    .await?;
                (payment.id.clone(), true)
            }
            None => {
                let window = compute_current_window(&payments, &plan_catalog(&request));
                let start = renewal_start(window.as_ref(), now);

                let create = CreatePaymentRequest {
                    doctor_id: request.doctor_id.clone(),
                    amount: request.plan.price,
                    payment_type: PaymentType::Subscription,
                    payment_method: request.payment_method.clone(),
                    subscription_plan_id: request.plan.id.clone(),
                    subscription_type: request.subscription_type,
                    start_date: start.map(|start| start.to_rfc3339()),
                    is_renewal: start.map(|_| true),
                };
                let payment = self.payments.create(&create, auth_token).await?;
                (payment.id, false)
            }
        };

        let receipt = request
            .receipt
            .ok_or_else(|| AppError::ValidationError("Please attach the payment receipt".to_string()))?;
        let receipt_url = self.payments.upload_receipt(&payment_id, receipt, auth_token).await?;

        info!("Renewal submitted for doctor {} with payment {}", request.doctor_id, payment_id);

        Ok(RenewalOutcome {
            payment_id,
            reused_pending_payment,
            receipt_url,
        })
    }
}

fn plan_catalog(request: &RenewalRequest) -> Vec<SubscriptionPlan> {
    let mut plans = request.plans.clone();
    if !plans.iter().any(|plan| plan.id == request.plan.id) {
        plans.push(request.plan.clone());
    }
    plans
}
