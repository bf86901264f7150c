use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_utils::de::{id_string, lenient_f64, opt_id_string, opt_lenient, opt_lenient_datetime, opt_lenient_i64};

// ==============================================================================
// PAYMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Approved,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Statuses that mean the admin accepted the payment.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Approved | PaymentStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Subscription,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Monthly => "monthly",
            SubscriptionType::Yearly => "yearly",
        }
    }

    /// Used when neither the payment nor its plan state a duration.
    pub fn default_duration_days(&self) -> i64 {
        match self {
            SubscriptionType::Monthly => 30,
            SubscriptionType::Yearly => 365,
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub doctor_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_payment_type")]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub subscription_plan_id: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient")]
    pub subscription_type: Option<SubscriptionType>,
    pub status: PaymentStatus,
    #[serde(default, deserialize_with = "opt_lenient_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_lenient_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_lenient_datetime")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "opt_lenient")]
    pub plan: Option<SubscriptionPlan>,
}

fn default_payment_type() -> PaymentType {
    PaymentType::Subscription
}

impl Payment {
    pub fn is_subscription(&self) -> bool {
        self.payment_type == PaymentType::Subscription
    }

    pub fn is_pending_subscription(&self) -> bool {
        self.is_subscription() && self.status == PaymentStatus::Pending
    }

    pub fn is_paid_subscription(&self) -> bool {
        self.is_subscription() && self.status == PaymentStatus::Paid
    }
}

// ==============================================================================
// PLANS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "type", alias = "plan_type", default, deserialize_with = "opt_lenient")]
    pub plan_type: Option<SubscriptionType>,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    pub duration_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQrCode {
    pub qr_code_image_url: Option<String>,
    pub code: Option<String>,
}

// ==============================================================================
// DERIVED STATE
// ==============================================================================

/// Active period derived from the latest paid payment. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSubscriptionWindow {
    pub plan: Option<SubscriptionPlan>,
    pub status: PaymentStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount: f64,
}

impl CurrentSubscriptionWindow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemainingTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_ms: i64,
}

impl RemainingTime {
    pub fn is_expired(&self) -> bool {
        self.total_ms == 0
    }
}

/// Where the doctor dashboard should send the doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardRoute {
    Stay,
    AwaitApproval,
    RenewExpired,
    ChooseSubscription,
}

impl fmt::Display for DashboardRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DashboardRoute::Stay => "dashboard",
            DashboardRoute::AwaitApproval => "waiting-approval",
            DashboardRoute::RenewExpired => "subscription-expired",
            DashboardRoute::ChooseSubscription => "choose-subscription",
        };
        f.write_str(name)
    }
}

/// Inputs of the dashboard redirect decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSignals {
    pub has_paid_subscription_payment: bool,
    pub has_pending_subscription_payment: bool,
    pub window: Option<CurrentSubscriptionWindow>,
    pub doctor_is_active: bool,
}

// ==============================================================================
// RENEWAL
// ==============================================================================

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Receipt attached to a renewal request.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReceiptFile {
    pub fn is_supported_type(&self) -> bool {
        let content_type = self.content_type.trim().to_ascii_lowercase();
        content_type.starts_with("image/") || content_type == PDF_CONTENT_TYPE
    }
}

#[derive(Debug, Clone)]
pub struct RenewalRequest {
    pub doctor_id: String,
    pub plan: SubscriptionPlan,
    /// Plan catalog, used to size the window of the plan being renewed.
    pub plans: Vec<SubscriptionPlan>,
    pub subscription_type: SubscriptionType,
    pub payment_method: String,
    pub receipt: Option<ReceiptFile>,
}

/// Body of `POST /payments`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentRequest {
    pub doctor_id: String,
    pub amount: f64,
    pub payment_type: PaymentType,
    pub payment_method: String,
    pub subscription_plan_id: String,
    pub subscription_type: SubscriptionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_renewal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenewalOutcome {
    pub payment_id: String,
    pub reused_pending_payment: bool,
    pub receipt_url: Option<String>,
}
