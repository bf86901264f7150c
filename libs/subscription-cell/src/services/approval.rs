use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{Payment, PaymentStatus};
use crate::services::payments::PaymentService;

#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalOutcome {
    Approved(Payment),
    /// The watched payment was failed or cancelled by the admin.
    Rejected(Payment),
    Cancelled,
}

/// Re-reads the doctor's payments on a fixed interval until the pending
/// subscription payment is settled or rejected, or the wait is cancelled.
///
/// The watched payment is the one given to [`for_payment`](Self::for_payment),
/// otherwise the latest pending subscription payment of the first read.
#[derive(Clone)]
pub struct ApprovalPoller {
    payments: PaymentService,
    poll_interval: Duration,
    payment_id: Option<String>,
}

/// Running poller. Dropping the handle cancels the wait.
pub struct ApprovalHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<ApprovalOutcome>,
}

impl ApprovalHandle {
    pub fn cancel(&self) {
        // The task may already have finished; nothing to signal then.
        let _ = self.cancel.send(true);
    }

    pub async fn outcome(self) -> ApprovalOutcome {
        let ApprovalHandle { cancel, task } = self;
        let outcome = task.await.unwrap_or_else(|e| {
            warn!("Approval poller stopped abnormally: {}", e);
            ApprovalOutcome::Cancelled
        });
        drop(cancel);
        outcome
    }
}

impl ApprovalPoller {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            payments: PaymentService::new(config),
            poll_interval: Duration::from_secs(config.approval_poll_interval_seconds.max(1)),
            payment_id: None,
        }
    }

    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn for_payment(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn spawn(self, doctor_id: String, auth_token: String) -> ApprovalHandle {
        let (cancel, cancelled) = watch::channel(false);
        let task = tokio::spawn(async move { self.wait_for_approval(&doctor_id, &auth_token, cancelled).await });
        ApprovalHandle { cancel, task }
    }

    /// Poll until approval or until `cancelled` flips to `true` (or its
    /// sender goes away). Failed reads are logged and retried on the next
    /// tick.
    #[instrument(skip(self, auth_token, cancelled))]
    pub async fn wait_for_approval(
        &self,
        doctor_id: &str,
        auth_token: &str,
        mut cancelled: watch::Receiver<bool>,
    ) -> ApprovalOutcome {
        let mut watched = self.payment_id.clone();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *cancelled.borrow() {
                debug!("Approval wait cancelled");
                return ApprovalOutcome::Cancelled;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.payments.list_for_doctor(doctor_id, auth_token).await {
                        Ok(payments) => {
                            if let Some(outcome) = check_payments(&payments, &mut watched) {
                                return outcome;
                            }
                            debug!("Subscription payment not reviewed yet");
                        }
                        Err(e) => warn!("Failed to check payment status: {}", e),
                    }
                }
                changed = cancelled.changed() => {
                    if changed.is_err() {
                        debug!("Approval wait abandoned");
                        return ApprovalOutcome::Cancelled;
                    }
                }
            }
        }
    }
}

fn check_payments(payments: &[Payment], watched: &mut Option<String>) -> Option<ApprovalOutcome> {
    if watched.is_none() {
        *watched = payments
            .iter()
            .filter(|payment| payment.is_pending_subscription())
            .max_by_key(|payment| payment.created_at)
            .map(|payment| payment.id.clone());

        // Nothing pending: an approval may already have landed before the first read.
        if watched.is_none() {
            return payments
                .iter()
                .filter(|payment| payment.is_subscription() && payment.status.is_settled())
                .max_by_key(|payment| payment.created_at)
                .map(|payment| {
                    info!("Subscription payment {} approved", payment.id);
                    ApprovalOutcome::Approved(payment.clone())
                });
        }
    }

    let payment_id = watched.as_deref()?;
    let Some(payment) = payments.iter().find(|payment| payment.id == payment_id) else {
        debug!("Watched payment {} missing from the list", payment_id);
        return None;
    };

    match payment.status {
        status if status.is_settled() => {
            info!("Subscription payment {} approved", payment.id);
            Some(ApprovalOutcome::Approved(payment.clone()))
        }
        PaymentStatus::Failed | PaymentStatus::Cancelled => {
            warn!("Subscription payment {} was {:?}", payment.id, payment.status);
            Some(ApprovalOutcome::Rejected(payment.clone()))
        }
        _ => None,
    }
}
