use chrono::{DateTime, Utc};
use tracing::debug;

use doctor_cell::models::Doctor;

use crate::models::{CurrentSubscriptionWindow, DashboardRoute, Payment, PaymentStatus, RouteSignals, SubscriptionPlan};
use crate::services::ledger::compute_current_window;

/// Gather the redirect inputs from what the dashboard already fetched.
///
/// The payment ledger is preferred; the subscription embedded in the
/// doctor profile only supplies a window when no paid payment exists.
pub fn collect_signals(payments: &[Payment], plans: &[SubscriptionPlan], doctor: &Doctor) -> RouteSignals {
    let window = compute_current_window(payments, plans).or_else(|| profile_window(doctor, plans));

    RouteSignals {
        has_paid_subscription_payment: payments.iter().any(Payment::is_paid_subscription),
        has_pending_subscription_payment: payments.iter().any(Payment::is_pending_subscription),
        window,
        doctor_is_active: doctor.is_active(),
    }
}

fn profile_window(doctor: &Doctor, plans: &[SubscriptionPlan]) -> Option<CurrentSubscriptionWindow> {
    let subscription = doctor.subscription.as_ref()?;
    let end_date = subscription.end_date?;
    let plan = subscription
        .plan_id
        .as_deref()
        .and_then(|plan_id| plans.iter().find(|plan| plan.id == plan_id))
        .cloned();

    Some(CurrentSubscriptionWindow {
        amount: plan.as_ref().map(|plan| plan.price).unwrap_or_default(),
        plan,
        status: PaymentStatus::Paid,
        start_date: subscription.start_date.unwrap_or(end_date),
        end_date,
    })
}

/// Decide where the dashboard sends the doctor. First match wins:
///
/// 1. a paid subscription payment exists: stay
/// 2. a pending subscription payment exists: wait for approval
/// 3. the window has expired: renew
/// 4. the window is running or the doctor is active: stay
/// 5. otherwise: choose a subscription
pub fn resolve_route(signals: &RouteSignals, now: DateTime<Utc>) -> DashboardRoute {
    let route = if signals.has_paid_subscription_payment {
        DashboardRoute::Stay
    } else if signals.has_pending_subscription_payment {
        DashboardRoute::AwaitApproval
    } else if let Some(window) = &signals.window {
        if window.is_expired(now) {
            DashboardRoute::RenewExpired
        } else {
            DashboardRoute::Stay
        }
    } else if signals.doctor_is_active {
        DashboardRoute::Stay
    } else {
        DashboardRoute::ChooseSubscription
    };

    debug!("Resolved dashboard route {:?} from {:?}", route, signals);
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn expired_window() -> CurrentSubscriptionWindow {
        CurrentSubscriptionWindow {
            plan: None,
            status: PaymentStatus::Paid,
            start_date: at(2024, 1, 1),
            end_date: at(2024, 1, 31),
            amount: 0.0,
        }
    }

    #[test]
    fn test_paid_payment_beats_expired_window() {
        let signals = RouteSignals {
            has_paid_subscription_payment: true,
            has_pending_subscription_payment: true,
            window: Some(expired_window()),
            doctor_is_active: false,
        };

        assert_eq!(resolve_route(&signals, at(2024, 6, 1)), DashboardRoute::Stay);
    }

    #[test]
    fn test_rule_precedence() {
        let now = at(2024, 6, 1);

        let pending = RouteSignals {
            has_pending_subscription_payment: true,
            window: Some(expired_window()),
            ..Default::default()
        };
        assert_eq!(resolve_route(&pending, now), DashboardRoute::AwaitApproval);

        let expired = RouteSignals {
            window: Some(expired_window()),
            doctor_is_active: true,
            ..Default::default()
        };
        assert_eq!(resolve_route(&expired, now), DashboardRoute::RenewExpired);

        let running = RouteSignals {
            window: Some(expired_window()),
            ..Default::default()
        };
        assert_eq!(resolve_route(&running, at(2024, 1, 10)), DashboardRoute::Stay);

        let active = RouteSignals {
            doctor_is_active: true,
            ..Default::default()
        };
        assert_eq!(resolve_route(&active, now), DashboardRoute::Stay);

        assert_eq!(resolve_route(&RouteSignals::default(), now), DashboardRoute::ChooseSubscription);
    }

    #[test]
    fn test_collect_signals_uses_profile_subscription() {
        let doctor = Doctor::from_raw(
            &json!({
                "id": 1,
                "status": "inactive",
                "subscription": {"plan_id": 2, "start_date": "2024-01-01", "end_date": "2024-02-01"}
            }),
            &[],
        )
        .unwrap();
        let payments: Vec<Payment> = vec![serde_json::from_value(json!({
            "id": 9, "status": "failed", "created_at": "2024-01-05"
        }))
        .unwrap()];

        let signals = collect_signals(&payments, &[], &doctor);

        assert!(!signals.has_paid_subscription_payment);
        assert!(!signals.doctor_is_active);
        assert_eq!(signals.window.as_ref().map(|w| w.end_date), Some(at(2024, 2, 1)));
        assert_eq!(resolve_route(&signals, at(2024, 3, 1)), DashboardRoute::RenewExpired);
    }
}
