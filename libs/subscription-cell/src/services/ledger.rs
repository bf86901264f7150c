use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::{CurrentSubscriptionWindow, Payment, RemainingTime, SubscriptionPlan};

/// Used when neither payment, plan nor subscription type give a duration.
pub const DEFAULT_DURATION_DAYS: i64 = 30;

/// Window of the most recently created `paid` subscription payment.
///
/// The end date comes from the payment when the backend supplied one;
/// otherwise it is `start + duration_days`, the duration taken from the
/// payment, then its plan, then the subscription type.
pub fn compute_current_window(payments: &[Payment], plans: &[SubscriptionPlan]) -> Option<CurrentSubscriptionWindow> {
    let latest = payments
        .iter()
        .filter(|payment| payment.is_paid_subscription())
        .max_by_key(|payment| payment.created_at)?;

    let Some(start_date) = latest.start_date.or(latest.created_at) else {
        debug!("Paid payment {} has no start date, ignoring", latest.id);
        return None;
    };

    let plan = resolve_plan(latest, plans);
    let end_date = latest
        .end_date
        .or(latest.expires_at)
        .unwrap_or_else(|| start_date + Duration::days(duration_days(latest, plan.as_ref())));

    Some(CurrentSubscriptionWindow {
        plan,
        status: latest.status,
        start_date,
        end_date,
        amount: latest.amount,
    })
}

fn resolve_plan(payment: &Payment, plans: &[SubscriptionPlan]) -> Option<SubscriptionPlan> {
    payment.plan.clone().or_else(|| {
        let plan_id = payment.subscription_plan_id.as_deref()?;
        plans.iter().find(|plan| plan.id == plan_id).cloned()
    })
}

fn duration_days(payment: &Payment, plan: Option<&SubscriptionPlan>) -> i64 {
    let positive = |days: Option<i64>| days.filter(|days| *days > 0);

    positive(payment.duration_days)
        .or_else(|| positive(plan.and_then(|plan| plan.duration_days)))
        .or_else(|| {
            payment
                .subscription_type
                .or_else(|| plan.and_then(|plan| plan.plan_type))
                .map(|kind| kind.default_duration_days())
        })
        .unwrap_or(DEFAULT_DURATION_DAYS)
}

/// Time left in `window` at `now`, floored at zero.
pub fn remaining_time(window: Option<&CurrentSubscriptionWindow>, now: DateTime<Utc>) -> RemainingTime {
    let Some(window) = window else {
        return RemainingTime::default();
    };

    let total_ms = (window.end_date - now).num_milliseconds().max(0);
    let total_seconds = total_ms / 1000;

    RemainingTime {
        days: total_seconds / 86_400,
        hours: (total_seconds % 86_400) / 3_600,
        minutes: (total_seconds % 3_600) / 60,
        seconds: total_seconds % 60,
        total_ms,
    }
}

/// Start of a renewal: the current expiry while the window is still
/// running, otherwise `None` so the backend starts it now.
pub fn renewal_start(window: Option<&CurrentSubscriptionWindow>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    window
        .filter(|window| !window.is_expired(now))
        .map(|window| window.end_date)
}
