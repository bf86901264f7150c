use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use tracing::{info, warn};

use appointment_cell::models::{AppointmentFilter, AppointmentStats, StatusFilter};
use appointment_cell::services::AppointmentService;
use doctor_cell::services::{candidate_dates, AvailabilityService, DoctorService, ScheduleService};
use shared_config::AppConfig;
use shared_database::{DataSource, Listing};
use shared_models::error::AppError;
use shared_utils::Session;
use subscription_cell::services::{
    collect_signals, compute_current_window, remaining_time, resolve_route, ApprovalOutcome, ApprovalPoller,
    PaymentService, PlanService,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// Backend and validation errors are shown the way the app would show them.
fn surface(e: AppError) -> anyhow::Error {
    anyhow!(e.user_message())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_source<T>(listing: &Listing<T>) {
    if let DataSource::OfflineCache { saved_at } = &listing.source {
        warn!("Backend unreachable, showing data saved at {}", saved_at);
    }
}

async fn login(config: &AppConfig) -> Result<Session> {
    let token = config
        .session_token
        .as_deref()
        .context("SESSION_TOKEN is not set")?;

    let doctors = DoctorService::new(config);
    let categories = doctors.list_categories().await.unwrap_or_else(|e| {
        warn!("Categories unavailable: {}", e);
        Vec::new()
    });
    let me = doctors.get_me(token, &categories).await.map_err(surface)?;

    let session = Session::login(token, me.id).map_err(surface)?;
    if session.is_expired(Utc::now()) {
        warn!("Session token has expired, requests will likely be rejected");
    }
    Ok(session)
}

pub fn dates(today_override: Option<NaiveDate>) -> Result<()> {
    for date in candidate_dates(today_override.unwrap_or_else(today)) {
        println!("{}", date.format("%Y-%m-%d"));
    }
    Ok(())
}

pub async fn slots(config: &AppConfig, doctor_id: &str, date: NaiveDate) -> Result<()> {
    let day = AvailabilityService::new(config)
        .list_available_slots(doctor_id, date, today())
        .await
        .map_err(surface)?;

    if day.is_empty() {
        println!("No slots available on {}", date);
        return Ok(());
    }
    for slot in &day.slots {
        println!("{}\t{}", slot.original, slot.display);
    }
    Ok(())
}

pub async fn schedule(config: &AppConfig) -> Result<()> {
    let session = login(config).await?;
    let schedule = ScheduleService::new(config)
        .get_schedule(session.doctor_id(), session.token())
        .await
        .map_err(surface)?;

    for entry in schedule.entries() {
        if entry.is_active {
            println!(
                "{:<10} {} - {} ({} min, break {} min)",
                entry.day_of_week, entry.start_time, entry.end_time, entry.appointment_duration, entry.break_duration
            );
        } else {
            println!("{:<10} off", entry.day_of_week);
        }
    }

    session.logout();
    Ok(())
}

pub async fn appointments(
    config: &AppConfig,
    status: Option<String>,
    date: Option<NaiveDate>,
    all_dates: bool,
    search: Option<String>,
) -> Result<()> {
    let session = login(config).await?;
    let listing = AppointmentService::new(config)
        .list_for_doctor(session.doctor_id(), session.token())
        .await
        .map_err(surface)?;
    report_source(&listing);

    let status = match status.as_deref() {
        None | Some("all") => StatusFilter::All,
        Some(raw) => StatusFilter::Only(raw.parse().map_err(surface)?),
    };
    let date = if all_dates { None } else { Some(date.unwrap_or_else(today)) };

    let filter = AppointmentFilter::for_doctor_dashboard(today())
        .with_status(status)
        .with_date(date)
        .with_patient_query(search.unwrap_or_default());

    for appointment in filter.apply(&listing.items) {
        println!(
            "#{:<6} {} {:<8} {:<10} {} {}",
            appointment.id,
            appointment.appointment_date,
            appointment.appointment_time,
            appointment.status,
            appointment.patient_name,
            appointment.phone_number
        );
    }

    print_json(&AppointmentStats::from_appointments(&listing.items, today()))?;
    session.logout();
    Ok(())
}

pub async fn route(config: &AppConfig) -> Result<()> {
    let token = config
        .session_token
        .as_deref()
        .context("SESSION_TOKEN is not set")?;

    let doctors = DoctorService::new(config);
    let plans = PlanService::new(config);

    let (me, plan_list) = futures::try_join!(doctors.get_me(token, &[]), plans.list_plans(Some(token)))
        .map_err(surface)?;
    let session = Session::login(token, me.id.clone()).map_err(surface)?;

    let payments = PaymentService::new(config)
        .list_for_doctor(session.doctor_id(), session.token())
        .await
        .map_err(surface)?;

    let now = Utc::now();
    let signals = collect_signals(&payments, &plan_list, &me);
    let route = resolve_route(&signals, now);
    println!("{}", route);

    if let Some(window) = compute_current_window(&payments, &plan_list) {
        let remaining = remaining_time(Some(&window), now);
        println!(
            "Subscription ends {} ({}d {}h {}m left)",
            window.end_date.format("%Y-%m-%d"),
            remaining.days,
            remaining.hours,
            remaining.minutes
        );
    }

    session.logout();
    Ok(())
}

pub async fn wait_approval(config: &AppConfig) -> Result<()> {
    let session = login(config).await?;
    let poller = ApprovalPoller::new(config);
    info!("Checking for approval every {:?}", poller.poll_interval());

    let handle = poller.spawn(session.doctor_id().to_string(), session.token().to_string());

    let outcome = tokio::select! {
        outcome = handle.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopped waiting");
            ApprovalOutcome::Cancelled
        }
    };

    match outcome {
        ApprovalOutcome::Approved(payment) => println!("Payment {} approved", payment.id),
        ApprovalOutcome::Rejected(payment) => println!("Payment {} was rejected", payment.id),
        ApprovalOutcome::Cancelled => println!("Stopped waiting for approval"),
    }

    session.logout();
    Ok(())
}
