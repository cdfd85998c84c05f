//! Daily trigger for the invoice scheduler.
//!
//! A background task sleeps until the next configured local time, runs the
//! lifecycle phases for that calendar day and goes back to sleep. Runs never
//! overlap because the task awaits each run before scheduling the next.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use tally_db::{InvoiceScheduler, SchedulerSettings};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Local time of day the job fires at.
#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    /// Timezone the hour and minute are read in.
    pub timezone: Tz,
    /// Hour (0-23).
    pub hour: u32,
    /// Minute (0-59).
    pub minute: u32,
}

/// Current calendar day in `tz`.
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// First instant strictly after `now` at `hour:minute` local time.
///
/// A local time skipped by a DST change fires one hour later instead.
/// Returns `None` for an invalid hour or minute.
#[must_use]
pub fn next_run_after(now: DateTime<Tz>, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let at = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let tz = now.timezone();

    let mut day = now.date_naive();
    for _ in 0..3 {
        let local = day.and_time(at);
        let candidate = tz
            .from_local_datetime(&local)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest());
        if let Some(candidate) = candidate
            && candidate > now
        {
            return Some(candidate);
        }
        day = day.succ_opt()?;
    }
    None
}

/// Spawns the daily job.
///
/// The task runs until the runtime shuts down.
pub fn spawn_daily_job(
    db: DatabaseConnection,
    schedule: DailySchedule,
    settings: SchedulerSettings,
) -> JoinHandle<()> {
    let scheduler = InvoiceScheduler::new(db, settings);

    tokio::spawn(async move {
        info!(
            timezone = %schedule.timezone,
            hour = schedule.hour,
            minute = schedule.minute,
            "Daily invoice job started"
        );

        loop {
            let now = Utc::now().with_timezone(&schedule.timezone);
            let Some(next) = next_run_after(now, schedule.hour, schedule.minute) else {
                error!(
                    hour = schedule.hour,
                    minute = schedule.minute,
                    "Invalid run time, daily invoice job stopped"
                );
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Next daily invoice run scheduled");
            tokio::time::sleep(wait).await;

            let day = next.date_naive();
            match scheduler.run_daily(day).await {
                Ok(report) if report.is_clean() => {}
                Ok(report) => warn!(
                    date = %day,
                    failures = report.failures.len(),
                    "Daily invoice run finished with failures"
                ),
                Err(e) => error!(date = %day, error = %e, "Daily invoice run aborted"),
            }
        }
    })
}
