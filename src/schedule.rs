// src/schedule.rs

//! Cron schedule parsing and the resident daemon loop.
//!
//! Expressions use the `cron` crate syntax, which carries a leading seconds
//! field: `"0 0 */12 * * *"` fires at 00:00:00 and 12:00:00 UTC.

use std::fmt::Display;
use std::future::Future;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::{info, warn};

use crate::errors::{PublishError, Result};

/// Parse and validate a cron expression.
pub fn parse_schedule(expression: &str) -> Result<Schedule> {
    Schedule::from_str(expression).map_err(|e| {
        PublishError::ConfigError(format!("invalid cron expression '{expression}': {e}"))
    })
}

/// Next fire time strictly after `after`, if the schedule has one.
pub fn next_fire(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}

/// Run `job` every time `schedule` fires until `shutdown` resolves.
///
/// Runs never overlap: the next fire time is computed only after the
/// previous run has finished, so a slow run skips the ticks it missed.
/// A failing run is logged and the loop carries on.
pub async fn run_scheduled<J, Fut, E, S>(
    schedule: &Schedule,
    run_now: bool,
    mut job: J,
    shutdown: S,
) -> Result<()>
where
    J: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<i32, E>>,
    E: Display,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if run_now {
        tokio::select! {
            res = job() => log_run_result(res),
            _ = &mut shutdown => {
                info!("shutdown requested during startup run");
                return Ok(());
            }
        }
    }

    loop {
        let now = Utc::now();
        let Some(next) = next_fire(schedule, now) else {
            info!("schedule has no further fire times; exiting");
            return Ok(());
        };

        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next, wait_secs = wait.as_secs(), "waiting for next scheduled run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => {
                info!("shutdown requested; stopping scheduler");
                return Ok(());
            }
        }

        tokio::select! {
            res = job() => log_run_result(res),
            _ = &mut shutdown => {
                info!("shutdown requested during scheduled run");
                return Ok(());
            }
        }
    }
}

fn log_run_result<E: Display>(res: std::result::Result<i32, E>) {
    match res {
        Ok(0) => info!("scheduled run succeeded"),
        Ok(code) => warn!(exit_code = code, "scheduled run failed"),
        Err(e) => warn!(error = %e, "scheduled run errored"),
    }
}
