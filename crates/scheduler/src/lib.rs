//! Background housekeeping driven by cron expressions.
//!
//! Three jobs: a nightly statistics sweep for the current month, monthly
//! billing generation for the previous month, and a purge of old read
//! notifications. Each job runs in its own task; a failing run is logged and
//! the loop keeps going.

use chrono::{Datelike, Utc};
use croner::parser::{CronParser, Seconds};
use croner::Cron;
use sea_orm::DatabaseConnection;
use std::future::Future;
use thiserror::Error;
use tracing::{error, info, warn};

use configs::SchedulerConfig;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron expression '{expr}': {source}")]
    InvalidCron {
        expr: String,
        #[source]
        source: croner::errors::CronError,
    },
}

/// Handles to the spawned job tasks. Dropping them detaches the jobs; they
/// stop when the runtime shuts down.
pub struct Scheduler {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Scheduler {
    /// Parse every cron expression and spawn one loop per job. Parsing happens
    /// up front so a bad config fails startup instead of a task.
    pub fn spawn(db: DatabaseConnection, cfg: &SchedulerConfig) -> Result<Self, SchedulerError> {
        let stats_cron = parse(&cfg.stats_cron)?;
        let billing_cron = parse(&cfg.billing_cron)?;
        let purge_cron = parse(&cfg.notification_purge_cron)?;
        let retention_days = cfg.notification_retention_days;

        let mut handles = Vec::with_capacity(3);

        let stats_db = db.clone();
        handles.push(tokio::spawn(job_loop("stats_sweep", stats_cron, move || {
            let db = stats_db.clone();
            async move {
                let now = Utc::now();
                service::stats_service::sweep_all(&db, now.year(), now.month())
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        })));

        let billing_db = db.clone();
        handles.push(tokio::spawn(job_loop("billing_generation", billing_cron, move || {
            let db = billing_db.clone();
            async move {
                service::billing_service::generate_previous_month(&db)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        })));

        handles.push(tokio::spawn(job_loop("notification_purge", purge_cron, move || {
            let db = db.clone();
            async move {
                service::notification_service::purge_older_than(&db, retention_days)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        })));

        info!("scheduler started with 3 jobs");
        Ok(Self { handles })
    }

    pub fn shutdown(self) {
        for h in self.handles {
            h.abort();
        }
        info!("scheduler stopped");
    }
}

fn parse(expr: &str) -> Result<Cron, SchedulerError> {
    CronParser::builder()
        .seconds(Seconds::Optional)
        .build()
        .parse(expr)
        .map_err(|source| SchedulerError::InvalidCron { expr: expr.to_string(), source })
}

/// Sleep until the next occurrence, run the job, repeat. Never exits on job
/// failure; exits only if the cron pattern stops producing occurrences.
async fn job_loop<F, Fut>(name: &'static str, cron: Cron, job: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    loop {
        let now = Utc::now();
        let next = match cron.find_next_occurrence(&now, false) {
            Ok(next) => next,
            Err(e) => {
                error!(job = name, error = %e, "no further occurrences, job loop exiting");
                return;
            }
        };
        let wait = (next - now).to_std().unwrap_or_default();
        info!(job = name, next = %next, "job scheduled");
        tokio::time::sleep(wait).await;

        let started = Utc::now();
        match job().await {
            Ok(()) => {
                let took = (Utc::now() - started).num_milliseconds();
                info!(job = name, took_ms = took, "job finished");
            }
            Err(e) => warn!(job = name, error = %e, "job failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_expressions_parse() {
        let cfg = SchedulerConfig::default();
        assert!(parse(&cfg.stats_cron).is_ok());
        assert!(parse(&cfg.billing_cron).is_ok());
        assert!(parse(&cfg.notification_purge_cron).is_ok());
    }

    #[test]
    fn bad_expression_is_rejected() {
        assert!(matches!(parse("not a cron"), Err(SchedulerError::InvalidCron { .. })));
    }

    #[test]
    fn next_occurrence_is_in_the_future() {
        let cron = parse("0 0 3 * * *").unwrap();
        let now = Utc::now();
        let next = cron.find_next_occurrence(&now, false).unwrap();
        assert!(next > now);
    }
}
