//! Scheduler: runs the B/O score weekly and cleans logs.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use cron::Schedule;
use screener_config::AppConfig;
use screener_finders::{BoScoreConfig, BoScoreFinder, Finder};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

use crate::cli::commands::cleanup::perform_cleanup;
use crate::cli::setup::build_context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    BoScore,
    Cleanup,
}

struct Job {
    kind: JobKind,
    schedule: Schedule,
    next: Option<DateTime<Local>>,
}

impl Job {
    fn new(kind: JobKind, expr: &str, now: DateTime<Local>) -> Result<Self> {
        let schedule = Schedule::from_str(expr)
            .with_context(|| format!("Invalid cron expression for {:?}: {}", kind, expr))?;
        let next = schedule.after(&now).next();
        Ok(Self { kind, schedule, next })
    }

    fn is_due(&self, now: DateTime<Local>) -> bool {
        self.next.is_some_and(|t| t <= now)
    }

    fn advance(&mut self, now: DateTime<Local>) {
        self.next = self.schedule.after(&now).next();
    }
}

async fn run_job(kind: JobKind, config: &AppConfig) -> Result<()> {
    match kind {
        JobKind::BoScore => {
            let ctx = build_context(config)?;
            let report = BoScoreFinder::new(BoScoreConfig::default()).run(&ctx).await?;
            info!(candidates = report.table.len(), "B/O score run finished");
        }
        JobKind::Cleanup => {
            perform_cleanup(config)?;
        }
    }
    Ok(())
}

/// Time to sleep before the next check.
fn sleep_for(jobs: &[Job], now: DateTime<Local>, poll: Duration) -> Duration {
    jobs.iter()
        .filter_map(|job| job.next)
        .min()
        .and_then(|next| (next - now).to_std().ok())
        .map_or(poll, |until| until.min(poll))
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let now = Local::now();
    let mut jobs = vec![
        Job::new(JobKind::BoScore, &config.schedule.bo_score, now)?,
        Job::new(JobKind::Cleanup, &config.schedule.cleanup, now)?,
    ];
    for job in &jobs {
        info!(job = ?job.kind, next = ?job.next, "Job scheduled");
    }
    let poll = Duration::from_secs(config.schedule.poll_interval_secs);

    loop {
        let now = Local::now();
        for job in jobs.iter_mut().filter(|job| job.is_due(now)) {
            info!(job = ?job.kind, "Running scheduled job");
            if let Err(e) = run_job(job.kind, config).await {
                error!(job = ?job.kind, error = %format!("{:#}", e), "Scheduled job failed");
            }
            job.advance(Local::now());
            info!(job = ?job.kind, next = ?job.next, "Job rescheduled");
        }

        tokio::select! {
            _ = tokio::time::sleep(sleep_for(&jobs, Local::now(), poll)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Scheduler stopped");
                return Ok(());
            }
        }
    }
}
