//! In-process campaign scheduler.
//!
//! Holds one job per campaign id. A single background task wakes every tick,
//! fires due jobs one after another, then reschedules recurring jobs and drops
//! one-shot jobs. Registering a campaign id again replaces its job.

mod job;

pub use job::{FireReport, ScheduledJob, Trigger};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::types::{Campaign, CampaignStatus};
use crate::error::MailerError;

/// Work performed when a job fires.
pub trait JobHandler: Send + Sync + 'static {
    fn fire(&self, job: &ScheduledJob)
    -> impl Future<Output = Result<FireReport, MailerError>> + Send;
}

#[derive(Clone)]
pub struct CampaignScheduler {
    jobs: Arc<Mutex<HashMap<i32, ScheduledJob>>>,
    seq: Arc<AtomicU64>,
    tick: Duration,
    recurrence: Schedule,
}

impl CampaignScheduler {
    /// `recurrence` drives every recurring campaign.
    pub fn new(tick: Duration, recurrence: Schedule) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            seq: Arc::new(AtomicU64::new(0)),
            tick,
            recurrence,
        }
    }

    pub fn recurrence(&self) -> &Schedule {
        &self.recurrence
    }

    /// Register the job matching a campaign's status.
    ///
    /// Drafts have no job (`Ok(None)`); sent campaigns are rejected.
    pub async fn register_campaign(
        &self,
        campaign: &Campaign,
        grant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduledJob>, MailerError> {
        let job = match campaign.status {
            CampaignStatus::Draft => return Ok(None),
            CampaignStatus::Sent => return Err(MailerError::CampaignAlreadySent),
            CampaignStatus::Scheduled => {
                let at = campaign.scheduled_at.ok_or_else(|| {
                    MailerError::InvalidSchedule("scheduled campaign has no send time".to_owned())
                })?;
                ScheduledJob::once(campaign.id, grant_id, at)
            }
            CampaignStatus::Recurring => {
                ScheduledJob::recurring(campaign.id, grant_id, self.recurrence.clone(), now)
            }
        };
        self.register(job.clone()).await;
        Ok(Some(job))
    }

    /// Register a job, returning the job it replaced.
    pub async fn register(&self, mut job: ScheduledJob) -> Option<ScheduledJob> {
        job.seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            campaign_id = job.campaign_id,
            recurring = job.is_recurring(),
            next_run_at = ?job.next_run_at,
            "campaign job registered"
        );
        self.jobs.lock().await.insert(job.campaign_id, job)
    }

    pub async fn get(&self, campaign_id: i32) -> Option<ScheduledJob> {
        self.jobs.lock().await.get(&campaign_id).cloned()
    }

    /// All jobs ordered by campaign id.
    pub async fn jobs(&self) -> Vec<ScheduledJob> {
        let mut jobs: Vec<_> = self.jobs.lock().await.values().cloned().collect();
        jobs.sort_by_key(|j| j.campaign_id);
        jobs
    }

    /// Jobs whose next run is at or before `now`, earliest first.
    pub async fn due_jobs(&self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        let mut due: Vec<_> = self
            .jobs
            .lock()
            .await
            .values()
            .filter(|j| j.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|j| (j.next_run_at, j.campaign_id));
        due
    }

    /// Reschedule or drop a job after it fired. A job replaced while firing is left alone.
    async fn complete(&self, fired: &ScheduledJob, now: DateTime<Utc>) {
        let mut jobs = self.jobs.lock().await;
        let Some(current) = jobs.get_mut(&fired.campaign_id) else {
            return;
        };
        if current.seq != fired.seq {
            return;
        }
        match fired.following(now) {
            Some(next) => current.next_run_at = Some(next),
            None => {
                jobs.remove(&fired.campaign_id);
            }
        }
    }

    /// Fire every due job in turn. Returns how many jobs ran.
    pub async fn run_due<H: JobHandler>(
        &self,
        handler: &H,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> usize {
        let due = self.due_jobs(now).await;
        let mut fired = 0;
        for job in &due {
            if cancel.is_cancelled() {
                break;
            }
            debug!(campaign_id = job.campaign_id, "firing campaign job");
            match handler.fire(job).await {
                Ok(report) => info!(
                    campaign_id = job.campaign_id,
                    attempted = report.attempted,
                    failed = report.failed,
                    skipped = report.skipped,
                    "campaign job finished"
                ),
                Err(e) => error!(
                    campaign_id = job.campaign_id,
                    error = %e,
                    kind = e.kind(),
                    "campaign job failed"
                ),
            }
            self.complete(job, Utc::now()).await;
            fired += 1;
        }
        fired
    }

    /// Spawn the scheduler loop. It exits when `cancel` fires, finishing the
    /// job in progress but starting no new one.
    pub fn start<H: JobHandler>(&self, handler: H, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            info!(tick_secs = scheduler.tick.as_secs(), "campaign scheduler started");
            let mut interval = tokio::time::interval(scheduler.tick);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("campaign scheduler shutting down");
                        return;
                    }
                    _ = interval.tick() => {
                        scheduler.run_due(&handler, Utc::now(), &cancel).await;
                    }
                }
            }
        })
    }
}
