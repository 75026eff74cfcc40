use chrono::{DateTime, Utc};
use cron::Schedule;

/// When a campaign job fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Fire once at `next_run_at`, then drop the job.
    Once,
    /// Fire on every occurrence of the schedule.
    Recurring(Schedule),
}

/// Registered campaign job, keyed by campaign id.
///
/// The job carries the grant of the session that registered it; sends at
/// trigger time go out through that grant.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub campaign_id: i32,
    pub grant_id: String,
    pub trigger: Trigger,
    /// `None` once a recurring schedule has no further occurrences.
    pub next_run_at: Option<DateTime<Utc>>,
    /// Registration sequence number; distinguishes a replaced job from its successor.
    pub(crate) seq: u64,
}

impl ScheduledJob {
    pub fn once(campaign_id: i32, grant_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            campaign_id,
            grant_id: grant_id.into(),
            trigger: Trigger::Once,
            next_run_at: Some(at),
            seq: 0,
        }
    }

    pub fn recurring(
        campaign_id: i32,
        grant_id: impl Into<String>,
        schedule: Schedule,
        now: DateTime<Utc>,
    ) -> Self {
        let next_run_at = schedule.after(&now).next();
        Self {
            campaign_id,
            grant_id: grant_id.into(),
            trigger: Trigger::Recurring(schedule),
            next_run_at,
            seq: 0,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.trigger, Trigger::Recurring(_))
    }

    pub fn kind(&self) -> &'static str {
        match self.trigger {
            Trigger::Once => "once",
            Trigger::Recurring(_) => "recurring",
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at.is_some_and(|at| at <= now)
    }

    /// Next occurrence strictly after `now`; `None` for one-shot jobs.
    pub(crate) fn following(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.trigger {
            Trigger::Once => None,
            Trigger::Recurring(schedule) => schedule.after(&now).next(),
        }
    }
}

/// Outcome of firing one campaign job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FireReport {
    pub attempted: usize,
    pub failed: usize,
    /// The campaign was already sent; nothing was attempted.
    pub skipped: bool,
}
