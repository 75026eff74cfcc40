use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::domain::repository::{
    CampaignRepository, CompletionPort, MailProvider, RecipientRepository,
};
use crate::domain::types::{
    Campaign, CampaignStatus, NewCampaign, OutgoingMessage, Participant, ScheduleChoice,
};
use crate::error::MailerError;
use crate::scheduler::{CampaignScheduler, FireReport, JobHandler, ScheduledJob};
use crate::usecase::assist::AssistUseCase;

/// Interpret the `schedule_type` / `schedule_days` pair of a request.
pub fn parse_schedule(
    schedule_type: Option<&str>,
    schedule_days: Option<i64>,
) -> Result<Option<ScheduleChoice>, MailerError> {
    match schedule_type.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some("once") => {
            let days = schedule_days.ok_or(MailerError::MissingField("schedule_days"))?;
            offset_days(Utc::now(), days)?;
            Ok(Some(ScheduleChoice::Once { days }))
        }
        Some("recurring") => Ok(Some(ScheduleChoice::Recurring)),
        Some(other) => Err(MailerError::InvalidSchedule(format!(
            "unknown schedule type {other:?}"
        ))),
    }
}

/// `now` shifted by a non-negative number of days. Zero means "now".
pub fn offset_days(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, MailerError> {
    if days < 0 {
        return Err(MailerError::InvalidSchedule(
            "schedule_days must not be negative".to_owned(),
        ));
    }
    Duration::try_days(days)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| MailerError::InvalidSchedule("schedule_days out of range".to_owned()))
}

/// Initial status and send time for a schedule choice.
pub fn initial_state(
    choice: Option<ScheduleChoice>,
    now: DateTime<Utc>,
) -> Result<(CampaignStatus, Option<DateTime<Utc>>), MailerError> {
    Ok(match choice {
        None => (CampaignStatus::Draft, None),
        Some(ScheduleChoice::Once { days }) => {
            (CampaignStatus::Scheduled, Some(offset_days(now, days)?))
        }
        Some(ScheduleChoice::Recurring) => (CampaignStatus::Recurring, None),
    })
}

// ── POST /nylas/create-campaign ──────────────────────────────────────────────

pub struct CreateCampaignInput {
    pub name: String,
    pub subject: String,
    pub body: Option<String>,
    /// Brief for a generated body, used when `body` is empty.
    pub prompt: Option<String>,
    pub schedule: Option<ScheduleChoice>,
}

#[derive(Debug)]
pub struct CreatedCampaign {
    pub campaign: Campaign,
    pub job: Option<ScheduledJob>,
}

pub struct CreateCampaignUseCase<C: CampaignRepository, P: CompletionPort> {
    pub campaigns: C,
    pub assist: AssistUseCase<P>,
    pub scheduler: CampaignScheduler,
}

impl<C: CampaignRepository, P: CompletionPort> CreateCampaignUseCase<C, P> {
    pub async fn execute(
        &self,
        input: CreateCampaignInput,
        grant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CreatedCampaign, MailerError> {
        let name = required(&input.name, "name")?;
        let subject = required(&input.subject, "subject")?;
        let body = resolve_body(&self.assist, input.body, input.prompt).await?;

        let (status, scheduled_at) = initial_state(input.schedule, now)?;
        let campaign = self
            .campaigns
            .create(&NewCampaign {
                name,
                subject,
                body,
                scheduled_at,
                status,
            })
            .await?;
        info!(campaign_id = campaign.id, status = status.as_str(), "campaign created");

        let job = self
            .scheduler
            .register_campaign(&campaign, grant_id, now)
            .await?;
        Ok(CreatedCampaign { campaign, job })
    }
}

// ── POST /nylas/schedule-campaign/{id} ───────────────────────────────────────

pub struct ScheduleCampaignUseCase<C: CampaignRepository> {
    pub campaigns: C,
    pub scheduler: CampaignScheduler,
}

impl<C: CampaignRepository> ScheduleCampaignUseCase<C> {
    /// (Re-)register the campaign's job under `grant_id`.
    pub async fn execute(
        &self,
        campaign_id: i32,
        grant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ScheduledJob, MailerError> {
        let campaign = self
            .campaigns
            .find_by_id(campaign_id)
            .await?
            .ok_or(MailerError::CampaignNotFound)?;
        self.scheduler
            .register_campaign(&campaign, grant_id, now)
            .await?
            .ok_or_else(|| {
                MailerError::InvalidSchedule("draft campaigns have no schedule".to_owned())
            })
    }
}

// ── GET /nylas/view-campaigns ────────────────────────────────────────────────

pub struct ListCampaignsUseCase<C: CampaignRepository> {
    pub campaigns: C,
    pub scheduler: CampaignScheduler,
}

impl<C: CampaignRepository> ListCampaignsUseCase<C> {
    /// Campaigns with their registered job, if any.
    pub async fn execute(&self) -> Result<Vec<(Campaign, Option<ScheduledJob>)>, MailerError> {
        let campaigns = self.campaigns.list().await?;
        let mut out = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let job = self.scheduler.get(campaign.id).await;
            out.push((campaign, job));
        }
        Ok(out)
    }
}

// ── Job firing ───────────────────────────────────────────────────────────────

/// Sends a campaign to every stored recipient when its job fires.
pub struct FireCampaignUseCase<C, R, M>
where
    C: CampaignRepository,
    R: RecipientRepository,
    M: MailProvider,
{
    pub campaigns: C,
    pub recipients: R,
    pub provider: M,
    /// Reply-to address on outgoing campaign mail.
    pub sender: Option<Participant>,
}

impl<C, R, M> FireCampaignUseCase<C, R, M>
where
    C: CampaignRepository,
    R: RecipientRepository,
    M: MailProvider,
{
    pub async fn execute(&self, campaign_id: i32, grant_id: &str) -> Result<FireReport, MailerError> {
        let campaign = self
            .campaigns
            .find_by_id(campaign_id)
            .await?
            .ok_or(MailerError::CampaignNotFound)?;
        if campaign.status == CampaignStatus::Sent {
            info!(campaign_id, "campaign already sent, skipping");
            return Ok(FireReport {
                skipped: true,
                ..Default::default()
            });
        }

        let recipients = self.recipients.list().await?;
        let mut report = FireReport::default();
        for recipient in &recipients {
            let message = OutgoingMessage {
                subject: campaign.subject.clone(),
                body: campaign.body.clone(),
                to: vec![Participant::new(&recipient.name, &recipient.email)],
                reply_to: self.sender.iter().cloned().collect(),
                ..Default::default()
            };
            report.attempted += 1;
            if let Err(e) = self.provider.send_message(grant_id, &message).await {
                report.failed += 1;
                warn!(
                    campaign_id,
                    recipient = %recipient.email,
                    error = %e,
                    kind = e.kind(),
                    "campaign send failed"
                );
            }
        }

        if campaign.status == CampaignStatus::Scheduled {
            self.campaigns
                .update_status(campaign_id, CampaignStatus::Sent)
                .await?;
        }
        Ok(report)
    }
}

impl<C, R, M> JobHandler for FireCampaignUseCase<C, R, M>
where
    C: CampaignRepository + 'static,
    R: RecipientRepository + 'static,
    M: MailProvider + 'static,
{
    async fn fire(&self, job: &ScheduledJob) -> Result<FireReport, MailerError> {
        self.execute(job.campaign_id, &job.grant_id).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn required(value: &str, field: &'static str) -> Result<String, MailerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MailerError::MissingField(field));
    }
    Ok(value.to_owned())
}

/// Explicit body, else one generated from `prompt`.
pub(crate) async fn resolve_body<P: CompletionPort>(
    assist: &AssistUseCase<P>,
    body: Option<String>,
    prompt: Option<String>,
) -> Result<String, MailerError> {
    if let Some(body) = body.filter(|b| !b.trim().is_empty()) {
        return Ok(body);
    }
    match prompt.filter(|p| !p.trim().is_empty()) {
        Some(prompt) => assist
            .marketing_email(&prompt)
            .await
            .map_err(MailerError::CompletionFailed),
        None => Err(MailerError::MissingField("body")),
    }
}
