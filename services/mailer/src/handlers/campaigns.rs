use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::types::Campaign;
use crate::error::MailerError;
use crate::handlers::extract::AuthorizedGrant;
use crate::scheduler::ScheduledJob;
use crate::state::AppState;
use crate::usecase::bulk::{BulkSendInput, BulkSendUseCase};
use crate::usecase::campaign::{
    CreateCampaignInput, CreateCampaignUseCase, ListCampaignsUseCase, ScheduleCampaignUseCase,
    parse_schedule,
};
use crate::usecase::recipient::RecipientUseCase;

fn job_json(job: &ScheduledJob) -> Value {
    json!({
        "campaign_id": job.campaign_id,
        "type": job.kind(),
        "next_run_at": job
            .next_run_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    })
}

fn campaign_json(campaign: &Campaign, job: Option<&ScheduledJob>) -> Result<Value, MailerError> {
    let mut value = serde_json::to_value(campaign).map_err(|e| MailerError::Internal(e.into()))?;
    value["job"] = job.map(job_json).unwrap_or(Value::Null);
    Ok(value)
}

// ── GET /nylas/send-bulk-email ───────────────────────────────────────────────

pub async fn bulk_email_status(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
) -> Result<Json<Value>, MailerError> {
    let usecase = RecipientUseCase {
        recipients: state.recipient_repo(),
    };
    let count = usecase.count().await?;
    Ok(Json(json!({ "recipient_count": count })))
}

// ── POST /nylas/send-bulk-email ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BulkSendRequest {
    pub subject: String,
    pub body: Option<String>,
    pub prompt: Option<String>,
}

pub async fn send_bulk_email(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Json(body): Json<BulkSendRequest>,
) -> Result<(StatusCode, Json<Value>), MailerError> {
    let usecase = BulkSendUseCase {
        recipients: state.recipient_repo(),
        provider: state.mail_provider(),
        assist: state.assist(),
        sender: state.sender.clone(),
    };
    let report = usecase
        .execute(
            &grant.grant_id,
            BulkSendInput {
                subject: body.subject,
                body: body.body,
                prompt: body.prompt,
            },
        )
        .await?;

    let (status, label) = match (report.sent, report.failed) {
        (_, 0) => (StatusCode::OK, "success"),
        (0, _) => (StatusCode::BAD_GATEWAY, "error"),
        _ => (StatusCode::OK, "partial"),
    };
    let errors: Vec<Value> = report
        .errors
        .iter()
        .map(|f| json!({ "email": f.email, "kind": f.error.kind(), "message": f.error.to_string() }))
        .collect();
    Ok((
        status,
        Json(json!({
            "status": label,
            "sent": report.sent,
            "failed": report.failed,
            "errors": errors,
        })),
    ))
}

// ── GET /nylas/create-campaign ───────────────────────────────────────────────

pub async fn campaign_options(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
) -> Json<Value> {
    let next = state
        .scheduler
        .recurrence()
        .after(&Utc::now())
        .next()
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true));
    Json(json!({
        "schedule_types": ["once", "recurring"],
        "recurrence": state.recurrence_expr,
        "next_recurring_run": next,
    }))
}

// ── POST /nylas/create-campaign ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub subject: String,
    pub body: Option<String>,
    pub prompt: Option<String>,
    pub schedule_type: Option<String>,
    pub schedule_days: Option<i64>,
}

pub async fn create_campaign(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Value>), MailerError> {
    let schedule = parse_schedule(body.schedule_type.as_deref(), body.schedule_days)?;
    let usecase = CreateCampaignUseCase {
        campaigns: state.campaign_repo(),
        assist: state.assist(),
        scheduler: state.scheduler.clone(),
    };
    let created = usecase
        .execute(
            CreateCampaignInput {
                name: body.name,
                subject: body.subject,
                body: body.body,
                prompt: body.prompt,
                schedule,
            },
            &grant.grant_id,
            Utc::now(),
        )
        .await?;
    let json = campaign_json(&created.campaign, created.job.as_ref())?;
    Ok((StatusCode::CREATED, Json(json)))
}

// ── GET /nylas/view-campaigns ────────────────────────────────────────────────

pub async fn view_campaigns(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
) -> Result<Json<Vec<Value>>, MailerError> {
    let usecase = ListCampaignsUseCase {
        campaigns: state.campaign_repo(),
        scheduler: state.scheduler.clone(),
    };
    let campaigns = usecase
        .execute()
        .await?
        .iter()
        .map(|(campaign, job)| campaign_json(campaign, job.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(campaigns))
}

// ── POST /nylas/schedule-campaign/{id} ───────────────────────────────────────

pub async fn schedule_campaign(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Path(campaign_id): Path<i32>,
) -> Result<Json<Value>, MailerError> {
    let usecase = ScheduleCampaignUseCase {
        campaigns: state.campaign_repo(),
        scheduler: state.scheduler.clone(),
    };
    let job = usecase
        .execute(campaign_id, &grant.grant_id, Utc::now())
        .await?;
    Ok(Json(job_json(&job)))
}
