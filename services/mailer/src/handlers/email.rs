use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::types::{Draft, EmailMessage, Participant};
use crate::error::MailerError;
use crate::handlers::extract::AuthorizedGrant;
use crate::state::AppState;
use crate::usecase::assist::DEFAULT_TONE;
use crate::usecase::email::{
    CategorizeEmailsUseCase, ComposeAction, ComposeInput, ComposeOutcome, ComposeUseCase,
    InboxUseCase, ReplyUseCase, SuggestedReply,
};

// ── GET /nylas/recent-emails ─────────────────────────────────────────────────

pub async fn recent_emails(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
) -> Result<Json<Vec<EmailMessage>>, MailerError> {
    let usecase = InboxUseCase {
        provider: state.mail_provider(),
    };
    Ok(Json(usecase.recent(&grant.grant_id).await?))
}

// ── GET /nylas/email/{id} ────────────────────────────────────────────────────

pub async fn get_email(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Path(message_id): Path<String>,
) -> Result<Json<EmailMessage>, MailerError> {
    let usecase = InboxUseCase {
        provider: state.mail_provider(),
    };
    Ok(Json(usecase.get(&grant.grant_id, &message_id).await?))
}

// ── POST /nylas/email/{id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SuggestReplyRequest {
    pub tone: Option<String>,
}

pub async fn suggest_reply(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Path(message_id): Path<String>,
    Json(body): Json<SuggestReplyRequest>,
) -> Result<Json<SuggestedReply>, MailerError> {
    let tone = body
        .tone
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TONE.to_owned());
    let usecase = ReplyUseCase {
        provider: state.mail_provider(),
        assist: state.assist(),
    };
    Ok(Json(
        usecase.suggest(&grant.grant_id, &message_id, &tone).await?,
    ))
}

// ── POST /nylas/email/{id}/refine ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefineReplyRequest {
    pub current_response: String,
    pub refinement_instructions: String,
}

pub async fn refine_reply(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Path(message_id): Path<String>,
    Json(body): Json<RefineReplyRequest>,
) -> Result<Json<Value>, MailerError> {
    let usecase = ReplyUseCase {
        provider: state.mail_provider(),
        assist: state.assist(),
    };
    let refined = usecase
        .refine(
            &grant.grant_id,
            &message_id,
            &body.current_response,
            &body.refinement_instructions,
        )
        .await?;
    Ok(Json(json!({ "refined_response": refined })))
}

// ── POST /nylas/email/{id}/send ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendReplyRequest {
    pub final_response: String,
}

pub async fn send_reply(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Path(message_id): Path<String>,
    Json(body): Json<SendReplyRequest>,
) -> Result<Json<Value>, MailerError> {
    if body.final_response.trim().is_empty() {
        return Err(MailerError::MissingField("final_response"));
    }
    let usecase = ReplyUseCase {
        provider: state.mail_provider(),
        assist: state.assist(),
    };
    let sent = usecase
        .send(&grant.grant_id, &message_id, &body.final_response)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Email sent successfully",
        "id": sent.id,
    })))
}

// ── GET /nylas/send-email ────────────────────────────────────────────────────

pub async fn list_drafts(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
) -> Result<Json<Vec<Draft>>, MailerError> {
    let usecase = InboxUseCase {
        provider: state.mail_provider(),
    };
    Ok(Json(usecase.drafts(&grant.grant_id).await?))
}

// ── POST /nylas/send-email ───────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeActionKind {
    #[default]
    Send,
    Draft,
    Schedule,
}

#[derive(Deserialize)]
pub struct ComposeRequest {
    pub to: Vec<Participant>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub action: ComposeActionKind,
    /// Unix seconds.
    pub send_at: Option<i64>,
    pub schedule_days: Option<i64>,
}

pub async fn compose_email(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
    Json(body): Json<ComposeRequest>,
) -> Result<Json<ComposeOutcome>, MailerError> {
    let action = match body.action {
        ComposeActionKind::Send => ComposeAction::Send,
        ComposeActionKind::Draft => ComposeAction::Draft,
        ComposeActionKind::Schedule => ComposeAction::Schedule {
            send_at: body.send_at,
            schedule_days: body.schedule_days,
        },
    };
    let usecase = ComposeUseCase {
        provider: state.mail_provider(),
    };
    let outcome = usecase
        .execute(
            &grant.grant_id,
            ComposeInput {
                to: body.to,
                subject: body.subject,
                body: body.body,
                action,
            },
            Utc::now(),
        )
        .await?;
    Ok(Json(outcome))
}

// ── POST /nylas/generate-email ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GenerateEmailRequest {
    pub prompt: String,
}

pub async fn generate_email(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
    Json(body): Json<GenerateEmailRequest>,
) -> Result<Json<Value>, MailerError> {
    if body.prompt.trim().is_empty() {
        return Err(MailerError::MissingField("prompt"));
    }
    let content = state
        .assist()
        .marketing_email(&body.prompt)
        .await
        .map_err(MailerError::CompletionFailed)?;
    Ok(Json(json!({ "email_content": content })))
}

// ── GET /nylas/categorize-emails ─────────────────────────────────────────────

pub async fn categorize_emails(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
) -> Result<Json<Vec<Value>>, MailerError> {
    let usecase = CategorizeEmailsUseCase {
        provider: state.mail_provider(),
        assist: state.assist(),
    };
    let emails = usecase.execute(&grant.grant_id).await?;
    let body = emails
        .into_iter()
        .map(|email| {
            let mut item = json!({
                "id": email.id,
                "subject": email.subject,
                "snippet": email.snippet,
            });
            match email.category {
                Ok(category) => item["category"] = json!(category),
                Err(e) => item["error"] = e.to_json(),
            }
            item
        })
        .collect();
    Ok(Json(body))
}
