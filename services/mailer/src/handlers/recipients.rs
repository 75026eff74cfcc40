use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::domain::types::Recipient;
use crate::error::MailerError;
use crate::handlers::extract::AuthorizedGrant;
use crate::state::AppState;
use crate::usecase::recipient::{ImportContactsUseCase, ImportReport, RecipientUseCase};

// ── GET /nylas/manage-recepients ─────────────────────────────────────────────

pub async fn list_recipients(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
) -> Result<Json<Vec<Recipient>>, MailerError> {
    let usecase = RecipientUseCase {
        recipients: state.recipient_repo(),
    };
    Ok(Json(usecase.list().await?))
}

// ── POST /nylas/manage-recepients ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpsertRecipientRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
}

pub async fn upsert_recipient(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
    Json(body): Json<UpsertRecipientRequest>,
) -> Result<Json<Recipient>, MailerError> {
    let usecase = RecipientUseCase {
        recipients: state.recipient_repo(),
    };
    Ok(Json(usecase.upsert(&body.name, &body.email).await?))
}

// ── POST /nylas/import-csv ───────────────────────────────────────────────────

/// Body is plain text, one `name,email` pair per line.
pub async fn import_csv(
    State(state): State<AppState>,
    AuthorizedGrant(_grant): AuthorizedGrant,
    body: String,
) -> Result<Json<ImportReport>, MailerError> {
    let usecase = RecipientUseCase {
        recipients: state.recipient_repo(),
    };
    Ok(Json(usecase.import_csv(&body).await?))
}

// ── POST /nylas/import-contacts ──────────────────────────────────────────────

pub async fn import_contacts(
    State(state): State<AppState>,
    AuthorizedGrant(grant): AuthorizedGrant,
) -> Result<Json<ImportReport>, MailerError> {
    let usecase = ImportContactsUseCase {
        recipients: state.recipient_repo(),
        provider: state.mail_provider(),
    };
    Ok(Json(usecase.execute(&grant.grant_id).await?))
}
