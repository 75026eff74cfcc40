use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Path a client should visit to obtain a fresh grant.
pub const REAUTH_PATH: &str = "/nylas/auth";

/// Failure at an external-call boundary (mail provider or completion API).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExternalError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("completion returned no content")]
    EmptyCompletion,
}

impl ExternalError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Status { .. } => "UPSTREAM_STATUS",
            Self::Decode(_) => "DECODE",
            Self::EmptyCompletion => "EMPTY_COMPLETION",
        }
    }

    /// Map a non-success HTTP status and its body text.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            _ => Self::Status { status, message },
        }
    }

    /// JSON form used when a failure is reported inline rather than as the response.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "kind": self.kind(), "message": self.to_string() })
    }
}

/// Mailer service error variants.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("grant expired")]
    GrantExpired,
    #[error("campaign not found")]
    CampaignNotFound,
    #[error("message not found")]
    MessageNotFound,
    #[error("campaign already sent")]
    CampaignAlreadySent,
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("mail provider error: {0}")]
    ProviderFailed(ExternalError),
    #[error("completion error: {0}")]
    CompletionFailed(ExternalError),
    #[error("code exchange failed: {0}")]
    OAuthExchangeFailed(ExternalError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl MailerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::GrantExpired => "GRANT_EXPIRED",
            Self::CampaignNotFound => "CAMPAIGN_NOT_FOUND",
            Self::MessageNotFound => "MESSAGE_NOT_FOUND",
            Self::CampaignAlreadySent => "CAMPAIGN_ALREADY_SENT",
            Self::InvalidSchedule(_) => "INVALID_SCHEDULE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::ProviderFailed(_) => "PROVIDER_FAILED",
            Self::CompletionFailed(_) => "COMPLETION_FAILED",
            Self::OAuthExchangeFailed(_) => "OAUTH_EXCHANGE_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Provider failure, with 404 narrowed to a missing message.
    pub fn from_message_lookup(err: ExternalError) -> Self {
        match err {
            ExternalError::NotFound(_) => Self::MessageNotFound,
            other => Self::ProviderFailed(other),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotAuthenticated | Self::GrantExpired => StatusCode::UNAUTHORIZED,
            Self::CampaignNotFound | Self::MessageNotFound => StatusCode::NOT_FOUND,
            Self::CampaignAlreadySent => StatusCode::CONFLICT,
            Self::InvalidSchedule(_) | Self::MissingField(_) | Self::OAuthExchangeFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ProviderFailed(_) | Self::CompletionFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MailerError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer already records every request; only 5xx need the cause logged here.
        match &self {
            Self::Internal(e) => tracing::error!(error = %e, kind = "INTERNAL", "internal error"),
            Self::ProviderFailed(e) | Self::CompletionFailed(e) => {
                tracing::error!(error = %e, kind = self.kind(), upstream = e.kind(), "upstream failure")
            }
            _ => {}
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if matches!(self, Self::NotAuthenticated | Self::GrantExpired) {
            body["reauthenticate"] = serde_json::json!(REAUTH_PATH);
        }
        (status, axum::Json(body)).into_response()
    }
}
