use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::json;

use mailcraft_session::cookie::{clear_session_cookie, set_session_cookie};
use mailcraft_session::extract::SessionCookie;

use crate::domain::repository::OAuthPort;
use crate::error::{MailerError, REAUTH_PATH};
use crate::state::AppState;
use crate::usecase::session::{ExchangeCodeUseCase, SessionGrant};

// ── GET /nylas/auth ──────────────────────────────────────────────────────────

/// Grant summary when the session is authenticated, otherwise a redirect to
/// the provider's authorize page.
pub async fn login(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Response, MailerError> {
    if let SessionGrant::Active(grant) = state.session().lookup(session_id.as_deref()).await? {
        let body = json!({
            "grant_id": grant.grant_id,
            "email": grant.email,
            "expires_at": grant.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "expires_in": grant.remaining_secs(),
        });
        return Ok(Json(body).into_response());
    }
    let url = state
        .nylas
        .authorize_url()
        .map_err(MailerError::ProviderFailed)?;
    Ok(Redirect::to(&url).into_response())
}

// ── DELETE /nylas/auth ───────────────────────────────────────────────────────

pub async fn logout(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), MailerError> {
    state.session().logout(session_id.as_deref()).await?;
    Ok((
        clear_session_cookie(jar, state.cookie_secure),
        StatusCode::NO_CONTENT,
    ))
}

// ── GET /oauth/exchange ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ExchangeQuery {
    pub code: Option<String>,
}

pub async fn exchange(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
    jar: CookieJar,
    Query(query): Query<ExchangeQuery>,
) -> Result<(CookieJar, Redirect), MailerError> {
    if let SessionGrant::Active(_) = state.session().lookup(session_id.as_deref()).await? {
        return Ok((jar, Redirect::to(REAUTH_PATH)));
    }
    let code = query.code.ok_or(MailerError::MissingField("code"))?;
    let usecase = ExchangeCodeUseCase {
        oauth: state.nylas.clone(),
        grants: state.sessions.clone(),
        ttl_secs: state.session_ttl_secs,
    };
    let (session_id, _grant) = usecase.execute(&code).await?;
    let jar = set_session_cookie(jar, session_id, state.cookie_secure, state.session_ttl_secs);
    Ok((jar, Redirect::to(REAUTH_PATH)))
}

// ── GET /test-nylas ──────────────────────────────────────────────────────────

/// Provider client self-check: builds an authorize URL without calling out.
pub async fn test_nylas(State(state): State<AppState>) -> Response {
    match state.nylas.authorize_url() {
        Ok(url) => Json(json!({
            "status": "success",
            "message": "Nylas client is working correctly",
            "generated_url": url,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": e.to_string(),
                "type": e.kind(),
            })),
        )
            .into_response(),
    }
}
