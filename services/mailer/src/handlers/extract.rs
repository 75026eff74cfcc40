use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mailcraft_session::extract::SessionCookie;
use mailcraft_session::grant::Grant;

use crate::error::MailerError;
use crate::state::AppState;

/// Active grant of the calling session.
///
/// Rejects with `NOT_AUTHENTICATED` when the session has no grant and
/// `GRANT_EXPIRED` once the grant's lifetime has passed.
pub struct AuthorizedGrant(pub Grant);

impl FromRequestParts<AppState> for AuthorizedGrant {
    type Rejection = MailerError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let session = state.session();
        let cookie = SessionCookie::from_request_parts(parts, state);
        async move {
            let Ok(SessionCookie(session_id)) = cookie.await;
            session.require(session_id.as_deref()).await.map(Self)
        }
    }
}
