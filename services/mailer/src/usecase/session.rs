use chrono::Duration;

use mailcraft_session::cookie::new_session_id;
use mailcraft_session::grant::Grant;

use crate::domain::repository::{GrantStore, OAuthPort};
use crate::error::MailerError;

/// Session state as seen by a request.
#[derive(Debug)]
pub enum SessionGrant {
    Missing,
    Expired(Grant),
    Active(Grant),
}

pub struct SessionUseCase<G: GrantStore> {
    pub grants: G,
}

impl<G: GrantStore> SessionUseCase<G> {
    pub async fn lookup(&self, session_id: Option<&str>) -> Result<SessionGrant, MailerError> {
        let Some(session_id) = session_id else {
            return Ok(SessionGrant::Missing);
        };
        Ok(match self.grants.get(session_id).await? {
            None => SessionGrant::Missing,
            Some(grant) if grant.is_expired() => SessionGrant::Expired(grant),
            Some(grant) => SessionGrant::Active(grant),
        })
    }

    /// Grant usable for provider calls, or the re-authentication error.
    pub async fn require(&self, session_id: Option<&str>) -> Result<Grant, MailerError> {
        match self.lookup(session_id).await? {
            SessionGrant::Active(grant) => Ok(grant),
            SessionGrant::Expired(_) => Err(MailerError::GrantExpired),
            SessionGrant::Missing => Err(MailerError::NotAuthenticated),
        }
    }

    pub async fn logout(&self, session_id: Option<&str>) -> Result<(), MailerError> {
        if let Some(session_id) = session_id {
            self.grants.remove(session_id).await?;
        }
        Ok(())
    }
}

pub struct ExchangeCodeUseCase<O: OAuthPort, G: GrantStore> {
    pub oauth: O,
    pub grants: G,
    pub ttl_secs: u64,
}

impl<O: OAuthPort, G: GrantStore> ExchangeCodeUseCase<O, G> {
    /// Exchange an authorization code and store the grant under a new session id.
    pub async fn execute(&self, code: &str) -> Result<(String, Grant), MailerError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(MailerError::MissingField("code"));
        }
        let exchanged = self
            .oauth
            .exchange_code(code)
            .await
            .map_err(MailerError::OAuthExchangeFailed)?;
        let grant = Grant::new(
            exchanged.grant_id,
            exchanged.email,
            Duration::seconds(self.ttl_secs as i64),
        );
        let session_id = new_session_id();
        self.grants.put(&session_id, &grant).await?;
        tracing::info!(grant_id = %grant.grant_id, "grant stored for new session");
        Ok((session_id, grant))
    }
}
