//! Nylas v3 REST client.
//!
//! Every call authenticates with the application API key as a bearer token;
//! mailbox operations are scoped by the grant id obtained through hosted OAuth.
//! Responses arrive wrapped in `{"request_id", "data"}`.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::domain::repository::{MailProvider, OAuthPort};
use crate::domain::types::{Contact, Draft, EmailMessage, OAuthGrant, OutgoingMessage, SentMessage};
use crate::error::ExternalError;
use crate::infra::http::{decode, transport};

#[derive(Debug, Clone)]
pub struct NylasSettings {
    pub api_uri: String,
    pub api_key: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub provider: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct NylasClient {
    http: Client,
    settings: NylasSettings,
}

impl NylasClient {
    pub fn new(settings: NylasSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    /// `api_uri` with `segments` appended as escaped path segments.
    fn url(&self, segments: &[&str]) -> Result<Url, ExternalError> {
        let mut url = Url::parse(&self.settings.api_uri)
            .map_err(|e| ExternalError::Transport(format!("invalid API URI: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ExternalError::Transport("API URI cannot be a base".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn grant_url(&self, grant_id: &str, rest: &[&str]) -> Result<Url, ExternalError> {
        let mut segments = vec!["v3", "grants", grant_id];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    async fn get_data<T: DeserializeOwned>(&self, url: Url) -> Result<T, ExternalError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.settings.api_key)
            .send()
            .await
            .map_err(transport)?;
        Ok(decode::<Envelope<T>>(resp).await?.data)
    }

    async fn post_data<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &OutgoingMessage,
    ) -> Result<T, ExternalError> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Ok(decode::<Envelope<T>>(resp).await?.data)
    }
}

impl MailProvider for NylasClient {
    async fn list_messages(
        &self,
        grant_id: &str,
        limit: u32,
    ) -> Result<Vec<EmailMessage>, ExternalError> {
        let mut url = self.grant_url(grant_id, &["messages"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_data(url).await
    }

    async fn find_message(
        &self,
        grant_id: &str,
        message_id: &str,
    ) -> Result<EmailMessage, ExternalError> {
        let url = self.grant_url(grant_id, &["messages", message_id])?;
        self.get_data(url).await
    }

    async fn send_message(
        &self,
        grant_id: &str,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, ExternalError> {
        let url = self.grant_url(grant_id, &["messages", "send"])?;
        self.post_data(url, message).await
    }

    async fn create_draft(
        &self,
        grant_id: &str,
        message: &OutgoingMessage,
    ) -> Result<Draft, ExternalError> {
        let url = self.grant_url(grant_id, &["drafts"])?;
        self.post_data(url, message).await
    }

    async fn list_drafts(&self, grant_id: &str) -> Result<Vec<Draft>, ExternalError> {
        let url = self.grant_url(grant_id, &["drafts"])?;
        self.get_data(url).await
    }

    async fn list_contacts(&self, grant_id: &str) -> Result<Vec<Contact>, ExternalError> {
        let url = self.grant_url(grant_id, &["contacts"])?;
        self.get_data(url).await
    }
}

impl OAuthPort for NylasClient {
    fn authorize_url(&self) -> Result<String, ExternalError> {
        let mut url = self.url(&["v3", "connect", "auth"])?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("provider", &self.settings.provider)
            .append_pair("access_type", "online");
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthGrant, ExternalError> {
        let url = self.url(&["v3", "connect", "token"])?;
        let body = json!({
            "client_id": self.settings.client_id,
            "client_secret": self.settings.client_secret,
            "code": code,
            "redirect_uri": self.settings.redirect_uri,
            "grant_type": "authorization_code",
        });
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        decode(resp).await
    }
}
