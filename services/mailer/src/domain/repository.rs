#![allow(async_fn_in_trait)]

use std::future::Future;

use mailcraft_session::grant::Grant;

use crate::domain::types::{
    Campaign, CampaignStatus, CompletionRequest, Contact, Draft, EmailMessage, NewCampaign,
    NewRecipient, OAuthGrant, OutgoingMessage, Recipient, SentMessage,
};
use crate::error::{ExternalError, MailerError};

// Ports reached from the campaign scheduler return `Send` futures so a job can
// run on a spawned task.

/// Repository for campaign recipients.
pub trait RecipientRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Recipient>, MailerError>> + Send;

    /// Insert, or overwrite the name of the recipient with the same email.
    fn upsert(
        &self,
        recipient: &NewRecipient,
    ) -> impl Future<Output = Result<Recipient, MailerError>> + Send;

    fn count(&self) -> impl Future<Output = Result<u64, MailerError>> + Send;
}

/// Repository for campaigns.
pub trait CampaignRepository: Send + Sync {
    fn create(
        &self,
        campaign: &NewCampaign,
    ) -> impl Future<Output = Result<Campaign, MailerError>> + Send;

    fn find_by_id(
        &self,
        id: i32,
    ) -> impl Future<Output = Result<Option<Campaign>, MailerError>> + Send;

    /// All campaigns, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Campaign>, MailerError>> + Send;

    fn update_status(
        &self,
        id: i32,
        status: CampaignStatus,
    ) -> impl Future<Output = Result<(), MailerError>> + Send;
}

/// Mail provider API scoped by grant id.
pub trait MailProvider: Send + Sync {
    /// Most recent messages, newest first.
    fn list_messages(
        &self,
        grant_id: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<EmailMessage>, ExternalError>> + Send;

    fn find_message(
        &self,
        grant_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<EmailMessage, ExternalError>> + Send;

    fn send_message(
        &self,
        grant_id: &str,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<SentMessage, ExternalError>> + Send;

    fn create_draft(
        &self,
        grant_id: &str,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<Draft, ExternalError>> + Send;

    fn list_drafts(
        &self,
        grant_id: &str,
    ) -> impl Future<Output = Result<Vec<Draft>, ExternalError>> + Send;

    fn list_contacts(
        &self,
        grant_id: &str,
    ) -> impl Future<Output = Result<Vec<Contact>, ExternalError>> + Send;
}

/// Hosted OAuth: authorize URL and code exchange.
pub trait OAuthPort: Send + Sync {
    fn authorize_url(&self) -> Result<String, ExternalError>;
    async fn exchange_code(&self, code: &str) -> Result<OAuthGrant, ExternalError>;
}

/// Chat-completion API.
pub trait CompletionPort: Send + Sync {
    /// Generated text of the first choice, untrimmed.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ExternalError>;
}

/// Server-side session state holding each browser session's grant.
pub trait GrantStore: Send + Sync {
    async fn put(&self, session_id: &str, grant: &Grant) -> Result<(), MailerError>;
    async fn get(&self, session_id: &str) -> Result<Option<Grant>, MailerError>;
    async fn remove(&self, session_id: &str) -> Result<(), MailerError>;
}
