//! Retry decorator for the mail provider.
//!
//! Every provider call goes through [`RetryPolicy::run`], so transient and
//! permanent failures alike are retried with exponential backoff before the
//! last error is surfaced.

use mailcraft_core::retry::RetryPolicy;

use crate::domain::repository::MailProvider;
use crate::domain::types::{Contact, Draft, EmailMessage, OutgoingMessage, SentMessage};
use crate::error::ExternalError;

#[derive(Clone)]
pub struct RetryingMailProvider<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: MailProvider> RetryingMailProvider<M> {
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<M: MailProvider> MailProvider for RetryingMailProvider<M> {
    async fn list_messages(
        &self,
        grant_id: &str,
        limit: u32,
    ) -> Result<Vec<EmailMessage>, ExternalError> {
        let inner = &self.inner;
        self.policy
            .run("list_messages", move || inner.list_messages(grant_id, limit))
            .await
    }

    async fn find_message(
        &self,
        grant_id: &str,
        message_id: &str,
    ) -> Result<EmailMessage, ExternalError> {
        let inner = &self.inner;
        self.policy
            .run("find_message", move || inner.find_message(grant_id, message_id))
            .await
    }

    async fn send_message(
        &self,
        grant_id: &str,
        message: &OutgoingMessage,
    ) -> Result<SentMessage, ExternalError> {
        let inner = &self.inner;
        self.policy
            .run("send_message", move || inner.send_message(grant_id, message))
            .await
    }

    async fn create_draft(
        &self,
        grant_id: &str,
        message: &OutgoingMessage,
    ) -> Result<Draft, ExternalError> {
        let inner = &self.inner;
        self.policy
            .run("create_draft", move || inner.create_draft(grant_id, message))
            .await
    }

    async fn list_drafts(&self, grant_id: &str) -> Result<Vec<Draft>, ExternalError> {
        let inner = &self.inner;
        self.policy
            .run("list_drafts", move || inner.list_drafts(grant_id))
            .await
    }

    async fn list_contacts(&self, grant_id: &str) -> Result<Vec<Contact>, ExternalError> {
        let inner = &self.inner;
        self.policy
            .run("list_contacts", move || inner.list_contacts(grant_id))
            .await
    }
}
