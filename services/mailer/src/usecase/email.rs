use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::repository::{CompletionPort, MailProvider};
use crate::domain::types::{
    CATEGORIZE_EMAIL_LIMIT, Draft, EmailMessage, OutgoingMessage, Participant,
    RECENT_EMAIL_LIMIT, SentMessage,
};
use crate::error::{ExternalError, MailerError};
use crate::usecase::assist::AssistUseCase;
use crate::usecase::campaign::offset_days;

// ── Reading ──────────────────────────────────────────────────────────────────

pub struct InboxUseCase<M: MailProvider> {
    pub provider: M,
}

impl<M: MailProvider> InboxUseCase<M> {
    pub async fn recent(&self, grant_id: &str) -> Result<Vec<EmailMessage>, MailerError> {
        self.provider
            .list_messages(grant_id, RECENT_EMAIL_LIMIT)
            .await
            .map_err(MailerError::ProviderFailed)
    }

    pub async fn get(&self, grant_id: &str, message_id: &str) -> Result<EmailMessage, MailerError> {
        self.provider
            .find_message(grant_id, message_id)
            .await
            .map_err(MailerError::from_message_lookup)
    }

    pub async fn drafts(&self, grant_id: &str) -> Result<Vec<Draft>, MailerError> {
        self.provider
            .list_drafts(grant_id)
            .await
            .map_err(MailerError::ProviderFailed)
    }
}

// ── Categorization ───────────────────────────────────────────────────────────

/// One categorized message. A failed categorization is reported per message.
#[derive(Debug)]
pub struct CategorizedEmail {
    pub id: String,
    pub subject: String,
    pub snippet: Option<String>,
    pub category: Result<String, ExternalError>,
}

pub struct CategorizeEmailsUseCase<M: MailProvider, C: CompletionPort> {
    pub provider: M,
    pub assist: AssistUseCase<C>,
}

impl<M: MailProvider, C: CompletionPort> CategorizeEmailsUseCase<M, C> {
    pub async fn execute(&self, grant_id: &str) -> Result<Vec<CategorizedEmail>, MailerError> {
        let messages = self
            .provider
            .list_messages(grant_id, CATEGORIZE_EMAIL_LIMIT)
            .await
            .map_err(MailerError::ProviderFailed)?;

        let mut out = Vec::with_capacity(messages.len());
        for message in messages {
            let category = self
                .assist
                .categorize(message.subject_or_empty(), message.body_or_empty())
                .await;
            if let Err(e) = &category {
                tracing::warn!(message_id = %message.id, error = %e, "categorization failed");
            }
            out.push(CategorizedEmail {
                subject: message.subject_or_empty().to_owned(),
                id: message.id,
                snippet: message.snippet,
                category,
            });
        }
        Ok(out)
    }
}

// ── Replies ──────────────────────────────────────────────────────────────────

pub struct ReplyUseCase<M: MailProvider, C: CompletionPort> {
    pub provider: M,
    pub assist: AssistUseCase<C>,
}

#[derive(Debug, Serialize)]
pub struct SuggestedReply {
    pub message_id: String,
    pub original_email: String,
    pub suggested_response: String,
}

impl<M: MailProvider, C: CompletionPort> ReplyUseCase<M, C> {
    async fn load(&self, grant_id: &str, message_id: &str) -> Result<EmailMessage, MailerError> {
        self.provider
            .find_message(grant_id, message_id)
            .await
            .map_err(MailerError::from_message_lookup)
    }

    pub async fn suggest(
        &self,
        grant_id: &str,
        message_id: &str,
        tone: &str,
    ) -> Result<SuggestedReply, MailerError> {
        let message = self.load(grant_id, message_id).await?;
        let suggested_response = self
            .assist
            .suggest_reply(message.body_or_empty(), tone)
            .await
            .map_err(MailerError::CompletionFailed)?;
        Ok(SuggestedReply {
            original_email: message.body_or_empty().to_owned(),
            message_id: message.id,
            suggested_response,
        })
    }

    pub async fn refine(
        &self,
        grant_id: &str,
        message_id: &str,
        current_response: &str,
        instructions: &str,
    ) -> Result<String, MailerError> {
        let message = self.load(grant_id, message_id).await?;
        self.assist
            .refine_reply(message.body_or_empty(), current_response, instructions)
            .await
            .map_err(MailerError::CompletionFailed)
    }

    /// Send `final_response` to the message's sender, threaded as a reply.
    pub async fn send(
        &self,
        grant_id: &str,
        message_id: &str,
        final_response: &str,
    ) -> Result<SentMessage, MailerError> {
        let message = self.load(grant_id, message_id).await?;
        let to = message
            .sender()
            .cloned()
            .ok_or(MailerError::MissingField("from"))?;
        let outgoing = OutgoingMessage {
            subject: reply_subject(message.subject_or_empty()),
            body: final_response.to_owned(),
            to: vec![to],
            reply_to_message_id: Some(message.id.clone()),
            ..Default::default()
        };
        self.provider
            .send_message(grant_id, &outgoing)
            .await
            .map_err(MailerError::ProviderFailed)
    }
}

/// `Re: <subject>` unless the subject already carries the prefix.
pub fn reply_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject.is_empty() {
        "Re: Your Email".to_owned()
    } else if subject
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"))
    {
        subject.to_owned()
    } else {
        format!("Re: {subject}")
    }
}

// ── Composing ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    Send,
    Draft,
    /// Provider-side delayed send.
    Schedule {
        send_at: Option<i64>,
        schedule_days: Option<i64>,
    },
}

pub struct ComposeInput {
    pub to: Vec<Participant>,
    pub subject: String,
    pub body: String,
    pub action: ComposeAction,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComposeOutcome {
    Sent { message: SentMessage },
    Drafted { draft: Draft },
    Scheduled { message: SentMessage, send_at: i64 },
}

pub struct ComposeUseCase<M: MailProvider> {
    pub provider: M,
}

impl<M: MailProvider> ComposeUseCase<M> {
    pub async fn execute(
        &self,
        grant_id: &str,
        input: ComposeInput,
        now: DateTime<Utc>,
    ) -> Result<ComposeOutcome, MailerError> {
        if input.to.is_empty() {
            return Err(MailerError::MissingField("to"));
        }
        let mut message = OutgoingMessage {
            subject: input.subject,
            body: input.body,
            to: input.to,
            ..Default::default()
        };
        match input.action {
            ComposeAction::Send => {
                let sent = self
                    .provider
                    .send_message(grant_id, &message)
                    .await
                    .map_err(MailerError::ProviderFailed)?;
                Ok(ComposeOutcome::Sent { message: sent })
            }
            ComposeAction::Draft => {
                let draft = self
                    .provider
                    .create_draft(grant_id, &message)
                    .await
                    .map_err(MailerError::ProviderFailed)?;
                Ok(ComposeOutcome::Drafted { draft })
            }
            ComposeAction::Schedule {
                send_at,
                schedule_days,
            } => {
                let send_at = resolve_send_at(send_at, schedule_days, now)?;
                message.send_at = Some(send_at);
                let sent = self
                    .provider
                    .send_message(grant_id, &message)
                    .await
                    .map_err(MailerError::ProviderFailed)?;
                Ok(ComposeOutcome::Scheduled {
                    message: sent,
                    send_at,
                })
            }
        }
    }
}

/// Unix send time from an explicit timestamp or a day offset.
///
/// Unlike campaign creation, a zero offset is rejected: a scheduled send
/// must land in the future, same as an explicit `send_at`.
pub fn resolve_send_at(
    send_at: Option<i64>,
    schedule_days: Option<i64>,
    now: DateTime<Utc>,
) -> Result<i64, MailerError> {
    match (send_at, schedule_days) {
        (Some(at), _) if at <= now.timestamp() => Err(MailerError::InvalidSchedule(
            "send_at must be in the future".to_owned(),
        )),
        (Some(at), _) => Ok(at),
        (None, Some(days)) if days <= 0 => Err(MailerError::InvalidSchedule(
            "schedule_days must be positive".to_owned(),
        )),
        (None, Some(days)) => Ok(offset_days(now, days)?.timestamp()),
        (None, None) => Err(MailerError::MissingField("send_at")),
    }
}
