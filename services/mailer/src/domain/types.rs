use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mailcraft_core::serde::to_rfc3339_ms;

// ── Recipients & campaigns ───────────────────────────────────────────────────

/// Stored campaign recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipient {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Recurring,
    Sent,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Recurring => "recurring",
            Self::Sent => "sent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "scheduled" => Some(Self::Scheduled),
            "recurring" => Some(Self::Recurring),
            "sent" => Some(Self::Sent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Campaign {
    pub id: i32,
    pub name: String,
    pub subject: String,
    pub body: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "mailcraft_core::serde::to_rfc3339_ms_opt")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: CampaignStatus,
}

/// Delivery choice made when a campaign is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChoice {
    /// One-shot send `days` from now.
    Once { days: i64 },
    /// Send on every occurrence of the configured recurrence rule.
    Recurring,
}

// ── Mail provider payloads ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

impl Participant {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    pub fn email_only(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }
}

/// Message as returned by the provider. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Vec<Participant>,
    #[serde(default)]
    pub to: Vec<Participant>,
    /// Unix seconds.
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub unread: Option<bool>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl EmailMessage {
    pub fn subject_or_empty(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }

    pub fn body_or_empty(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// First sender, the target of a reply.
    pub fn sender(&self) -> Option<&Participant> {
        self.from.first()
    }
}

/// Message to send or save as a draft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: String,
    pub to: Vec<Participant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<String>,
    /// Unix seconds; the provider holds the message until then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_at: Option<i64>,
}

/// Provider acknowledgement of a send.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub schedule_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub to: Vec<Participant>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactEmail {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub emails: Vec<ContactEmail>,
}

impl Contact {
    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .map(|e| e.email.trim())
            .find(|e| !e.is_empty())
    }

    /// "Given Surname", falling back to the email address.
    pub fn display_name(&self) -> String {
        let name = [self.given_name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.primary_email().unwrap_or_default().to_owned()
        } else {
            name
        }
    }
}

/// Result of the OAuth code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthGrant {
    pub grant_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ── Completion payloads ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

// ── Limits ───────────────────────────────────────────────────────────────────

/// Messages returned by `/nylas/recent-emails`.
pub const RECENT_EMAIL_LIMIT: u32 = 5;

/// Messages categorized by `/nylas/categorize-emails`.
pub const CATEGORIZE_EMAIL_LIMIT: u32 = 10;

pub const REPLY_MAX_TOKENS: u32 = 150;
pub const REFINE_MAX_TOKENS: u32 = 200;
pub const MARKETING_MAX_TOKENS: u32 = 300;
pub const CATEGORIZE_TEMPERATURE: f32 = 0.3;
