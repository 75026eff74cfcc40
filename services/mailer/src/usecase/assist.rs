//! Completion-backed writing assistance: categorization, replies, refinement
//! and marketing copy. Every result is trimmed of surrounding whitespace.

use crate::domain::repository::CompletionPort;
use crate::domain::types::{
    CATEGORIZE_TEMPERATURE, ChatMessage, CompletionRequest, MARKETING_MAX_TOKENS,
    REFINE_MAX_TOKENS, REPLY_MAX_TOKENS,
};
use crate::error::ExternalError;

pub const DEFAULT_TONE: &str = "professional";

const CATEGORIZE_SYSTEM_PROMPT: &str = "You are an email categorization assistant. \
Categorize emails into specific, concise categories that can be used for grouping. \
Use categories like 'Work', 'Personal', 'Finance', 'Travel', 'Shopping', 'Social', \
'News', 'Marketing', 'Education', etc. If none of these fit, create a suitable \
category name. Provide only the category name, nothing else.";

const REFINE_SYSTEM_PROMPT: &str =
    "You are an assistant that refines email responses based on user instructions.";

const MARKETING_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub struct AssistUseCase<C: CompletionPort> {
    pub completion: C,
}

impl<C: CompletionPort> AssistUseCase<C> {
    async fn complete_trimmed(&self, request: CompletionRequest) -> Result<String, ExternalError> {
        let text = self.completion.complete(&request).await?;
        Ok(text.trim().to_owned())
    }

    /// Category label for a message.
    pub async fn categorize(&self, subject: &str, body: &str) -> Result<String, ExternalError> {
        self.complete_trimmed(CompletionRequest {
            messages: vec![
                ChatMessage::system(CATEGORIZE_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Categorize this email based on the subject and body. Subject: {subject}. Body: {body}"
                )),
            ],
            max_tokens: None,
            temperature: Some(CATEGORIZE_TEMPERATURE),
        })
        .await
    }

    /// Reply to `email_body` in `tone`.
    pub async fn suggest_reply(&self, email_body: &str, tone: &str) -> Result<String, ExternalError> {
        self.complete_trimmed(CompletionRequest {
            messages: vec![
                ChatMessage::system(format!(
                    "You are an assistant that generates {tone} email responses."
                )),
                ChatMessage::user(format!("Write a {tone} response to this email: {email_body}")),
            ],
            max_tokens: Some(REPLY_MAX_TOKENS),
            temperature: None,
        })
        .await
    }

    /// Rework `current_response` following `instructions`.
    pub async fn refine_reply(
        &self,
        original_email: &str,
        current_response: &str,
        instructions: &str,
    ) -> Result<String, ExternalError> {
        self.complete_trimmed(CompletionRequest {
            messages: vec![
                ChatMessage::system(REFINE_SYSTEM_PROMPT),
                ChatMessage::user(format!("Original email: {original_email}")),
                ChatMessage::assistant(format!("Current response: {current_response}")),
                ChatMessage::user(format!(
                    "Please refine the response according to these instructions: {instructions}"
                )),
            ],
            max_tokens: Some(REFINE_MAX_TOKENS),
            temperature: None,
        })
        .await
    }

    /// Marketing email body from a short brief.
    pub async fn marketing_email(&self, prompt: &str) -> Result<String, ExternalError> {
        self.complete_trimmed(CompletionRequest {
            messages: vec![
                ChatMessage::system(MARKETING_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Create a marketing email based on the following input: {prompt}"
                )),
            ],
            max_tokens: Some(MARKETING_MAX_TOKENS),
            temperature: None,
        })
        .await
    }
}
