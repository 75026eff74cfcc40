//! JSON payload builders for the mail-provider and completion APIs.
//!
//! Shapes follow the Nylas v3 REST responses (`{"request_id", "data"}`) and the
//! OpenAI chat-completion response.

use serde_json::{Value, json};

/// A Nylas message object.
pub fn nylas_message(id: &str, subject: &str, body: &str, from_email: &str) -> Value {
    json!({
        "id": id,
        "grant_id": "grant-test",
        "object": "message",
        "subject": subject,
        "body": body,
        "snippet": body.chars().take(40).collect::<String>(),
        "from": [{ "name": "Sender", "email": from_email }],
        "to": [{ "name": "Me", "email": "me@example.com" }],
        "date": 1_767_225_600,
        "unread": true,
        "thread_id": format!("thread-{id}"),
    })
}

/// A Nylas draft object.
pub fn nylas_draft(id: &str, subject: &str, to_email: &str) -> Value {
    json!({
        "id": id,
        "grant_id": "grant-test",
        "object": "draft",
        "subject": subject,
        "body": "draft body",
        "to": [{ "email": to_email }],
        "date": 1_767_225_600,
    })
}

/// A Nylas contact object. `email = None` produces a contact without addresses.
pub fn nylas_contact(id: &str, given: &str, surname: &str, email: Option<&str>) -> Value {
    let emails = match email {
        Some(e) => json!([{ "email": e, "type": "work" }]),
        None => json!([]),
    };
    json!({
        "id": id,
        "grant_id": "grant-test",
        "object": "contact",
        "given_name": given,
        "surname": surname,
        "emails": emails,
    })
}

/// Wrap one object in the provider's single-item envelope.
pub fn nylas_envelope(data: Value) -> Value {
    json!({ "request_id": "req-test", "data": data })
}

/// Wrap objects in the provider's list envelope.
pub fn nylas_list(items: Vec<Value>) -> Value {
    json!({ "request_id": "req-test", "data": items })
}

/// Nylas hosted-auth token exchange response.
pub fn nylas_token(grant_id: &str, email: &str) -> Value {
    json!({
        "access_token": "at-test",
        "token_type": "Bearer",
        "grant_id": grant_id,
        "email": email,
        "provider": "google",
        "expires_in": 3600,
        "scope": "https://mail.google.com/",
    })
}

/// OpenAI chat-completion response whose first choice carries `content`.
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 },
    })
}
