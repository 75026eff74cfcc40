//! Response handling shared by the provider and completion HTTP clients.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::ExternalError;

pub(crate) fn transport(err: reqwest::Error) -> ExternalError {
    ExternalError::Transport(err.to_string())
}

/// Read the body and decode it as `T`, mapping non-2xx statuses to [`ExternalError`].
pub(crate) async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ExternalError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(transport)?;
    if !status.is_success() {
        return Err(ExternalError::from_status(
            status.as_u16(),
            error_message(&bytes),
        ));
    }
    serde_json::from_slice(&bytes).map_err(|e| ExternalError::Decode(e.to_string()))
}

/// Extract `error.message` from a JSON error body, else the raw text.
pub(crate) fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_owned())
}
