//! Wire-format DTOs and response decoding.
//!
//! Decoding is kept as pure functions over (status, body text) so the
//! mapping rules are unit-testable without a running service.

use serde::{Deserialize, Serialize};

use tutorchat_core::error::{ChatClientError, Result};

use crate::BotReply;

/// Shown when a non-success response carries no usable `error` field.
pub(crate) const MSG_GENERIC_ERROR: &str = "发生错误，请稍后重试。";
/// Shown when a success response carries no reply text at all.
pub(crate) const MSG_EMPTY_REPLY: &str = "（无回复）";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartDialogueRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContinueDialogueRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EndDialogueRequest<'a> {
    pub session_id: &'a str,
}

/// Success body. Some deployments answer with `message` instead of
/// `response`; both are accepted.
#[derive(Debug, Deserialize)]
struct ReplyBody {
    response: Option<String>,
    message: Option<String>,
    session_id: Option<String>,
    character: Option<String>,
    topic: Option<String>,
    turn_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Decodes a response into a [`BotReply`].
///
/// # Errors
///
/// Non-2xx statuses become [`ChatClientError::Api`] with the body's `error`
/// field when present; an unparsable success body becomes a serialization
/// error.
pub(crate) fn decode_reply(status: u16, body: &str) -> Result<BotReply> {
    if !(200..300).contains(&status) {
        return Err(error_from_response(status, body));
    }
    let parsed: ReplyBody = serde_json::from_str(body)?;
    let response = parsed
        .response
        .or(parsed.message)
        .unwrap_or_else(|| MSG_EMPTY_REPLY.to_string());
    Ok(BotReply {
        response,
        session_id: parsed.session_id,
        character: parsed.character,
        topic: parsed.topic,
        turn_count: parsed.turn_count,
    })
}

/// Maps a non-success response to an [`ChatClientError::Api`].
pub(crate) fn error_from_response(status: u16, body: &str) -> ChatClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| MSG_GENERIC_ERROR.to_string());
    ChatClientError::api(status, message)
}
