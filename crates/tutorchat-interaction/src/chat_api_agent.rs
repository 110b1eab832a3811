//! HTTP implementation of [`ChatBackend`] over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use tutorchat_core::config::ClientConfig;
use tutorchat_core::error::Result;
use tutorchat_core::image::ImageAttachment;

use crate::wire::{
    ChatRequest, ContinueDialogueRequest, EndDialogueRequest, StartDialogueRequest, decode_reply,
    error_from_response,
};
use crate::{BotReply, ChatBackend};

/// Talks to the tutoring service over HTTP.
///
/// One instance is shared for the lifetime of the process; the inner
/// `reqwest::Client` pools connections across requests.
#[derive(Clone)]
pub struct ChatApiAgent {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ChatApiAgent {
    /// Creates a new agent from the client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs a JSON body and decodes the reply.
    async fn post_for_reply<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<BotReply> {
        tracing::debug!("[ChatApiAgent] POST {}", path);
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        decode_reply(status, &text)
    }
}

#[async_trait]
impl ChatBackend for ChatApiAgent {
    async fn chat(&self, message: &str, image: Option<&ImageAttachment>) -> Result<BotReply> {
        let request = ChatRequest {
            message,
            image: image.map(|i| i.data_url.as_str()),
        };
        self.post_for_reply("/chat", &request).await
    }

    async fn start_dialogue(&self, message: &str) -> Result<BotReply> {
        self.post_for_reply("/start_dialogue", &StartDialogueRequest { message })
            .await
    }

    async fn continue_dialogue(&self, session_id: &str, message: &str) -> Result<BotReply> {
        self.post_for_reply(
            "/continue_dialogue",
            &ContinueDialogueRequest {
                session_id,
                message,
            },
        )
        .await
    }

    async fn end_dialogue(&self, session_id: &str) -> Result<()> {
        tracing::debug!("[ChatApiAgent] POST /end_dialogue");
        let response = self
            .client
            .post(self.endpoint("/end_dialogue"))
            .json(&EndDialogueRequest { session_id })
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &text));
        }
        // The body is ignored on success
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let config = ClientConfig {
            base_url: "http://localhost:5001/".to_string(),
            timeout_secs: 5,
        };
        let agent = ChatApiAgent::new(&config);
        assert_eq!(agent.endpoint("/chat"), "http://localhost:5001/chat");
    }
}
