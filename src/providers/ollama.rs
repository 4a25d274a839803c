use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::Message;
use crate::providers::http_errors::model_api_request_error;
use crate::providers::non_success_error;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

fn chat_url(base_url: &str) -> String {
    format!("{}/api/chat", base_url.trim_end_matches('/'))
}

pub(crate) fn wire_messages(messages: &[Message]) -> Vec<WireMessage<'_>> {
    messages
        .iter()
        .map(|msg| WireMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

pub async fn chat(client: &Client, cfg: &Config, messages: &[Message]) -> Result<String> {
    let api_url = chat_url(&cfg.model_base_url);
    let body = OllamaChatRequest {
        model: &cfg.model,
        stream: false,
        messages: wire_messages(messages),
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        message_count = messages.len(),
        "sending ollama chat request"
    );

    let response = client
        .post(&api_url)
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %api_url, model = %cfg.model, error = %err, "ollama request failed");
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        return Err(non_success_error("ollama", &api_url, response).await);
    }

    let parsed: OllamaChatResponse = response
        .json()
        .await
        .context("Failed to parse ollama chat response")?;
    debug!(
        model = %cfg.model,
        response_len = parsed.message.content.len(),
        "received ollama chat response"
    );
    Ok(parsed.message.content)
}
