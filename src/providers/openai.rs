use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::Message;
use crate::providers::http_errors::model_api_request_error;
use crate::providers::non_success_error;
use crate::providers::ollama::{WireMessage, wire_messages};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn first_choice_content(parsed: ChatCompletionResponse) -> Result<String> {
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("Model response contained no choices"))
}

pub async fn chat(client: &Client, cfg: &Config, messages: &[Message]) -> Result<String> {
    let api_key = cfg
        .openai_api_key
        .as_deref()
        .ok_or_else(|| anyhow!("MODEL_PROVIDER=openai requires OPENAI_API_KEY to be set"))?;
    let api_url = completions_url(&cfg.model_base_url);
    let body = ChatCompletionRequest {
        model: &cfg.model,
        messages: wire_messages(messages),
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        message_count = messages.len(),
        "sending openai chat completion request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(api_key)
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %api_url, model = %cfg.model, error = %err, "openai request failed");
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        return Err(non_success_error("openai", &api_url, response).await);
    }

    let parsed: ChatCompletionResponse = response
        .json()
        .await
        .context("Failed to parse openai chat completion response")?;
    let content = first_choice_content(parsed)?;
    debug!(
        model = %cfg.model,
        response_len = content.len(),
        "received openai chat completion"
    );
    Ok(content)
}
