pub mod http_errors;
pub mod ollama;
pub mod openai;

use tracing::warn;

pub(crate) async fn non_success_error(
    provider: &str,
    api_url: &str,
    response: reqwest::Response,
) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read response body>".to_string());
    warn!(
        provider,
        api_url = %api_url,
        status = %status,
        response_body_len = body.len(),
        "model provider returned non-success status"
    );
    anyhow::anyhow!("Model request failed with status {}: {}", status, body)
}
