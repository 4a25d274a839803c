use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::providers::http_errors::is_transient;

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    Duration::from_millis(policy.base_delay_ms.saturating_mul(1 << attempt.min(10)))
}

/// Sends the request built by `build`, retrying connect failures, timeouts,
/// 5xx and 429 up to `policy.max_retries` times.
///
/// The last response is returned as-is once retries run out, so callers still
/// see the final status.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    url: &str,
    mut build: F,
) -> Result<Response, reqwest::Error>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let result = build().send().await;
        let retry = match &result {
            Ok(response) => is_retryable_status(response.status()),
            Err(err) => is_transient(err),
        };

        if !retry || attempt >= policy.max_retries {
            if attempt > 0 {
                debug!(url, attempts = attempt + 1, "request finished after retries");
            }
            return result;
        }

        let delay = backoff(policy, attempt);
        match &result {
            Ok(response) => warn!(
                url,
                attempt = attempt + 1,
                status = %response.status(),
                delay_ms = delay.as_millis(),
                "retrying request after server error"
            ),
            Err(err) => warn!(
                url,
                attempt = attempt + 1,
                error = %err,
                delay_ms = delay.as_millis(),
                "retrying request after transport error"
            ),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread::{self, JoinHandle};

    /// Serves one canned `(status line, body)` per accepted connection, in order.
    pub(crate) fn serve(
        responses: Vec<(&'static str, String)>,
    ) -> (SocketAddr, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept should succeed");
                requests.push(read_request(&mut stream));
                let reply = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream
                    .write_all(reply.as_bytes())
                    .expect("write should succeed");
            }
            requests
        });
        (addr, handle)
    }

    /// Returns the request line followed by the body, if any.
    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let read = stream.read(&mut chunk).expect("read should succeed");
            if read == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..read]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let read = stream.read(&mut chunk).expect("read should succeed");
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
        }

        let request_line = head.lines().next().unwrap_or_default().to_string();
        let body = String::from_utf8_lossy(&buf[header_end.min(buf.len())..]).to_string();
        if body.is_empty() {
            request_line
        } else {
            format!("{request_line}\n{body}")
        }
    }
}
