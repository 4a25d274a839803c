use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn chain_matches(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    message_fragment: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains(message_fragment)
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    chain_matches(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    chain_matches(err, ErrorKind::TimedOut, "timed out")
}

/// Connect failures and timeouts are worth another attempt; everything else is not.
pub(crate) fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || error_chain_has_timeout(err)
}

/// Names the upstream and the environment knobs used in error hints.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Upstream {
    pub label: &'static str,
    pub url_var: &'static str,
    pub timeout_var: &'static str,
}

pub(crate) const MODEL_API: Upstream = Upstream {
    label: "model API",
    url_var: "MODEL_BASE_URL",
    timeout_var: "MODEL_TIMEOUT_SECS",
};

pub(crate) const TRAVEL_API: Upstream = Upstream {
    label: "travel API",
    url_var: "AMADEUS_BASE_URL",
    timeout_var: "HTTP_TIMEOUT_SECS",
};

pub(crate) const HOTEL_API: Upstream = Upstream {
    label: "hotel API",
    url_var: "TRAVEL_ADVISOR_URL",
    timeout_var: "HTTP_TIMEOUT_SECS",
};

pub(crate) const HOTEL_SITE: Upstream = Upstream {
    label: "hotel search site",
    url_var: "HOTEL_SEARCH_URL",
    timeout_var: "HTTP_TIMEOUT_SECS",
};

pub(crate) fn request_error(
    upstream: Upstream,
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> anyhow::Error {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return anyhow!(
            "Request to {} timed out after {}s while calling '{}'. \
             Increase {} or check upstream responsiveness.",
            upstream.label,
            timeout_secs,
            api_url,
            upstream.timeout_var
        );
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return anyhow!(
                "Connection refused by {} at '{}'. \
                 Ensure the service is running and {} is correct.",
                upstream.label,
                api_url,
                upstream.url_var
            );
        }

        return anyhow!(
            "Failed to connect to {} at '{}'. \
             Check {} and network connectivity.",
            upstream.label,
            api_url,
            upstream.url_var
        );
    }

    anyhow!("Failed to call {} at '{}': {}", upstream.label, api_url, err)
}

pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> anyhow::Error {
    request_error(MODEL_API, err, api_url, timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::{
        TRAVEL_API, error_chain_has_timeout, is_transient, model_api_request_error, request_error,
    };
    use reqwest::Client;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_errors_to_actionable_message() {
        let addr = free_local_addr();
        let api_url = format!("http://{}/api/chat", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        assert!(is_transient(&req_err));
        let mapped = model_api_request_error(req_err, &api_url, 1);
        let msg = format!("{mapped:#}");

        assert!(
            msg.contains("Connection refused by model API"),
            "unexpected message: {msg}"
        );
        assert!(msg.contains("MODEL_BASE_URL"), "unexpected message: {msg}");
    }

    #[tokio::test]
    async fn maps_timeout_errors_to_actionable_message() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let api_url = format!("http://{}/v2/shopping/flight-offers", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .get(&api_url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let mapped = request_error(TRAVEL_API, req_err, &api_url, 2);
        let msg = format!("{mapped:#}");

        assert!(
            msg.contains("Request to travel API timed out after 2s"),
            "unexpected message: {msg}"
        );
        assert!(
            msg.contains("HTTP_TIMEOUT_SECS"),
            "unexpected message: {msg}"
        );

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_timeout_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(error_chain_has_timeout(&err));
    }
}
