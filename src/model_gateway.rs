use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::model::{self, Message};

pub type ModelGatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

/// Seam between the assistant and whatever answers free-form chat.
pub trait ModelGateway {
    fn chat<'a>(&'a self, messages: &'a [Message]) -> ModelGatewayFuture<'a>;
}

/// Forwards chat to the provider named in the configuration.
pub struct HostModelGateway<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> HostModelGateway<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }
}

impl ModelGateway for HostModelGateway<'_> {
    fn chat<'a>(&'a self, messages: &'a [Message]) -> ModelGatewayFuture<'a> {
        Box::pin(model::chat(self.client, self.cfg, messages))
    }
}

#[cfg(test)]
mod tests {
    use super::{HostModelGateway, ModelGateway};
    use crate::config::Config;
    use crate::model::Message;

    #[tokio::test]
    async fn host_gateway_rejects_unknown_provider() {
        let client = reqwest::Client::new();
        let mut cfg = Config::from_env_with(|_| None);
        cfg.model_provider = "carrier-pigeon".to_string();
        let gateway = HostModelGateway::new(&client, &cfg);

        let err = gateway
            .chat(&[Message::user("ping")])
            .await
            .expect_err("unknown provider should fail");
        let msg = format!("{err:#}");
        assert!(msg.contains("Unsupported MODEL_PROVIDER"), "unexpected: {msg}");
    }

    #[tokio::test]
    async fn host_gateway_requires_openai_key() {
        let client = reqwest::Client::new();
        let cfg =
            Config::from_env_with(|key| (key == "MODEL_PROVIDER").then(|| "openai".to_string()));
        let gateway = HostModelGateway::new(&client, &cfg);

        let err = gateway
            .chat(&[Message::user("ping")])
            .await
            .expect_err("missing key should fail");
        assert!(format!("{err:#}").contains("OPENAI_API_KEY"));
    }
}
