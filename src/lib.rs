pub mod assistant;
pub mod browser;
pub mod config;
pub mod flights;
pub mod hotels;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod providers;
pub mod repl;
pub mod retry;

use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use tracing::info;

use assistant::{Assistant, Turn};
use config::Config;
use repl::run_repl;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cfg = Config::from_env();
    info!(
        provider = %cfg.model_provider,
        model = %cfg.model,
        browser_backend = cfg.browser_backend.as_str(),
        hotel_source = cfg.hotel_source.as_str(),
        hotel_search_url = %cfg.hotel_search_url,
        default_nights = cfg.default_nights,
        "loaded runtime configuration"
    );

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let mut assistant = Assistant::from_config(&client, &cfg)?;

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        run_repl(&mut assistant, &cfg).await
    } else {
        let prompt = args.join(" ");
        if let Turn::Reply(answer) = assistant.respond(&prompt).await? {
            println!("{}", answer.trim_end());
        }
        Ok(())
    }
}
