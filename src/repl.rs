use anyhow::{Context, Result};
use std::io::{self, Write};
use tracing::warn;

use crate::assistant::{Assistant, Turn};
use crate::config::Config;

pub async fn run_repl(assistant: &mut Assistant<'_>, cfg: &Config) -> Result<()> {
    println!("wayfarer travel assistant");
    println!("model: {} ({})", cfg.model, cfg.model_provider);
    println!(
        "ask for 'cheapest hotels in <city>', 'flights from <a> to <b>', chat freely, '/help' for commands, or 'exit' to quit"
    );

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        let prompt = input.trim();
        if prompt.is_empty() {
            continue;
        }

        match assistant.respond(prompt).await {
            Ok(Turn::Exit) => break,
            Ok(Turn::Reply(answer)) => println!("{}\n", answer.trim_end()),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "turn failed");
                println!("error: {err:#}\n");
            }
        }
    }

    Ok(())
}
