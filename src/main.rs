use anyhow::{Context, Result};
use futures_util::future::join_all;
use log::{error, info};
use serde_json::json;
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::task::JoinHandle;

use modguard::bot::pipeline::ActionReport;
use modguard::config::DEFAULT_CONFIG_FILE;
use modguard::prelude::*;
use modguard::storage::open_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting modguard v{}", modguard::VERSION);

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = EngineConfig::load_or_create(&config_path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let store = open_store(&config.persistence).await;

    let console = Arc::new(ConsolePlatform::new());
    let engine = ModerationEngine::new(config, console.clone(), store)?;
    engine.load_state().await?;

    info!("Reading '<scope> <channel> <user> <text>' lines from stdin (prefix moderators with 'mod:')");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Vec<JoinHandle<ActionReport>> = Vec::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read from stdin: {}", e);
                        break;
                    }
                };

                let message = match console.parse_line(&line) {
                    Some(message) => message,
                    None => continue,
                };

                match engine.handle_command(&message).await {
                    Ok(Some(reply)) => {
                        println!("{}", json!({ "action": "reply", "channel": message.channel_id, "text": reply }));
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("Command from {} failed: {}", message.author_name, e);
                        continue;
                    }
                }

                pending.retain(|handle| !handle.is_finished());
                if let Some(outcome) = engine.moderate(&message).await {
                    pending.push(outcome.actions);
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C signal, shutting down...");
                break;
            }
        }
    }

    // Let side effects that already started finish writing their output
    let reports = join_all(pending);
    engine.shutdown().await;
    for result in reports.await {
        if let Err(e) = result {
            error!("Moderation action task failed: {}", e);
        }
    }

    info!("modguard stopped");
    Ok(())
}
