//! DingTalk group robot client - CLI entry point.
//!
//! Provides subcommands for each message type, replying to outgoing
//! callbacks, and inspecting configuration.

use anyhow::{Context, Result};
use clap::Parser;
use dingtalk_robot::cli::{Cli, Commands};
use dingtalk_robot::robot::{Endpoint, Outgoing, Robot, RobotOption};
use dingtalk_robot::Config;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config;

    match cli.command {
        Commands::Text { content, mention } => {
            load_robot(config_path)?
                .send_text(content, mention.options())
                .await
                .context("Failed to send text message")?;
        }
        Commands::Link {
            title,
            text,
            url,
            pic_url,
        } => {
            load_robot(config_path)?
                .send_link(title, text, url, pic_url, [])
                .await
                .context("Failed to send link message")?;
        }
        Commands::Markdown {
            title,
            text,
            mention,
        } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin().context("Failed to read markdown from stdin")?,
            };
            load_robot(config_path)?
                .send_markdown(title, text, mention.options())
                .await
                .context("Failed to send markdown message")?;
        }
        Commands::ActionCard {
            title,
            text,
            single,
            buttons,
            hide_avatar,
            vertical,
        } => {
            let options = Commands::action_card_options(single, buttons, hide_avatar, vertical);
            load_robot(config_path)?
                .send_action_card(title, text, options)
                .await
                .context("Failed to send action card")?;
        }
        Commands::FeedCard { links } => {
            let options = links
                .into_iter()
                .map(|(title, url, pic)| RobotOption::add_feed_link(title, url, pic));
            load_robot(config_path)?
                .send_feed_card(options)
                .await
                .context("Failed to send feed card")?;
        }
        Commands::Reply { content, mention } => {
            let outgoing = read_outgoing()?;
            info!(sender = %outgoing.sender_nick, "Replying to outgoing callback");
            let mut options = mention.options();
            options.push(RobotOption::reply_to(outgoing));
            load_robot(config_path)?
                .send_text(content, options)
                .await
                .context("Failed to reply to outgoing callback")?;
        }
        Commands::Parse => {
            print_outgoing(&read_outgoing()?);
            return Ok(());
        }
        Commands::Status => {
            print_status(Config::load(config_path));
            return Ok(());
        }
    }

    info!("Message sent");
    Ok(())
}

/// Load configuration and build the robot client.
fn load_robot(config_path: Option<PathBuf>) -> Result<Robot> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    config
        .build_robot()
        .context("Failed to create HTTP transport")
}

/// Read input from stdin.
fn read_stdin() -> Result<String, io::Error> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Decode an outgoing callback body from stdin.
fn read_outgoing() -> Result<Outgoing> {
    Outgoing::from_reader(io::stdin().lock()).context("Failed to decode outgoing callback")
}

fn print_outgoing(outgoing: &Outgoing) {
    println!("📨 Outgoing Callback\n");
    println!("   Sender: {} ({})", outgoing.sender_nick, outgoing.sender_id);
    println!("   Admin: {}", outgoing.is_admin);
    println!(
        "   Conversation: {} [type {}]",
        outgoing.conversation_title, outgoing.conversation_type
    );
    println!("   Message: {}", outgoing.msg_id);
    println!("   Text: {}", outgoing.text.content);
    println!("   Session webhook: {}", outgoing.session_webhook);
    println!(
        "   Expires at: {}",
        chrono::DateTime::from_timestamp_millis(outgoing.session_webhook_expired_time)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| outgoing.session_webhook_expired_time.to_string())
    );
}

/// Print configuration status.
fn print_status(config: Result<Config, dingtalk_robot::ConfigError>) {
    println!("📊 DingTalk Robot Status\n");

    match config {
        Ok(config) => {
            println!("✅ Configuration: Found");
            match &config.endpoint {
                Endpoint::Webhook(webhook) => {
                    println!("   Webhook: {}", mask_token(webhook));
                }
                Endpoint::AccessToken { api_base, .. } => {
                    println!("   API base: {}", api_base);
                    println!("   Access token: ***");
                }
            }
            println!(
                "   Signing: {}",
                if config.secret.is_some() {
                    "Enabled"
                } else {
                    "Disabled"
                }
            );
            println!("   Timeout: {}ms", config.timeout_ms);
        }
        Err(e) => {
            println!("❌ Configuration: Not found or invalid");
            println!("   Error: {}", e);
            println!();
            println!(
                "Create config at {}:",
                dingtalk_robot::config::default_config_path().display()
            );
            println!(r#"  {{"webhook": "https://oapi.dingtalk.com/robot/send?access_token=...", "secret": "SEC..."}}"#);
        }
    }
}

/// Hide the access token in a webhook URL.
fn mask_token(webhook: &str) -> String {
    match webhook.split_once("access_token=") {
        Some((prefix, _)) => format!("{}access_token=***", prefix),
        None => webhook.to_string(),
    }
}
