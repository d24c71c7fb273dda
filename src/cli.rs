//! CLI argument parsing with subcommands.

use crate::robot::{BtnOrientation, HideAvatar, RobotOption};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// DingTalk group robot client.
///
/// Sends messages to a robot webhook and replies to outgoing callbacks.
#[derive(Parser)]
#[command(name = "dingtalk-robot")]
#[command(about = "Send DingTalk group robot messages")]
#[command(version)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Mention flags shared by text and markdown messages.
#[derive(Args, Debug, Default)]
pub struct MentionArgs {
    /// Mention everyone in the group
    #[arg(long)]
    pub at_all: bool,

    /// Mention a member by mobile number (repeatable)
    #[arg(long = "at-mobile")]
    pub at_mobiles: Vec<String>,
}

impl MentionArgs {
    pub fn options(&self) -> Vec<RobotOption> {
        let mut options = Vec::new();
        if self.at_all {
            options.push(RobotOption::AtAll);
        }
        if !self.at_mobiles.is_empty() {
            options.push(RobotOption::at_mobiles(self.at_mobiles.iter().cloned()));
        }
        options
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Send a text message
    Text {
        /// Message content
        content: String,

        #[command(flatten)]
        mention: MentionArgs,
    },

    /// Send a link message
    Link {
        #[arg(long)]
        title: String,

        #[arg(long)]
        text: String,

        /// URL opened when the message is clicked
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "")]
        pic_url: String,
    },

    /// Send a markdown message (text read from stdin when omitted)
    Markdown {
        #[arg(long)]
        title: String,

        /// Markdown body
        text: Option<String>,

        #[command(flatten)]
        mention: MentionArgs,
    },

    /// Send an action card
    ActionCard {
        #[arg(long)]
        title: String,

        /// Markdown body
        #[arg(long)]
        text: String,

        /// Whole-card button as TITLE=URL
        #[arg(long, value_parser = parse_button)]
        single: Option<(String, String)>,

        /// Independent button as TITLE=URL (repeatable)
        #[arg(long = "button", value_parser = parse_button)]
        buttons: Vec<(String, String)>,

        /// Hide the sender avatar
        #[arg(long)]
        hide_avatar: bool,

        /// Stack buttons vertically
        #[arg(long)]
        vertical: bool,
    },

    /// Send a feed card
    FeedCard {
        /// Entry as TITLE|URL|PICTURE_URL (repeatable)
        #[arg(long = "link", value_parser = parse_feed_link, required = true)]
        links: Vec<(String, String, String)>,
    },

    /// Reply to an outgoing callback body read from stdin
    Reply {
        /// Reply content
        content: String,

        #[command(flatten)]
        mention: MentionArgs,
    },

    /// Decode an outgoing callback body from stdin and print it
    Parse,

    /// Show current configuration status
    Status,
}

impl Commands {
    /// Options for the action card subcommand.
    pub fn action_card_options(
        single: Option<(String, String)>,
        buttons: Vec<(String, String)>,
        hide_avatar: bool,
        vertical: bool,
    ) -> Vec<RobotOption> {
        let mut options = Vec::new();
        if let Some((title, url)) = single {
            options.push(RobotOption::single_button(title, url));
        }
        options.extend(
            buttons
                .into_iter()
                .map(|(title, url)| RobotOption::add_button(title, url)),
        );
        if hide_avatar {
            options.push(RobotOption::HideAvatar(HideAvatar::Hide));
        }
        if vertical {
            options.push(RobotOption::BtnOrientation(BtnOrientation::Vertical));
        }
        options
    }
}

/// Parse `TITLE=URL`. Splits on the first `=` so URLs may carry queries.
fn parse_button(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((title, url)) if !title.is_empty() && !url.is_empty() => {
            Ok((title.to_string(), url.to_string()))
        }
        _ => Err(format!("expected TITLE=URL, got '{}'", value)),
    }
}

/// Parse `TITLE|URL|PICTURE_URL`.
fn parse_feed_link(value: &str) -> Result<(String, String, String), String> {
    let parts: Vec<&str> = value.splitn(3, '|').collect();
    match parts.as_slice() {
        [title, url, pic] => Ok((title.to_string(), url.to_string(), pic.to_string())),
        _ => Err(format!("expected TITLE|URL|PICTURE_URL, got '{}'", value)),
    }
}
