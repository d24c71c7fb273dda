//! Robot message model.
//!
//! A [`Message`] holds exactly one payload variant, an optional mention
//! block and an optional reply target. Only the payload and mention block
//! are serialized; the reply target decides where the message goes.

use super::outgoing::Outgoing;
use serde::{Serialize, Serializer};
use std::fmt;

/// Message type, serialized as the `msgtype` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MsgType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "markdown")]
    Markdown,
    #[serde(rename = "actionCard")]
    ActionCard,
    #[serde(rename = "feedCard")]
    FeedCard,
}

impl MsgType {
    /// Wire name of the message type.
    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::Text => "text",
            MsgType::Link => "link",
            MsgType::Markdown => "markdown",
            MsgType::ActionCard => "actionCard",
            MsgType::FeedCard => "feedCard",
        }
    }

    /// Whether `@` mentions are honoured for this type.
    pub fn supports_mentions(self) -> bool {
        matches!(self, MsgType::Text | MsgType::Markdown)
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mention settings (`at` block).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct At {
    /// Mobile numbers of the members to mention
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub at_mobiles: Vec<String>,
    /// Mention everyone in the group
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_at_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub title: String,
    /// Body text; long text is truncated by the client
    pub text: String,
    pub message_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pic_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Markdown {
    pub title: String,
    pub text: String,
}

/// Avatar visibility on an action card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HideAvatar {
    #[default]
    #[serde(rename = "0")]
    Show,
    #[serde(rename = "1")]
    Hide,
}

/// Button layout on an action card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BtnOrientation {
    #[serde(rename = "0")]
    Vertical,
    #[default]
    #[serde(rename = "1")]
    Horizontal,
}

/// Action card message.
///
/// When `single_title`/`single_url` are set the service ignores `btns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCard {
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_title: Option<String>,
    #[serde(rename = "singleURL", skip_serializing_if = "Option::is_none")]
    pub single_url: Option<String>,
    pub hide_avatar: HideAvatar,
    pub btn_orientation: BtnOrientation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub btns: Vec<ActionCardButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCardButton {
    pub title: String,
    #[serde(rename = "actionURL")]
    pub action_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedCard {
    pub links: Vec<FeedCardLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedCardLink {
    pub title: String,
    #[serde(rename = "messageURL")]
    pub message_url: String,
    #[serde(rename = "picURL")]
    pub pic_url: String,
}

/// Message payload, one variant per [`MsgType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(Text),
    Link(Link),
    Markdown(Markdown),
    ActionCard(ActionCard),
    FeedCard(FeedCard),
}

impl Payload {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Payload::Text(_) => MsgType::Text,
            Payload::Link(_) => MsgType::Link,
            Payload::Markdown(_) => MsgType::Markdown,
            Payload::ActionCard(_) => MsgType::ActionCard,
            Payload::FeedCard(_) => MsgType::FeedCard,
        }
    }
}

/// A robot message ready to be modified and sent.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) payload: Payload,
    pub(crate) at: Option<At>,
    pub(crate) reply_target: Option<Outgoing>,
}

impl Message {
    fn from_payload(payload: Payload) -> Self {
        Self {
            payload,
            at: None,
            reply_target: None,
        }
    }

    /// Create a text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_payload(Payload::Text(Text {
            content: content.into(),
        }))
    }

    /// Create a link message. An empty `pic_url` is omitted.
    pub fn link(
        title: impl Into<String>,
        text: impl Into<String>,
        message_url: impl Into<String>,
        pic_url: impl Into<String>,
    ) -> Self {
        Self::from_payload(Payload::Link(Link {
            title: title.into(),
            text: text.into(),
            message_url: message_url.into(),
            pic_url: pic_url.into(),
        }))
    }

    /// Create a markdown message.
    pub fn markdown(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_payload(Payload::Markdown(Markdown {
            title: title.into(),
            text: text.into(),
        }))
    }

    /// Create an action card with avatar shown and horizontal buttons.
    pub fn action_card(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_payload(Payload::ActionCard(ActionCard {
            title: title.into(),
            text: text.into(),
            single_title: None,
            single_url: None,
            hide_avatar: HideAvatar::default(),
            btn_orientation: BtnOrientation::default(),
            btns: Vec::new(),
        }))
    }

    /// Create an empty feed card; links are added with options.
    pub fn feed_card() -> Self {
        Self::from_payload(Payload::FeedCard(FeedCard::default()))
    }

    pub fn msg_type(&self) -> MsgType {
        self.payload.msg_type()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn at(&self) -> Option<&At> {
        self.at.as_ref()
    }

    /// Inbound callback this message replies to, if any.
    pub fn reply_target(&self) -> Option<&Outgoing> {
        self.reply_target.as_ref()
    }

    /// Serialize the request body.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Wire layout: `msgtype`, optional `at`, then the single payload key.
#[derive(Serialize)]
struct WireMessage<'a> {
    msgtype: MsgType,
    #[serde(skip_serializing_if = "Option::is_none")]
    at: Option<&'a At>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    markdown: Option<&'a Markdown>,
    #[serde(rename = "actionCard", skip_serializing_if = "Option::is_none")]
    action_card: Option<&'a ActionCard>,
    #[serde(rename = "feedCard", skip_serializing_if = "Option::is_none")]
    feed_card: Option<&'a FeedCard>,
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut wire = WireMessage {
            msgtype: self.msg_type(),
            at: self.at.as_ref(),
            text: None,
            link: None,
            markdown: None,
            action_card: None,
            feed_card: None,
        };
        match &self.payload {
            Payload::Text(p) => wire.text = Some(p),
            Payload::Link(p) => wire.link = Some(p),
            Payload::Markdown(p) => wire.markdown = Some(p),
            Payload::ActionCard(p) => wire.action_card = Some(p),
            Payload::FeedCard(p) => wire.feed_card = Some(p),
        }
        wire.serialize(serializer)
    }
}
