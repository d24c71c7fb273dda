//! Outgoing callbacks: messages the chat service posts to the robot.
//!
//! When a member `@`-mentions an outgoing-enabled robot, the service calls
//! the robot's HTTP endpoint with the body decoded here. The body carries a
//! short-lived `sessionWebhook` that can be used to reply without signing.

use crate::error::RobotError;
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// A mentioned member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtUser {
    /// Encrypted member id
    #[serde(default, deserialize_with = "null_as_default")]
    pub dingtalk_id: String,
}

/// Text body of an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutgoingText {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// Inbound callback body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Outgoing {
    #[serde(deserialize_with = "null_as_default")]
    pub at_users: Vec<AtUser>,
    /// Encrypted robot id
    #[serde(deserialize_with = "null_as_default")]
    pub chatbot_user_id: String,
    /// Encrypted conversation id
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_id: String,
    /// Group name; only present for group chats
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_title: String,
    /// "1" for one-to-one chats, "2" for group chats
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_type: String,
    /// Message creation time, ms since epoch
    #[serde(deserialize_with = "null_as_default")]
    pub create_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_admin: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_in_at_list: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub msg_id: String,
    /// Inbound message type; only "text" is delivered today
    #[serde(rename = "msgtype", deserialize_with = "null_as_default")]
    pub msg_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub scene_group_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sender_nick: String,
    /// Temporary reply URL
    #[serde(deserialize_with = "null_as_default")]
    pub session_webhook: String,
    /// Expiry of `session_webhook`, ms since epoch
    #[serde(deserialize_with = "null_as_default")]
    pub session_webhook_expired_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub text: OutgoingText,
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Outgoing {
    /// Decode a callback body. Unknown fields are ignored and missing ones
    /// take their defaults.
    pub fn parse(body: &[u8]) -> Result<Self, RobotError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Read and decode a callback body.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, RobotError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::parse(&buffer)
    }

    /// Whether the session webhook is unusable at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.session_webhook_expired_time < now_ms
    }
}
