//! Group robot client.
//!
//! [`Robot`] turns a [`Message`] into one signed webhook call and interprets
//! the service's `{errcode, errmsg}` reply. Messages are built with the
//! `send_*` helpers and adjusted with [`RobotOption`]s.

mod message;
mod options;
mod outgoing;
mod sign;
mod transport;

pub use message::{
    ActionCard, ActionCardButton, At, BtnOrientation, FeedCard, FeedCardLink, HideAvatar, Link,
    Markdown, Message, MsgType, Payload, Text,
};
pub use options::RobotOption;
pub use outgoing::{AtUser, Outgoing, OutgoingText};
pub use sign::sign;
pub use transport::{HttpTransport, Transport, TransportConfig};

use crate::error::{RobotError, TransportError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

/// Default send API used with access-token robots.
pub const DEFAULT_API_BASE: &str = "https://oapi.dingtalk.com/robot/send";

/// Where messages for a robot are posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Full webhook URL with the token embedded, e.g.
    /// `https://oapi.dingtalk.com/robot/send?access_token=xxx`
    Webhook(String),
    /// Send API plus token, appended as `access_token`
    AccessToken { api_base: String, token: String },
}

impl Endpoint {
    /// The endpoint URL as configured, with `access_token` appended for
    /// token addressing. The configured string is validated but not
    /// normalized.
    fn base_url(&self) -> Result<String, RobotError> {
        match self {
            Endpoint::Webhook(webhook) => {
                Url::parse(webhook)?;
                Ok(webhook.clone())
            }
            Endpoint::AccessToken { api_base, token } => {
                Url::parse(api_base)?;
                Ok(append_query(api_base, &[("access_token", token.as_str())]))
            }
        }
    }
}

/// Append form-encoded pairs to `base`, keeping the existing text intact.
fn append_query(base: &str, pairs: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}{}", base, separator, query)
}

/// Service reply envelope. A missing `errcode` counts as success.
#[derive(Debug, Deserialize)]
struct RobotResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Group robot handle.
///
/// Holds no per-call state; clones share the transport.
#[derive(Clone)]
pub struct Robot {
    endpoint: Endpoint,
    secret: Option<String>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Robot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Robot")
            .field("endpoint", &self.endpoint)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl Robot {
    /// Create a robot posting through `transport`.
    pub fn new(endpoint: Endpoint, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            secret: None,
            transport,
        }
    }

    /// Create a robot for a webhook URL with the default HTTP transport.
    pub fn from_webhook(webhook: impl Into<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(TransportConfig::default())?;
        Ok(Self::new(Endpoint::Webhook(webhook.into()), Arc::new(transport)))
    }

    /// Create a robot for an access token with the default HTTP transport.
    pub fn from_access_token(token: impl Into<String>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(TransportConfig::default())?;
        let endpoint = Endpoint::AccessToken {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
        };
        Ok(Self::new(endpoint, Arc::new(transport)))
    }

    pub fn set_webhook(&mut self, webhook: impl Into<String>) -> &mut Self {
        self.endpoint = Endpoint::Webhook(webhook.into());
        self
    }

    /// Switch to token addressing, keeping the current API base if any.
    pub fn set_access_token(&mut self, token: impl Into<String>) -> &mut Self {
        let api_base = match &self.endpoint {
            Endpoint::AccessToken { api_base, .. } => api_base.clone(),
            Endpoint::Webhook(_) => DEFAULT_API_BASE.to_string(),
        };
        self.endpoint = Endpoint::AccessToken {
            api_base,
            token: token.into(),
        };
        self
    }

    /// Set the signing secret. An empty secret disables signing.
    pub fn set_secret(&mut self, secret: impl Into<String>) -> &mut Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send a text message.
    pub async fn send_text(
        &self,
        content: impl Into<String>,
        options: impl IntoIterator<Item = RobotOption>,
    ) -> Result<(), RobotError> {
        self.send_with(Message::text(content), options).await
    }

    /// Send a link message. An empty `pic_url` is omitted.
    pub async fn send_link(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        message_url: impl Into<String>,
        pic_url: impl Into<String>,
        options: impl IntoIterator<Item = RobotOption>,
    ) -> Result<(), RobotError> {
        let message = Message::link(title, text, message_url, pic_url);
        self.send_with(message, options).await
    }

    /// Send a markdown message.
    pub async fn send_markdown(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        options: impl IntoIterator<Item = RobotOption>,
    ) -> Result<(), RobotError> {
        self.send_with(Message::markdown(title, text), options).await
    }

    /// Send an action card.
    pub async fn send_action_card(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        options: impl IntoIterator<Item = RobotOption>,
    ) -> Result<(), RobotError> {
        self.send_with(Message::action_card(title, text), options).await
    }

    /// Send a feed card built from `AddFeedLink` options.
    pub async fn send_feed_card(
        &self,
        options: impl IntoIterator<Item = RobotOption>,
    ) -> Result<(), RobotError> {
        self.send_with(Message::feed_card(), options).await
    }

    async fn send_with(
        &self,
        mut message: Message,
        options: impl IntoIterator<Item = RobotOption>,
    ) -> Result<(), RobotError> {
        message.apply_options(options);
        self.send(&message).await
    }

    /// Send a prepared message.
    pub async fn send(&self, message: &Message) -> Result<(), RobotError> {
        self.send_at(message, chrono::Utc::now().timestamp_millis()).await
    }

    pub(crate) async fn send_at(&self, message: &Message, now_ms: i64) -> Result<(), RobotError> {
        let body = message.to_json()?;
        let url = self.target_url(message.reply_target(), now_ms)?;

        debug!(
            msgtype = %message.msg_type(),
            reply = message.reply_target().is_some(),
            "Sending robot message"
        );

        let data = self.transport.post(&url, body).await?;
        let response: RobotResponse = serde_json::from_slice(&data)?;
        if response.errcode != 0 {
            warn!(
                errcode = response.errcode,
                errmsg = %response.errmsg,
                "Robot message rejected"
            );
            return Err(RobotError::Rejected {
                code: response.errcode,
                message: response.errmsg,
            });
        }

        Ok(())
    }

    /// Resolve the URL a message is posted to.
    ///
    /// A live reply target wins and is used verbatim. Otherwise the robot's
    /// endpoint is used, signed when a secret is set.
    pub(crate) fn target_url(
        &self,
        reply_target: Option<&Outgoing>,
        now_ms: i64,
    ) -> Result<String, RobotError> {
        if let Some(og) = reply_target.filter(|og| !og.session_webhook.is_empty()) {
            if og.is_expired_at(now_ms) {
                warn!(
                    expired_at = og.session_webhook_expired_time,
                    "Reply target session webhook expired"
                );
                return Err(RobotError::ReplyTargetExpired {
                    expired_at: og.session_webhook_expired_time,
                });
            }
            return Ok(og.session_webhook.clone());
        }

        let url = self.endpoint.base_url()?;
        match self.secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => {
                let timestamp = now_ms.to_string();
                let signature = sign(now_ms, secret);
                Ok(append_query(
                    &url,
                    &[("timestamp", timestamp.as_str()), ("sign", signature.as_str())],
                ))
            }
            None => Ok(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    const WEBHOOK: &str = "https://oapi.dingtalk.com/robot/send?access_token=abc";
    const SESSION: &str =
        "https://oapi.dingtalk.com/robot/sendBySession?session=eb18e18e8669b0a3cd7dff1388fe5e6a";

    /// Records posted requests and replies with a canned body.
    struct RecordingTransport {
        reply: Result<Vec<u8>, Duration>,
        calls: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl RecordingTransport {
        fn replying(body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body.as_bytes().to_vec()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn timing_out() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(Duration::from_secs(2)),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<u8>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().push((url.to_string(), body));
            match &self.reply {
                Ok(body) => Ok(body.clone()),
                Err(timeout) => Err(TransportError::Timeout(*timeout)),
            }
        }
    }

    fn robot(transport: Arc<RecordingTransport>) -> Robot {
        Robot::new(Endpoint::Webhook(WEBHOOK.to_string()), transport)
    }

    fn reply_target(expired_at: i64) -> Outgoing {
        Outgoing {
            session_webhook: SESSION.to_string(),
            session_webhook_expired_time: expired_at,
            ..Default::default()
        }
    }

    fn query_keys(url: &str) -> Vec<String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, _)| k.into_owned())
            .collect()
    }

    #[test]
    fn test_target_url_unsigned_webhook() {
        let robot = robot(RecordingTransport::replying("{}"));
        assert_eq!(robot.target_url(None, 1).unwrap(), WEBHOOK);
    }

    #[test]
    fn test_target_url_signed() {
        let mut robot = robot(RecordingTransport::replying("{}"));
        robot.set_secret("SEC8a9fc6f36f447d7c497f8c8e08accde4c49b4b5a366fa3903f47e250d6746979");

        let url = robot.target_url(None, 1612172996026).unwrap();
        assert_eq!(
            url,
            format!(
                "{}&timestamp=1612172996026&sign=%2FhVashZiXp9FM7TxATe7Un%2B74AxwL9CxC6fhBIDcPpA%3D",
                WEBHOOK
            )
        );
        assert_eq!(query_keys(&url), vec!["access_token", "timestamp", "sign"]);
    }

    #[test]
    fn test_target_url_empty_secret_is_unsigned() {
        let mut robot = robot(RecordingTransport::replying("{}"));
        robot.set_secret("");
        assert_eq!(robot.target_url(None, 1).unwrap(), WEBHOOK);
    }

    #[test]
    fn test_target_url_access_token() {
        let mut robot = robot(RecordingTransport::replying("{}"));
        robot.set_access_token("tok");
        assert_eq!(
            robot.target_url(None, 1).unwrap(),
            "https://oapi.dingtalk.com/robot/send?access_token=tok"
        );

        robot.set_secret("secret");
        let url = robot.target_url(None, 1700000000000).unwrap();
        assert_eq!(query_keys(&url), vec!["access_token", "timestamp", "sign"]);
        assert!(url.contains("sign=OuzzJR5%2BxZ4%2FEYwqtNt6sMYZQMTa%2FHEGvc9miJe7XzY%3D"));
    }

    #[test]
    fn test_target_url_live_reply_target() {
        let mut robot = robot(RecordingTransport::replying("{}"));
        robot.set_secret("secret");
        let og = reply_target(2000);
        assert_eq!(robot.target_url(Some(&og), 2000).unwrap(), SESSION);
    }

    #[test]
    fn test_target_url_reply_target_without_webhook() {
        let robot = robot(RecordingTransport::replying("{}"));
        let og = Outgoing::default();
        assert_eq!(robot.target_url(Some(&og), 5).unwrap(), WEBHOOK);
    }

    #[test]
    fn test_target_url_keeps_webhook_verbatim() {
        let webhook = "https://OAPI.dingtalk.com:443/robot/send?access_token=a b";
        let robot = Robot::new(
            Endpoint::Webhook(webhook.to_string()),
            RecordingTransport::replying("{}"),
        );
        assert_eq!(robot.target_url(None, 1).unwrap(), webhook);
    }

    #[test]
    fn test_target_url_signed_without_query() {
        let mut robot = Robot::new(
            Endpoint::Webhook("https://example.com".to_string()),
            RecordingTransport::replying("{}"),
        );
        robot.set_secret("secret");
        assert_eq!(
            robot.target_url(None, 1700000000001).unwrap(),
            "https://example.com?timestamp=1700000000001&sign=dycYwoGVgpVv3mP3qhjBsD7wPlevLM8sebujic6mSdE%3D"
        );
    }

    #[test]
    fn test_append_query_separators() {
        assert_eq!(append_query("https://a/s", &[("k", "v")]), "https://a/s?k=v");
        assert_eq!(append_query("https://a/s?", &[("k", "v")]), "https://a/s?k=v");
        assert_eq!(append_query("https://a/s?x=1", &[("k", "a+b")]), "https://a/s?x=1&k=a%2Bb");
    }

    #[test]
    fn test_target_url_invalid_webhook() {
        let transport = RecordingTransport::replying("{}");
        let robot = Robot::new(Endpoint::Webhook("your_robot_webhook".to_string()), transport);
        assert!(matches!(
            robot.target_url(None, 1),
            Err(RobotError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_send_text_success() {
        let transport = RecordingTransport::replying(r#"{"errcode":0,"errmsg":""}"#);
        let robot = robot(transport.clone());

        robot.send_text("hi", []).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, WEBHOOK);
        assert_eq!(
            String::from_utf8(calls[0].1.clone()).unwrap(),
            r#"{"msgtype":"text","text":{"content":"hi"}}"#
        );
    }

    #[tokio::test]
    async fn test_send_remote_rejection() {
        let transport = RecordingTransport::replying(r#"{"errcode":1,"errmsg":"boom"}"#);
        let robot = robot(transport);

        let err = robot.send_text("hi", []).await.unwrap_err();
        assert!(matches!(err, RobotError::Rejected { code: 1, .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_send_missing_errcode_is_success() {
        let transport = RecordingTransport::replying(r#"{"errmsg":"ok"}"#);
        robot(transport.clone()).send_text("hi", []).await.unwrap();

        let transport = RecordingTransport::replying("{}");
        robot(transport.clone()).send_text("hi", []).await.unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_send_undecodable_response() {
        let robot = robot(RecordingTransport::replying("<html>502</html>"));
        let err = robot.send_markdown("t", "b", []).await.unwrap_err();
        assert!(matches!(err, RobotError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_send_transport_error_propagates() {
        let transport = RecordingTransport::timing_out();
        let robot = robot(transport.clone());

        let err = robot.send_feed_card([]).await.unwrap_err();
        assert!(matches!(
            err,
            RobotError::Transport(TransportError::Timeout(_))
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_send_expired_reply_target_skips_network() {
        let transport = RecordingTransport::replying(r#"{"errcode":0,"errmsg":""}"#);
        let robot = robot(transport.clone());
        let message = Message::text("late").with(RobotOption::reply_to(reply_target(999)));

        let err = robot.send_at(&message, 1000).await.unwrap_err();
        assert!(matches!(
            err,
            RobotError::ReplyTargetExpired { expired_at: 999 }
        ));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_send_live_reply_target() {
        let transport = RecordingTransport::replying(r#"{"errcode":0,"errmsg":"ok"}"#);
        let mut robot = robot(transport.clone());
        robot.set_secret("secret");
        let message = Message::text("callback").with(RobotOption::reply_to(reply_target(5000)));

        robot.send_at(&message, 1000).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].0, SESSION);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&calls[0].1).unwrap(),
            serde_json::json!({"msgtype": "text", "text": {"content": "callback"}})
        );
    }

    #[tokio::test]
    async fn test_send_action_card_with_options() {
        let transport = RecordingTransport::replying(r#"{"errcode":0}"#);
        let robot = robot(transport.clone());

        robot
            .send_action_card(
                "card",
                "body",
                [
                    RobotOption::add_button("yes", "https://a/y"),
                    RobotOption::add_button("no", "https://a/n"),
                    RobotOption::BtnOrientation(BtnOrientation::Vertical),
                    RobotOption::AtAll,
                ],
            )
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_slice(&transport.calls()[0].1).unwrap();
        assert!(body.get("at").is_none());
        assert_eq!(body["actionCard"]["btnOrientation"], "0");
        assert_eq!(body["actionCard"]["btns"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_default_transport_constructors() {
        let robot = Robot::from_webhook(WEBHOOK).unwrap();
        assert_eq!(robot.endpoint(), &Endpoint::Webhook(WEBHOOK.to_string()));

        let robot = Robot::from_access_token("tok").unwrap();
        assert_eq!(
            robot.target_url(None, 1).unwrap(),
            format!("{}?access_token=tok", DEFAULT_API_BASE)
        );
    }

    #[test]
    fn test_set_webhook_replaces_token_endpoint() {
        let mut robot = Robot::from_access_token("tok").unwrap();
        robot.set_webhook(WEBHOOK);
        assert_eq!(robot.target_url(None, 1).unwrap(), WEBHOOK);
    }

    #[test]
    fn test_debug_masks_secret() {
        let mut robot = robot(RecordingTransport::replying("{}"));
        robot.set_secret("top-secret");
        let debug = format!("{:?}", robot);
        assert!(!debug.contains("top-secret"));
    }
}
