//! Message options.
//!
//! Options are applied in order to a message in progress. Each one only
//! touches the message types it makes sense for; applied to any other
//! type it does nothing, so one option list can be passed to every send
//! call.

use super::message::{
    ActionCardButton, At, BtnOrientation, FeedCardLink, HideAvatar, Message, Payload,
};
use super::outgoing::Outgoing;

/// A modification applied to a [`Message`] before it is sent.
#[derive(Debug, Clone)]
pub enum RobotOption {
    /// Mention everyone. Text and markdown only.
    AtAll,
    /// Mention members by mobile number, replacing any earlier list.
    /// Text and markdown only.
    AtMobiles(Vec<String>),
    /// Action card only.
    HideAvatar(HideAvatar),
    /// Action card only.
    BtnOrientation(BtnOrientation),
    /// Whole-card jump button. Action card only.
    SingleButton { title: String, url: String },
    /// Append an independent jump button. Action card only.
    AddButton { title: String, url: String },
    /// Append a feed entry. Feed card only.
    AddFeedLink {
        title: String,
        message_url: String,
        pic_url: String,
    },
    /// Reply through an inbound callback's session webhook.
    ReplyTo(Box<Outgoing>),
}

impl RobotOption {
    pub fn at_mobiles<I, S>(mobiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RobotOption::AtMobiles(mobiles.into_iter().map(Into::into).collect())
    }

    pub fn single_button(title: impl Into<String>, url: impl Into<String>) -> Self {
        RobotOption::SingleButton {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn add_button(title: impl Into<String>, url: impl Into<String>) -> Self {
        RobotOption::AddButton {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn add_feed_link(
        title: impl Into<String>,
        message_url: impl Into<String>,
        pic_url: impl Into<String>,
    ) -> Self {
        RobotOption::AddFeedLink {
            title: title.into(),
            message_url: message_url.into(),
            pic_url: pic_url.into(),
        }
    }

    pub fn reply_to(outgoing: Outgoing) -> Self {
        RobotOption::ReplyTo(Box::new(outgoing))
    }

    /// Apply this option to `message`.
    pub fn apply(self, message: &mut Message) {
        match self {
            RobotOption::AtAll => {
                if let Some(at) = mention_block(message) {
                    at.is_at_all = true;
                }
            }
            RobotOption::AtMobiles(mobiles) => {
                if let Some(at) = mention_block(message) {
                    at.at_mobiles = mobiles;
                }
            }
            RobotOption::HideAvatar(value) => {
                if let Payload::ActionCard(card) = &mut message.payload {
                    card.hide_avatar = value;
                }
            }
            RobotOption::BtnOrientation(value) => {
                if let Payload::ActionCard(card) = &mut message.payload {
                    card.btn_orientation = value;
                }
            }
            RobotOption::SingleButton { title, url } => {
                if let Payload::ActionCard(card) = &mut message.payload {
                    card.single_title = Some(title);
                    card.single_url = Some(url);
                }
            }
            RobotOption::AddButton { title, url } => {
                if let Payload::ActionCard(card) = &mut message.payload {
                    card.btns.push(ActionCardButton {
                        title,
                        action_url: url,
                    });
                }
            }
            RobotOption::AddFeedLink {
                title,
                message_url,
                pic_url,
            } => {
                if let Payload::FeedCard(feed) = &mut message.payload {
                    feed.links.push(FeedCardLink {
                        title,
                        message_url,
                        pic_url,
                    });
                }
            }
            RobotOption::ReplyTo(outgoing) => {
                message.reply_target = Some(*outgoing);
            }
        }
    }
}

/// The message's `at` block, created on demand, or `None` when the type
/// does not support mentions.
fn mention_block(message: &mut Message) -> Option<&mut At> {
    if !message.msg_type().supports_mentions() {
        return None;
    }
    Some(message.at.get_or_insert_with(At::default))
}

impl Message {
    /// Apply one option and return the message.
    pub fn with(mut self, option: RobotOption) -> Self {
        option.apply(&mut self);
        self
    }

    /// Apply options in order.
    pub fn apply_options(&mut self, options: impl IntoIterator<Item = RobotOption>) {
        for option in options {
            option.apply(self);
        }
    }
}
