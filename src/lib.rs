//! DingTalk group robot client library.
//!
//! Builds typed robot messages (text, link, markdown, action card, feed
//! card), signs requests for secured robots, posts them to the robot
//! webhook and decodes inbound outgoing-callback bodies.

pub mod cli;
pub mod config;
pub mod error;
pub mod robot;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, RobotError, TransportError};
pub use robot::{Endpoint, Message, MsgType, Outgoing, Robot, RobotOption, Transport};
