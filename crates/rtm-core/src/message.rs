//! Wire data types shared by commands, outcomes, and push events.

use serde::{Deserialize, Serialize};

/// Body of one point-to-point or channel message.
///
/// The host protocol carries messages as `{ "text": ... }` maps; a
/// malformed or missing body degrades to an empty text rather than
/// rejecting the command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Text payload.
    #[serde(default)]
    pub text: String,
}

impl MessageBody {
    /// Create a message body from text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One member of a channel, as reported by membership events and
/// `getMembers` outcomes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMember {
    /// User identity within the engine.
    pub user_id: String,
    /// Channel the membership belongs to.
    pub channel_id: String,
}

/// One key/value attribute of the local or a remote user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}
