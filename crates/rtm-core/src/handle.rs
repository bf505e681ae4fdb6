//! Host-visible integer identity for engine objects.
//!
//! Engine sessions and channels have no identity of their own; the bridge
//! assigns each a [`Handle`] at creation and addresses every outbound
//! envelope with it. Handles are scoped per [`ObjectKind`], allocated
//! monotonically from 0, and never reused, so a stale completion can
//! never be misattributed to a newer object occupying the same slot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer identity of one engine object, unique within its kind for the
/// lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub i64);

impl Handle {
    /// Sentinel produced when an argument bag carries no usable handle.
    ///
    /// Never allocated, so it can never resolve; commands naming it fail
    /// with the unknown-handle outcome.
    pub const INVALID: Handle = Handle(-1);

    /// Whether this handle could have been allocated by the registry.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for Handle {
    fn from(raw: i64) -> Self {
        Handle(raw)
    }
}

/// The two independent object kinds the registry tracks.
///
/// Wire discriminators (the `obj` envelope field) are the class tags the
/// host protocol was built around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// One logical connection to the messaging engine.
    #[serde(rename = "AgoraRtmClient")]
    Session,
    /// One logical channel-membership scope.
    #[serde(rename = "AgoraRtmChannel")]
    Channel,
}

impl ObjectKind {
    /// Wire discriminator string for the `obj` envelope field.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Session => "AgoraRtmClient",
            Self::Channel => "AgoraRtmChannel",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handle_serializes_as_bare_integer() {
        assert_eq!(serde_json::to_value(Handle(3)).unwrap(), json!(3));
        let back: Handle = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(back, Handle(7));
    }

    #[test]
    fn invalid_handle_is_not_valid() {
        assert!(!Handle::INVALID.is_valid());
        assert_eq!(Handle::INVALID.0, -1);
    }

    #[test]
    fn allocated_range_is_valid() {
        assert!(Handle(0).is_valid());
        assert!(Handle(i64::MAX).is_valid());
        assert!(!Handle(-2).is_valid());
    }

    #[test]
    fn kind_wire_strings() {
        assert_eq!(ObjectKind::Session.as_wire(), "AgoraRtmClient");
        assert_eq!(ObjectKind::Channel.as_wire(), "AgoraRtmChannel");
    }

    #[test]
    fn kind_serializes_to_wire_string() {
        assert_eq!(
            serde_json::to_value(ObjectKind::Session).unwrap(),
            json!("AgoraRtmClient")
        );
        assert_eq!(
            serde_json::to_value(ObjectKind::Channel).unwrap(),
            json!("AgoraRtmChannel")
        );
    }

    #[test]
    fn kind_display_matches_wire() {
        assert_eq!(ObjectKind::Session.to_string(), "AgoraRtmClient");
        assert_eq!(ObjectKind::Channel.to_string(), "AgoraRtmChannel");
    }

    #[test]
    fn handle_display() {
        assert_eq!(Handle(5).to_string(), "5");
        assert_eq!(Handle::INVALID.to_string(), "-1");
    }
}
