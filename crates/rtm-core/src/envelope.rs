//! Outbound envelopes and immediate replies.
//!
//! Everything the host receives is one of two shapes:
//!
//! - **[`Reply`]**: the direct answer to a synchronous command (a handle
//!   integer for creation, a boolean for release). Async commands reply
//!   `Accepted`; their terminal result arrives later as an envelope.
//! - **[`Envelope`]**: a self-addressed asynchronous outcome or push
//!   event, always tagged with `obj` (object-kind discriminator) and
//!   `objIndex` (handle) alongside the event-specific payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ERR_OK;
use crate::handle::{Handle, ObjectKind};

/// Self-addressed outbound message carrying object kind, handle, and an
/// event-specific payload.
///
/// Serializes flat: `{"event": ..., "obj": ..., "objIndex": ...,
/// "errorCode": ..., <payload keys>}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name; for command outcomes this is the command's wire name.
    pub event: String,
    /// Object-kind discriminator.
    pub obj: ObjectKind,
    /// Handle of the originating (or requested) object.
    #[serde(rename = "objIndex")]
    pub obj_index: Handle,
    /// Outcome code: 0 for success, engine code or reserved negative
    /// code for failure. Absent on push events.
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    /// Event-specific payload keys, flattened into the envelope.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Build a successful command-outcome envelope.
    pub fn outcome_ok(
        kind: ObjectKind,
        handle: Handle,
        event: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            event: event.into(),
            obj: kind,
            obj_index: handle,
            error_code: Some(ERR_OK),
            payload,
        }
    }

    /// Build a failed command-outcome envelope with the given code.
    pub fn outcome_err(kind: ObjectKind, handle: Handle, event: impl Into<String>, code: i32) -> Self {
        Self {
            event: event.into(),
            obj: kind,
            obj_index: handle,
            error_code: Some(code),
            payload: Map::new(),
        }
    }

    /// Build a push-event envelope (no outcome code).
    pub fn push(
        kind: ObjectKind,
        handle: Handle,
        event: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            event: event.into(),
            obj: kind,
            obj_index: handle,
            error_code: None,
            payload,
        }
    }
}

/// Direct reply to one inbound command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Creation reply: the new handle, or [`Handle::INVALID`] when the
    /// engine failed to construct the object.
    Handle(Handle),
    /// Release reply: whether the handle named a live channel.
    Released(bool),
    /// Command accepted; the outcome arrives as an [`Envelope`].
    Accepted,
    /// The command name matched no known operation.
    Unhandled,
}

impl Reply {
    /// Wire value of the reply, if the command has one.
    ///
    /// `Accepted` and `Unhandled` carry no value: the former resolves
    /// through an envelope, the latter is surfaced by the transport as a
    /// method-not-found condition.
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Handle(handle) => Some(Value::from(handle.0)),
            Self::Released(released) => Some(Value::from(*released)),
            Self::Accepted | Self::Unhandled => None,
        }
    }
}
