//! Event bridge: every engine callback becomes exactly one envelope,
//! or is suppressed when its addressee no longer exists.
//!
//! Two callback families, two addressing rules:
//!
//! - **Command outcomes** are addressed with the handle captured at
//!   submission time; the engine contract guarantees the completion
//!   fires exactly once, so no deduplication happens here.
//! - **Push events** carry the emitting instance, not a handle. Each
//!   firing reverse-resolves the instance against the registry; when
//!   resolution fails the object was released and the event is dropped,
//!   because an envelope without a live addressee could only confuse the
//!   host's bookkeeping.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use rtm_core::envelope::Envelope;
use rtm_core::errors::ERR_UNKNOWN_HANDLE;
use rtm_core::handle::{Handle, ObjectKind};
use rtm_core::wire;
use rtm_engine::{
    ChannelNotice, ChannelNotices, EngineResult, RtmChannel, RtmSession, SessionNotice,
    SessionNotices,
};

use crate::registry::HandleRegistry;
use crate::transport::HostTransport;

/// Turns completions and unsolicited notices into outbound envelopes.
#[derive(Clone)]
pub struct EventBridge {
    registry: Arc<HandleRegistry>,
    transport: Arc<dyn HostTransport>,
}

impl EventBridge {
    /// Create an event bridge over the given registry and transport.
    pub fn new(registry: Arc<HandleRegistry>, transport: Arc<dyn HostTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Publish the outcome of one submitted command.
    ///
    /// `handle` was captured at submission time; an engine failure is
    /// relayed verbatim as the outcome's `errorCode`. A completion may
    /// legitimately fire after its handle was released (release raced
    /// with the in-flight call); such an outcome has no addressee and
    /// is suppressed.
    pub fn outcome(
        &self,
        kind: ObjectKind,
        handle: Handle,
        event: &str,
        result: EngineResult<Map<String, Value>>,
    ) {
        if !self.is_live(kind, handle) {
            debug!(%kind, %handle, event, "suppressing outcome, object released");
            return;
        }
        let envelope = match result {
            Ok(payload) => Envelope::outcome_ok(kind, handle, event, payload),
            Err(err) => {
                debug!(%kind, %handle, event, code = err.code, "engine reported failure");
                Envelope::outcome_err(kind, handle, event, err.code)
            }
        };
        self.transport.deliver(envelope);
    }

    fn is_live(&self, kind: ObjectKind, handle: Handle) -> bool {
        match kind {
            ObjectKind::Session => self.registry.resolve_session(handle).is_some(),
            ObjectKind::Channel => self.registry.resolve_channel(handle).is_some(),
        }
    }

    /// Publish the unknown-handle outcome for a command whose primary
    /// handle did not resolve, addressed to the *requested* handle so
    /// the host's pending-command bookkeeping is never left waiting.
    pub fn unknown_handle(&self, kind: ObjectKind, handle: Handle, event: &str) {
        warn!(%kind, %handle, event, "command names an unknown handle");
        self.transport
            .deliver(Envelope::outcome_err(kind, handle, event, ERR_UNKNOWN_HANDLE));
    }

    /// Start the pump task forwarding one session's unsolicited notices.
    pub(crate) fn spawn_session_pump(
        &self,
        instance: Arc<dyn RtmSession>,
        mut notices: SessionNotices,
    ) {
        let bridge = self.clone();
        let _task = tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                let Some(handle) = bridge.registry.reverse_resolve_session(&instance) else {
                    debug!("suppressing session event, object released");
                    continue;
                };
                let (event, payload) = session_notice_wire(&notice);
                bridge
                    .transport
                    .deliver(Envelope::push(ObjectKind::Session, handle, event, payload));
            }
        });
    }

    /// Start the pump task forwarding one channel's unsolicited notices.
    ///
    /// The task ends when the engine closes the notice stream (release).
    pub(crate) fn spawn_channel_pump(
        &self,
        instance: Arc<dyn RtmChannel>,
        mut notices: ChannelNotices,
    ) {
        let bridge = self.clone();
        let _task = tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                let Some(handle) = bridge.registry.reverse_resolve_channel(&instance) else {
                    debug!("suppressing channel event, object released");
                    continue;
                };
                let (event, payload) = channel_notice_wire(&notice);
                bridge
                    .transport
                    .deliver(Envelope::push(ObjectKind::Channel, handle, event, payload));
            }
        });
    }
}

// ── Notice → wire mapping ───────────────────────────────────────────

fn session_notice_wire(notice: &SessionNotice) -> (&'static str, Map<String, Value>) {
    let mut payload = Map::new();
    match notice {
        SessionNotice::ConnectionStateChanged { state, reason } => {
            let _ = payload.insert("state".into(), Value::from(*state));
            let _ = payload.insert("reason".into(), Value::from(*reason));
            (wire::ON_CONNECTION_STATE_CHANGED, payload)
        }
        SessionNotice::MessageReceived { message, peer_id } => {
            let _ = payload.insert(
                "message".into(),
                serde_json::to_value(message).unwrap_or_default(),
            );
            let _ = payload.insert("peerId".into(), Value::from(peer_id.clone()));
            (wire::ON_MESSAGE_RECEIVED, payload)
        }
        SessionNotice::TokenExpired => (wire::ON_TOKEN_EXPIRED, payload),
    }
}

fn channel_notice_wire(notice: &ChannelNotice) -> (&'static str, Map<String, Value>) {
    let mut payload = Map::new();
    match notice {
        ChannelNotice::MemberJoined { member } => {
            let _ = payload.insert(
                "member".into(),
                serde_json::to_value(member).unwrap_or_default(),
            );
            (wire::ON_MEMBER_JOINED, payload)
        }
        ChannelNotice::MemberLeft { member } => {
            let _ = payload.insert(
                "member".into(),
                serde_json::to_value(member).unwrap_or_default(),
            );
            (wire::ON_MEMBER_LEFT, payload)
        }
        ChannelNotice::MessageReceived { message, member } => {
            let _ = payload.insert(
                "message".into(),
                serde_json::to_value(message).unwrap_or_default(),
            );
            let _ = payload.insert(
                "member".into(),
                serde_json::to_value(member).unwrap_or_default(),
            );
            (wire::ON_CHANNEL_MESSAGE_RECEIVED, payload)
        }
    }
}
