//! Command dispatcher: one decoded command in, one outcome out.
//!
//! Every inbound request is decoded once into the closed
//! [`Command`] enum, its primary handle is resolved against the
//! registry, and the engine operation is submitted with a completion
//! bound to the handle captured here. The uniform rules:
//!
//! - Unresolvable primary handle → one unknown-handle envelope addressed
//!   to the *requested* handle, no engine call.
//! - Async operations return [`Reply::Accepted`] immediately; the
//!   terminal result arrives as an envelope when the engine completes.
//! - Creation commands are synchronous at the registry level and reply
//!   with the new handle, or [`Handle::INVALID`] when construction
//!   fails (including a construction panic, which is caught here and
//!   never crosses the bridge boundary).
//! - Channel release is synchronous: the mapping is removed first, so
//!   in-flight completions and pending notices find no addressee and
//!   are suppressed; then the engine releases native resources before
//!   the boolean reply is returned.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use rtm_core::command::{Command, CommandRequest};
use rtm_core::envelope::Reply;
use rtm_core::handle::{Handle, ObjectKind};
use rtm_core::message::UserAttribute;
use rtm_core::wire;
use rtm_engine::{EngineResult, RtmChannel, RtmEngine, RtmSession};

use crate::events::EventBridge;
use crate::registry::HandleRegistry;
use crate::transport::HostTransport;

/// The bridge facade: registry, dispatcher, and event bridge wired to
/// one engine and one outbound transport.
///
/// [`dispatch`](Self::dispatch) must run inside a Tokio runtime; async
/// completions are handled in spawned tasks.
pub struct RtmBridge {
    engine: Arc<dyn RtmEngine>,
    registry: Arc<HandleRegistry>,
    events: EventBridge,
}

impl RtmBridge {
    /// Wire a bridge to an engine and an outbound transport.
    pub fn new(engine: Arc<dyn RtmEngine>, transport: Arc<dyn HostTransport>) -> Self {
        let registry = Arc::new(HandleRegistry::new());
        let events = EventBridge::new(Arc::clone(&registry), transport);
        Self {
            engine,
            registry,
            events,
        }
    }

    /// The handle registry backing this bridge.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Decode and dispatch one raw host request.
    pub fn handle_request(&self, request: &CommandRequest) -> Reply {
        match Command::parse(request) {
            Ok(command) => {
                debug!(command = command.name(), "dispatching command");
                self.dispatch(command)
            }
            Err(err) => {
                warn!(error = %err, "rejecting inbound request");
                Reply::Unhandled
            }
        }
    }

    /// Dispatch one decoded command.
    pub fn dispatch(&self, command: Command) -> Reply {
        match command {
            // ── Creation (synchronous at the registry level) ────────
            Command::CreateSession { app_id } => self.create_session(&app_id),
            Command::CreateChannel {
                session,
                channel_id,
            } => self.create_channel(session, &channel_id),

            // ── Session operations ──────────────────────────────────
            Command::Login {
                session,
                token,
                user_id,
            } => self.submit_session_op(session, wire::LOGIN, move |s| {
                Box::pin(async move {
                    s.login(token.as_deref(), &user_id).await?;
                    Ok(Map::new())
                })
            }),
            Command::Logout { session } => {
                self.submit_session_op(session, wire::LOGOUT, move |s| {
                    Box::pin(async move {
                        s.logout().await?;
                        Ok(Map::new())
                    })
                })
            }
            Command::QueryPeersOnlineStatus { session, peer_ids } => {
                self.submit_session_op(session, wire::QUERY_PEERS_ONLINE_STATUS, move |s| {
                    Box::pin(async move {
                        let status = s.query_peers_online_status(&peer_ids).await?;
                        let mut payload = Map::new();
                        let _ = payload.insert(
                            "results".into(),
                            serde_json::to_value(status).unwrap_or_default(),
                        );
                        Ok(payload)
                    })
                })
            }
            Command::SendMessageToPeer {
                session,
                peer_id,
                message,
            } => self.submit_session_op(session, wire::SEND_MESSAGE_TO_PEER, move |s| {
                Box::pin(async move {
                    s.send_message_to_peer(&peer_id, &message).await?;
                    Ok(Map::new())
                })
            }),

            // ── Channel operations ──────────────────────────────────
            Command::JoinChannel { channel } => {
                self.submit_channel_op(channel, wire::CHANNEL_JOIN, move |ch| {
                    Box::pin(async move {
                        ch.join().await?;
                        Ok(Map::new())
                    })
                })
            }
            Command::LeaveChannel { channel } => {
                self.submit_channel_op(channel, wire::CHANNEL_LEAVE, move |ch| {
                    Box::pin(async move {
                        ch.leave().await?;
                        Ok(Map::new())
                    })
                })
            }
            Command::SendChannelMessage {
                channel,
                session,
                message,
            } => {
                // The session constructs the message; without it the
                // send cannot proceed, and the failure is addressed to
                // the channel the host issued the command against.
                if self.registry.resolve_session(session).is_none() {
                    self.events
                        .unknown_handle(ObjectKind::Channel, channel, wire::CHANNEL_SEND_MESSAGE);
                    return Reply::Accepted;
                }
                self.submit_channel_op(channel, wire::CHANNEL_SEND_MESSAGE, move |ch| {
                    Box::pin(async move {
                        ch.send_message(&message).await?;
                        Ok(Map::new())
                    })
                })
            }
            Command::GetMembers { channel } => {
                self.submit_channel_op(channel, wire::CHANNEL_GET_MEMBERS, move |ch| {
                    Box::pin(async move {
                        let members = ch.members().await?;
                        let mut payload = Map::new();
                        let _ = payload.insert(
                            "members".into(),
                            serde_json::to_value(members).unwrap_or_default(),
                        );
                        Ok(payload)
                    })
                })
            }
            Command::ReleaseChannel { channel } => self.release_channel(channel),

            // ── User attributes ─────────────────────────────────────
            Command::SetLocalUserAttributes {
                session,
                attributes,
            } => self.submit_session_op(session, wire::SET_LOCAL_USER_ATTRIBUTES, move |s| {
                Box::pin(async move {
                    s.set_local_user_attributes(&attributes).await?;
                    Ok(Map::new())
                })
            }),
            Command::AddOrUpdateLocalUserAttributes {
                session,
                attributes,
            } => self.submit_session_op(
                session,
                wire::ADD_OR_UPDATE_LOCAL_USER_ATTRIBUTES,
                move |s| {
                    Box::pin(async move {
                        s.add_or_update_local_user_attributes(&attributes).await?;
                        Ok(Map::new())
                    })
                },
            ),
            Command::DeleteLocalUserAttributesByKeys { session, keys } => self.submit_session_op(
                session,
                wire::DELETE_LOCAL_USER_ATTRIBUTES_BY_KEYS,
                move |s| {
                    Box::pin(async move {
                        s.delete_local_user_attributes_by_keys(&keys).await?;
                        Ok(Map::new())
                    })
                },
            ),
            Command::ClearLocalUserAttributes { session } => {
                self.submit_session_op(session, wire::CLEAR_LOCAL_USER_ATTRIBUTES, move |s| {
                    Box::pin(async move {
                        s.clear_local_user_attributes().await?;
                        Ok(Map::new())
                    })
                })
            }
            Command::GetUserAttributes { session, user_id } => {
                self.submit_session_op(session, wire::GET_USER_ATTRIBUTES, move |s| {
                    Box::pin(async move {
                        let attributes = s.get_user_attributes(&user_id, None).await?;
                        Ok(attributes_wire(&user_id, attributes))
                    })
                })
            }
            Command::GetUserAttributesByKeys {
                session,
                user_id,
                keys,
            } => self.submit_session_op(session, wire::GET_USER_ATTRIBUTES_BY_KEYS, move |s| {
                Box::pin(async move {
                    let attributes = s.get_user_attributes(&user_id, Some(&keys)).await?;
                    Ok(attributes_wire(&user_id, attributes))
                })
            }),
        }
    }

    // ── Creation ────────────────────────────────────────────────────

    fn create_session(&self, app_id: &str) -> Reply {
        let created = panic::catch_unwind(AssertUnwindSafe(|| self.engine.create_session(app_id)));
        match created {
            Ok(Ok((session, notices))) => {
                let handle = self.registry.allocate_session(Arc::clone(&session));
                self.events.spawn_session_pump(session, notices);
                debug!(%handle, app_id, "session created");
                Reply::Handle(handle)
            }
            Ok(Err(err)) => {
                warn!(error = %err, app_id, "session construction failed");
                Reply::Handle(Handle::INVALID)
            }
            Err(_) => {
                warn!(app_id, "session construction panicked");
                Reply::Handle(Handle::INVALID)
            }
        }
    }

    fn create_channel(&self, session: Handle, channel_id: &str) -> Reply {
        let Some(owner) = self.registry.resolve_session(session) else {
            self.events
                .unknown_handle(ObjectKind::Session, session, wire::CREATE_CHANNEL);
            return Reply::Handle(Handle::INVALID);
        };
        let created = panic::catch_unwind(AssertUnwindSafe(|| owner.create_channel(channel_id)));
        match created {
            Ok(Ok((channel, notices))) => {
                let handle = self.registry.allocate_channel(Arc::clone(&channel));
                self.events.spawn_channel_pump(channel, notices);
                debug!(%handle, channel_id, "channel created");
                Reply::Handle(handle)
            }
            Ok(Err(err)) => {
                warn!(error = %err, channel_id, "channel construction failed");
                Reply::Handle(Handle::INVALID)
            }
            Err(_) => {
                warn!(channel_id, "channel construction panicked");
                Reply::Handle(Handle::INVALID)
            }
        }
    }

    // ── Release ─────────────────────────────────────────────────────

    fn release_channel(&self, channel: Handle) -> Reply {
        let Some(instance) = self.registry.resolve_channel(channel) else {
            debug!(%channel, "release of unknown channel handle");
            return Reply::Released(false);
        };
        // Remove the mapping first: any completion or notice that fires
        // from here on finds no addressee and is suppressed. The guard
        // also loses gracefully against a concurrent release.
        if !self.registry.release_channel(channel) {
            return Reply::Released(false);
        }
        instance.release();
        debug!(%channel, "channel released");
        Reply::Released(true)
    }

    // ── Submission helpers ──────────────────────────────────────────

    fn submit_session_op<F>(&self, handle: Handle, event: &'static str, op: F) -> Reply
    where
        F: FnOnce(Arc<dyn RtmSession>) -> BoxFuture<'static, EngineResult<Map<String, Value>>>
            + Send
            + 'static,
    {
        let Some(session) = self.registry.resolve_session(handle) else {
            self.events.unknown_handle(ObjectKind::Session, handle, event);
            return Reply::Accepted;
        };
        let events = self.events.clone();
        let _task = tokio::spawn(async move {
            let outcome = op(session).await;
            events.outcome(ObjectKind::Session, handle, event, outcome);
        });
        Reply::Accepted
    }

    fn submit_channel_op<F>(&self, handle: Handle, event: &'static str, op: F) -> Reply
    where
        F: FnOnce(Arc<dyn RtmChannel>) -> BoxFuture<'static, EngineResult<Map<String, Value>>>
            + Send
            + 'static,
    {
        let Some(channel) = self.registry.resolve_channel(handle) else {
            self.events.unknown_handle(ObjectKind::Channel, handle, event);
            return Reply::Accepted;
        };
        let events = self.events.clone();
        let _task = tokio::spawn(async move {
            let outcome = op(channel).await;
            events.outcome(ObjectKind::Channel, handle, event, outcome);
        });
        Reply::Accepted
    }
}

/// Wire shape of a user-attribute query outcome: the attribute list is
/// flattened into a key → value map under `results`.
fn attributes_wire(user_id: &str, attributes: Vec<UserAttribute>) -> Map<String, Value> {
    let flattened: Map<String, Value> = attributes
        .into_iter()
        .map(|attr| (attr.key, Value::from(attr.value)))
        .collect();
    let mut results = Map::new();
    let _ = results.insert("userId".into(), Value::from(user_id));
    let _ = results.insert("attributes".into(), Value::Object(flattened));
    let mut payload = Map::new();
    let _ = payload.insert("results".into(), Value::Object(results));
    payload
}
