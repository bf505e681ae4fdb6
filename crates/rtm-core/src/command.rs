//! Inbound command decoding.
//!
//! The host issues `{ "command": <name>, "arguments": <map> }`. The
//! stringly-typed name is decoded **once** at the boundary into the
//! closed [`Command`] enum, one variant per command family, so dispatch
//! is exhaustive and adding a command is a compile-checked edit.
//!
//! Argument decoding is deliberately lenient: a parameter that fails to
//! decode to its expected shape is treated as absent and substituted
//! with a neutral value (empty string/list, [`Handle::INVALID`] for the
//! handle field) instead of aborting the command. A handle that decodes
//! to the invalid sentinel simply fails resolution downstream and yields
//! the unknown-handle outcome, so the host's pending-command bookkeeping
//! is never left waiting. The one hard rejection is an unrecognized
//! command name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CommandDecodeError;
use crate::handle::{Handle, ObjectKind};
use crate::message::{MessageBody, UserAttribute};
use crate::wire;

/// Raw inbound command envelope, as delivered by the host transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Wire name of the operation.
    pub command: String,
    /// Loosely-typed argument bag.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// One fully-decoded host command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Create a session; replies with the new session handle.
    CreateSession {
        /// Application identifier the engine connects with.
        app_id: String,
    },
    /// Log the session's user in.
    Login {
        /// Primary session handle.
        session: Handle,
        /// Login token, if the host supplied one.
        token: Option<String>,
        /// User identity to log in as.
        user_id: String,
    },
    /// Log the session's user out.
    Logout {
        /// Primary session handle.
        session: Handle,
    },
    /// Query the online status of a set of peers.
    QueryPeersOnlineStatus {
        /// Primary session handle.
        session: Handle,
        /// Peers to query.
        peer_ids: Vec<String>,
    },
    /// Send a point-to-point message.
    SendMessageToPeer {
        /// Primary session handle.
        session: Handle,
        /// Destination peer.
        peer_id: String,
        /// Message body.
        message: MessageBody,
    },
    /// Create a channel on a session; replies with the new channel handle.
    CreateChannel {
        /// Session the channel is created from.
        session: Handle,
        /// Channel identity within the engine.
        channel_id: String,
    },
    /// Join the channel.
    JoinChannel {
        /// Primary channel handle.
        channel: Handle,
    },
    /// Leave the channel.
    LeaveChannel {
        /// Primary channel handle.
        channel: Handle,
    },
    /// Send a message into the channel.
    SendChannelMessage {
        /// Primary channel handle.
        channel: Handle,
        /// Session used to construct the message.
        session: Handle,
        /// Message body.
        message: MessageBody,
    },
    /// List current channel members.
    GetMembers {
        /// Primary channel handle.
        channel: Handle,
    },
    /// Release the channel; replies immediately, no outcome envelope.
    ReleaseChannel {
        /// Primary channel handle.
        channel: Handle,
    },
    /// Replace the local user's attributes.
    SetLocalUserAttributes {
        /// Primary session handle.
        session: Handle,
        /// New attribute set.
        attributes: Vec<UserAttribute>,
    },
    /// Merge attributes into the local user's set.
    AddOrUpdateLocalUserAttributes {
        /// Primary session handle.
        session: Handle,
        /// Attributes to merge.
        attributes: Vec<UserAttribute>,
    },
    /// Delete local user attributes by key.
    DeleteLocalUserAttributesByKeys {
        /// Primary session handle.
        session: Handle,
        /// Keys to delete.
        keys: Vec<String>,
    },
    /// Clear all local user attributes.
    ClearLocalUserAttributes {
        /// Primary session handle.
        session: Handle,
    },
    /// Fetch all attributes of a user.
    GetUserAttributes {
        /// Primary session handle.
        session: Handle,
        /// User to query.
        user_id: String,
    },
    /// Fetch selected attributes of a user.
    GetUserAttributesByKeys {
        /// Primary session handle.
        session: Handle,
        /// User to query.
        user_id: String,
        /// Attribute keys to fetch.
        keys: Vec<String>,
    },
}

impl Command {
    /// Decode a raw request into a command.
    ///
    /// Never fails on malformed arguments, only on an unknown name.
    pub fn parse(request: &CommandRequest) -> Result<Self, CommandDecodeError> {
        let args = &request.arguments;
        let command = match request.command.as_str() {
            wire::CREATE_INSTANCE => Self::CreateSession {
                app_id: string_arg(args, "appId"),
            },
            wire::LOGIN => Self::Login {
                session: session_arg(args),
                token: optional_string_arg(args, "token"),
                user_id: string_arg(args, "userId"),
            },
            wire::LOGOUT => Self::Logout {
                session: session_arg(args),
            },
            wire::QUERY_PEERS_ONLINE_STATUS => Self::QueryPeersOnlineStatus {
                session: session_arg(args),
                peer_ids: string_list_arg(args, "peerIds"),
            },
            wire::SEND_MESSAGE_TO_PEER => Self::SendMessageToPeer {
                session: session_arg(args),
                peer_id: string_arg(args, "peerId"),
                message: message_arg(args),
            },
            wire::CREATE_CHANNEL => Self::CreateChannel {
                session: session_arg(args),
                channel_id: string_arg(args, "channelId"),
            },
            wire::CHANNEL_JOIN => Self::JoinChannel {
                channel: channel_arg(args),
            },
            wire::CHANNEL_LEAVE => Self::LeaveChannel {
                channel: channel_arg(args),
            },
            wire::CHANNEL_SEND_MESSAGE => Self::SendChannelMessage {
                channel: channel_arg(args),
                session: session_arg(args),
                message: message_arg(args),
            },
            wire::CHANNEL_GET_MEMBERS => Self::GetMembers {
                channel: channel_arg(args),
            },
            wire::CHANNEL_RELEASE => Self::ReleaseChannel {
                channel: channel_arg(args),
            },
            wire::SET_LOCAL_USER_ATTRIBUTES => Self::SetLocalUserAttributes {
                session: session_arg(args),
                attributes: attributes_arg(args),
            },
            wire::ADD_OR_UPDATE_LOCAL_USER_ATTRIBUTES => Self::AddOrUpdateLocalUserAttributes {
                session: session_arg(args),
                attributes: attributes_arg(args),
            },
            wire::DELETE_LOCAL_USER_ATTRIBUTES_BY_KEYS => Self::DeleteLocalUserAttributesByKeys {
                session: session_arg(args),
                keys: string_list_arg(args, "keys"),
            },
            wire::CLEAR_LOCAL_USER_ATTRIBUTES => Self::ClearLocalUserAttributes {
                session: session_arg(args),
            },
            wire::GET_USER_ATTRIBUTES => Self::GetUserAttributes {
                session: session_arg(args),
                user_id: string_arg(args, "userId"),
            },
            wire::GET_USER_ATTRIBUTES_BY_KEYS => Self::GetUserAttributesByKeys {
                session: session_arg(args),
                user_id: string_arg(args, "userId"),
                keys: string_list_arg(args, "keys"),
            },
            other => return Err(CommandDecodeError::UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }

    /// Wire name of the command; outcome envelopes are published under
    /// this same string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => wire::CREATE_INSTANCE,
            Self::Login { .. } => wire::LOGIN,
            Self::Logout { .. } => wire::LOGOUT,
            Self::QueryPeersOnlineStatus { .. } => wire::QUERY_PEERS_ONLINE_STATUS,
            Self::SendMessageToPeer { .. } => wire::SEND_MESSAGE_TO_PEER,
            Self::CreateChannel { .. } => wire::CREATE_CHANNEL,
            Self::JoinChannel { .. } => wire::CHANNEL_JOIN,
            Self::LeaveChannel { .. } => wire::CHANNEL_LEAVE,
            Self::SendChannelMessage { .. } => wire::CHANNEL_SEND_MESSAGE,
            Self::GetMembers { .. } => wire::CHANNEL_GET_MEMBERS,
            Self::ReleaseChannel { .. } => wire::CHANNEL_RELEASE,
            Self::SetLocalUserAttributes { .. } => wire::SET_LOCAL_USER_ATTRIBUTES,
            Self::AddOrUpdateLocalUserAttributes { .. } => {
                wire::ADD_OR_UPDATE_LOCAL_USER_ATTRIBUTES
            }
            Self::DeleteLocalUserAttributesByKeys { .. } => {
                wire::DELETE_LOCAL_USER_ATTRIBUTES_BY_KEYS
            }
            Self::ClearLocalUserAttributes { .. } => wire::CLEAR_LOCAL_USER_ATTRIBUTES,
            Self::GetUserAttributes { .. } => wire::GET_USER_ATTRIBUTES,
            Self::GetUserAttributesByKeys { .. } => wire::GET_USER_ATTRIBUTES_BY_KEYS,
        }
    }

    /// Kind of the primary object the command addresses.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::CreateSession { .. }
            | Self::Login { .. }
            | Self::Logout { .. }
            | Self::QueryPeersOnlineStatus { .. }
            | Self::SendMessageToPeer { .. }
            | Self::CreateChannel { .. }
            | Self::SetLocalUserAttributes { .. }
            | Self::AddOrUpdateLocalUserAttributes { .. }
            | Self::DeleteLocalUserAttributesByKeys { .. }
            | Self::ClearLocalUserAttributes { .. }
            | Self::GetUserAttributes { .. }
            | Self::GetUserAttributesByKeys { .. } => ObjectKind::Session,
            Self::JoinChannel { .. }
            | Self::LeaveChannel { .. }
            | Self::SendChannelMessage { .. }
            | Self::GetMembers { .. }
            | Self::ReleaseChannel { .. } => ObjectKind::Channel,
        }
    }
}

// ── Lenient argument extraction ─────────────────────────────────────

fn session_arg(args: &Map<String, Value>) -> Handle {
    handle_arg(args, "clientIndex")
}

fn channel_arg(args: &Map<String, Value>) -> Handle {
    handle_arg(args, "channelIndex")
}

fn handle_arg(args: &Map<String, Value>, key: &str) -> Handle {
    args.get(key)
        .and_then(Value::as_i64)
        .map_or(Handle::INVALID, Handle)
}

fn string_arg(args: &Map<String, Value>, key: &str) -> String {
    optional_string_arg(args, key).unwrap_or_default()
}

fn optional_string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

/// A list where every element must be a string; anything else degrades
/// to the empty list.
fn string_list_arg(args: &Map<String, Value>, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(ToOwned::to_owned))
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or_default()
}

/// Attribute list entries missing a string key or value are skipped.
fn attributes_arg(args: &Map<String, Value>) -> Vec<UserAttribute> {
    args.get("attributes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let entry = item.as_object()?;
                    Some(UserAttribute {
                        key: entry.get("key")?.as_str()?.to_owned(),
                        value: entry.get("value")?.as_str()?.to_owned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn message_arg(args: &Map<String, Value>) -> MessageBody {
    args.get("message")
        .and_then(Value::as_object)
        .map(|body| MessageBody {
            text: body
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        })
        .unwrap_or_default()
}
