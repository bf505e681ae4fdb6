//! # rtm-engine
//!
//! Contract of the messaging-engine collaborator.
//!
//! The bridge never talks to a concrete engine; it is written against
//! the traits here:
//!
//! - **[`RtmEngine`]**: synchronous session construction
//! - **[`RtmSession`]**: one logical connection. Login/logout, peer
//!   queries, point-to-point messages, user attributes, channel creation
//! - **[`RtmChannel`]**: one membership scope. Join/leave, channel
//!   messages, member listing, synchronous release
//!
//! Contract assumed by the bridge (and honored by [`mock`]):
//!
//! - Object creation returns a usable instance or a failure signal
//!   synchronously.
//! - Every asynchronous operation's future resolves exactly once.
//! - Notice streams, handed out at creation time, yield zero or more
//!   unsolicited events until the object is released.
//! - `release` is synchronous and called at most once per object.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use rtm_core::errors::EngineError;
use rtm_core::message::{ChannelMember, MessageBody, UserAttribute};

pub mod mock;

/// Result of one engine operation.
pub type EngineResult<T> = Result<T, EngineError>;

/// Unsolicited session-level event pushed by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionNotice {
    /// The connection transitioned between states.
    ConnectionStateChanged {
        /// New connection state.
        state: i32,
        /// Engine-defined transition reason.
        reason: i32,
    },
    /// A point-to-point message arrived.
    MessageReceived {
        /// Message body.
        message: MessageBody,
        /// Sending peer.
        peer_id: String,
    },
    /// The login token expired.
    TokenExpired,
}

/// Unsolicited channel-level event pushed by the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelNotice {
    /// A member joined the channel.
    MemberJoined {
        /// The joining member.
        member: ChannelMember,
    },
    /// A member left the channel.
    MemberLeft {
        /// The leaving member.
        member: ChannelMember,
    },
    /// A channel message arrived.
    MessageReceived {
        /// Message body.
        message: MessageBody,
        /// Sending member.
        member: ChannelMember,
    },
}

/// Stream of unsolicited session events, live until the session is
/// released by the engine side.
pub type SessionNotices = UnboundedReceiver<SessionNotice>;
/// Stream of unsolicited channel events, closed when the channel is
/// released.
pub type ChannelNotices = UnboundedReceiver<ChannelNotice>;

/// Entry point of the engine collaborator.
pub trait RtmEngine: Send + Sync {
    /// Construct one logical connection for the given application id.
    ///
    /// Returns the session instance together with its notice stream, or
    /// the engine's failure signal.
    fn create_session(&self, app_id: &str)
    -> EngineResult<(Arc<dyn RtmSession>, SessionNotices)>;
}

/// One logical connection to the messaging engine.
#[async_trait]
pub trait RtmSession: Send + Sync {
    /// Log in as `user_id`, optionally presenting a token.
    async fn login(&self, token: Option<&str>, user_id: &str) -> EngineResult<()>;

    /// Log the current user out.
    async fn logout(&self) -> EngineResult<()>;

    /// Query which of the given peers are currently online.
    async fn query_peers_online_status(
        &self,
        peer_ids: &[String],
    ) -> EngineResult<HashMap<String, bool>>;

    /// Send a point-to-point message to `peer_id`.
    async fn send_message_to_peer(&self, peer_id: &str, message: &MessageBody)
    -> EngineResult<()>;

    /// Construct a channel-membership scope on this connection.
    fn create_channel(
        &self,
        channel_id: &str,
    ) -> EngineResult<(Arc<dyn RtmChannel>, ChannelNotices)>;

    /// Replace the local user's attribute set.
    async fn set_local_user_attributes(&self, attributes: &[UserAttribute]) -> EngineResult<()>;

    /// Merge attributes into the local user's set.
    async fn add_or_update_local_user_attributes(
        &self,
        attributes: &[UserAttribute],
    ) -> EngineResult<()>;

    /// Delete local user attributes by key.
    async fn delete_local_user_attributes_by_keys(&self, keys: &[String]) -> EngineResult<()>;

    /// Clear all local user attributes.
    async fn clear_local_user_attributes(&self) -> EngineResult<()>;

    /// Fetch a user's attributes; `keys` of `None` fetches all of them.
    async fn get_user_attributes(
        &self,
        user_id: &str,
        keys: Option<&[String]>,
    ) -> EngineResult<Vec<UserAttribute>>;
}

/// One channel-membership scope.
#[async_trait]
pub trait RtmChannel: Send + Sync {
    /// Join the channel.
    async fn join(&self) -> EngineResult<()>;

    /// Leave the channel.
    async fn leave(&self) -> EngineResult<()>;

    /// Send a message into the channel.
    async fn send_message(&self, message: &MessageBody) -> EngineResult<()>;

    /// List current members.
    async fn members(&self) -> EngineResult<Vec<ChannelMember>>;

    /// Release native resources, cancelling in-flight work.
    ///
    /// Synchronous: completes before returning. The registry removes the
    /// mapping first, so this is called at most once per object.
    fn release(&self);
}
