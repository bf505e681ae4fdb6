//! Wire name constants for the host protocol.
//!
//! Command names double as the outcome event names: the outcome envelope
//! for a command is published under the same string the host used to
//! issue it, so the host correlates by `(event, obj, objIndex)`.

// ── Session commands ────────────────────────────────────────────────

/// Create a session; replies with the new session handle.
pub const CREATE_INSTANCE: &str = "AgoraRtmClient_createInstance";
/// Log the session's user in.
pub const LOGIN: &str = "AgoraRtmClient_login";
/// Log the session's user out.
pub const LOGOUT: &str = "AgoraRtmClient_logout";
/// Query the online status of a set of peers.
pub const QUERY_PEERS_ONLINE_STATUS: &str = "AgoraRtmClient_queryPeersOnlineStatus";
/// Send a point-to-point message.
pub const SEND_MESSAGE_TO_PEER: &str = "AgoraRtmClient_sendMessageToPeer";
/// Create a channel on a session; replies with the new channel handle.
pub const CREATE_CHANNEL: &str = "AgoraRtmClient_createChannel";
/// Replace the local user's attributes.
pub const SET_LOCAL_USER_ATTRIBUTES: &str = "AgoraRtmClient_setLocalUserAttributes";
/// Merge attributes into the local user's set.
pub const ADD_OR_UPDATE_LOCAL_USER_ATTRIBUTES: &str =
    "AgoraRtmClient_addOrUpdateLocalUserAttributes";
/// Delete local user attributes by key.
pub const DELETE_LOCAL_USER_ATTRIBUTES_BY_KEYS: &str =
    "AgoraRtmClient_deleteLocalUserAttributesByKeys";
/// Clear all local user attributes.
pub const CLEAR_LOCAL_USER_ATTRIBUTES: &str = "AgoraRtmClient_clearLocalUserAttributes";
/// Fetch all attributes of a user.
pub const GET_USER_ATTRIBUTES: &str = "AgoraRtmClient_getUserAttributes";
/// Fetch selected attributes of a user.
pub const GET_USER_ATTRIBUTES_BY_KEYS: &str = "AgoraRtmClient_getUserAttributesByKeys";

// ── Channel commands ────────────────────────────────────────────────

/// Join the channel.
pub const CHANNEL_JOIN: &str = "AgoraRtmChannel_join";
/// Leave the channel.
pub const CHANNEL_LEAVE: &str = "AgoraRtmChannel_leave";
/// Send a message into the channel.
pub const CHANNEL_SEND_MESSAGE: &str = "AgoraRtmChannel_sendMessage";
/// List current channel members.
pub const CHANNEL_GET_MEMBERS: &str = "AgoraRtmChannel_getMembers";
/// Release the channel; replies immediately, no outcome envelope.
pub const CHANNEL_RELEASE: &str = "AgoraRtmChannel_release";

// ── Session push events ─────────────────────────────────────────────

/// Connection state transition (`state`, `reason`).
pub const ON_CONNECTION_STATE_CHANGED: &str = "AgoraRtmClient_onConnectionStateChanged";
/// Inbound peer message (`message`, `peerId`).
pub const ON_MESSAGE_RECEIVED: &str = "AgoraRtmClient_onMessageReceived";
/// Login token expired.
pub const ON_TOKEN_EXPIRED: &str = "AgoraRtmClient_onTokenExpired";

// ── Channel push events ─────────────────────────────────────────────

/// A member joined the channel (`member`).
pub const ON_MEMBER_JOINED: &str = "AgoraRtmChannel_onMemberJoined";
/// A member left the channel (`member`).
pub const ON_MEMBER_LEFT: &str = "AgoraRtmChannel_onMemberLeft";
/// A channel message arrived (`message`, `member`).
pub const ON_CHANNEL_MESSAGE_RECEIVED: &str = "AgoraRtmChannel_onMessageReceived";
