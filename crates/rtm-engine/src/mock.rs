//! Scripted in-memory engine for tests.
//!
//! `MockEngine` records every operation, lets tests script the next
//! failure per object, inject unsolicited notices, and gate async
//! completions to reproduce out-of-order callback interleavings.
//! Compiled unconditionally so dependent crates can use it from their
//! own test code.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::oneshot;

use rtm_core::errors::EngineError;
use rtm_core::message::{ChannelMember, MessageBody, UserAttribute};

use crate::{
    ChannelNotice, ChannelNotices, EngineResult, RtmChannel, RtmEngine, RtmSession,
    SessionNotice, SessionNotices,
};

/// Scripted engine front door.
pub struct MockEngine {
    fail_next_create: AtomicBool,
    sessions: Mutex<Vec<Arc<MockSession>>>,
}

impl MockEngine {
    /// Create a mock engine that succeeds everything by default.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_next_create: AtomicBool::new(false),
            sessions: Mutex::new(Vec::new()),
        })
    }

    /// Make the next `create_session` fail with an engine error.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Number of sessions created so far.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// The `index`-th created session, in creation order.
    ///
    /// # Panics
    /// Panics if no such session was created (test misuse).
    pub fn session(&self, index: usize) -> Arc<MockSession> {
        Arc::clone(&self.sessions.lock()[index])
    }
}

impl RtmEngine for MockEngine {
    fn create_session(
        &self,
        app_id: &str,
    ) -> EngineResult<(Arc<dyn RtmSession>, SessionNotices)> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(EngineError::new(1, "session construction refused"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(MockSession::new(app_id, tx));
        self.sessions.lock().push(Arc::clone(&session));
        Ok((session, rx))
    }
}

/// Scripted session instance.
pub struct MockSession {
    /// Application id the session was created with.
    pub app_id: String,
    notices: UnboundedSender<SessionNotice>,
    calls: Mutex<Vec<String>>,
    fail_next: Mutex<Option<EngineError>>,
    fail_next_create_channel: AtomicBool,
    peer_status: Mutex<HashMap<String, bool>>,
    user_attributes: Mutex<HashMap<String, Vec<UserAttribute>>>,
    channels: Mutex<Vec<Arc<MockChannel>>>,
}

impl MockSession {
    fn new(app_id: &str, notices: UnboundedSender<SessionNotice>) -> Self {
        Self {
            app_id: app_id.to_owned(),
            notices,
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            fail_next_create_channel: AtomicBool::new(false),
            peer_status: Mutex::new(HashMap::new()),
            user_attributes: Mutex::new(HashMap::new()),
            channels: Mutex::new(Vec::new()),
        }
    }

    /// Script the next async operation to fail with `error`.
    pub fn fail_next(&self, error: EngineError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Make the next `create_channel` fail with an engine error.
    pub fn fail_next_create_channel(&self) {
        self.fail_next_create_channel.store(true, Ordering::SeqCst);
    }

    /// Inject an unsolicited session notice.
    pub fn push_notice(&self, notice: SessionNotice) {
        let _ = self.notices.send(notice);
    }

    /// Seed the answer for `query_peers_online_status`.
    pub fn set_peer_status(&self, peer_id: &str, online: bool) {
        let _ = self.peer_status.lock().insert(peer_id.to_owned(), online);
    }

    /// Seed the stored attributes of a user.
    pub fn set_user_attributes(&self, user_id: &str, attributes: Vec<UserAttribute>) {
        let _ = self
            .user_attributes
            .lock()
            .insert(user_id.to_owned(), attributes);
    }

    /// Recorded operation log, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// The `index`-th channel created on this session.
    ///
    /// # Panics
    /// Panics if no such channel was created (test misuse).
    pub fn channel(&self, index: usize) -> Arc<MockChannel> {
        Arc::clone(&self.channels.lock()[index])
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn take_failure(&self) -> EngineResult<()> {
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RtmSession for MockSession {
    async fn login(&self, token: Option<&str>, user_id: &str) -> EngineResult<()> {
        self.record(format!("login({}, {user_id})", token.unwrap_or("-")));
        self.take_failure()
    }

    async fn logout(&self) -> EngineResult<()> {
        self.record("logout".into());
        self.take_failure()
    }

    async fn query_peers_online_status(
        &self,
        peer_ids: &[String],
    ) -> EngineResult<HashMap<String, bool>> {
        self.record(format!("query_peers({})", peer_ids.join(",")));
        self.take_failure()?;
        let status = self.peer_status.lock();
        Ok(peer_ids
            .iter()
            .map(|peer| (peer.clone(), status.get(peer).copied().unwrap_or(false)))
            .collect())
    }

    async fn send_message_to_peer(
        &self,
        peer_id: &str,
        message: &MessageBody,
    ) -> EngineResult<()> {
        self.record(format!("send_to_peer({peer_id}, {})", message.text));
        self.take_failure()
    }

    fn create_channel(
        &self,
        channel_id: &str,
    ) -> EngineResult<(Arc<dyn RtmChannel>, ChannelNotices)> {
        self.record(format!("create_channel({channel_id})"));
        if self.fail_next_create_channel.swap(false, Ordering::SeqCst) {
            return Err(EngineError::new(1, "channel construction refused"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(MockChannel::new(channel_id, tx));
        self.channels.lock().push(Arc::clone(&channel));
        Ok((channel, rx))
    }

    async fn set_local_user_attributes(&self, attributes: &[UserAttribute]) -> EngineResult<()> {
        self.record(format!("set_attributes({})", attributes.len()));
        self.take_failure()
    }

    async fn add_or_update_local_user_attributes(
        &self,
        attributes: &[UserAttribute],
    ) -> EngineResult<()> {
        self.record(format!("add_or_update_attributes({})", attributes.len()));
        self.take_failure()
    }

    async fn delete_local_user_attributes_by_keys(&self, keys: &[String]) -> EngineResult<()> {
        self.record(format!("delete_attributes({})", keys.join(",")));
        self.take_failure()
    }

    async fn clear_local_user_attributes(&self) -> EngineResult<()> {
        self.record("clear_attributes".into());
        self.take_failure()
    }

    async fn get_user_attributes(
        &self,
        user_id: &str,
        keys: Option<&[String]>,
    ) -> EngineResult<Vec<UserAttribute>> {
        self.record(format!("get_attributes({user_id})"));
        self.take_failure()?;
        let stored = self
            .user_attributes
            .lock()
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        Ok(match keys {
            Some(keys) => stored
                .into_iter()
                .filter(|attr| keys.contains(&attr.key))
                .collect(),
            None => stored,
        })
    }
}

/// Scripted channel instance.
pub struct MockChannel {
    /// Channel id the instance was created with.
    pub channel_id: String,
    notices: Mutex<Option<UnboundedSender<ChannelNotice>>>,
    calls: Mutex<Vec<String>>,
    fail_next: Mutex<Option<EngineError>>,
    join_gate: Mutex<Option<oneshot::Receiver<()>>>,
    members: Mutex<Vec<ChannelMember>>,
    released: AtomicBool,
}

impl MockChannel {
    fn new(channel_id: &str, notices: UnboundedSender<ChannelNotice>) -> Self {
        Self {
            channel_id: channel_id.to_owned(),
            notices: Mutex::new(Some(notices)),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            join_gate: Mutex::new(None),
            members: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    /// Script the next async operation to fail with `error`.
    pub fn fail_next(&self, error: EngineError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Hold the next `join` until the returned sender fires (or drops).
    pub fn gate_next_join(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.join_gate.lock() = Some(rx);
        tx
    }

    /// Inject an unsolicited channel notice.
    ///
    /// Returns `false` once the channel has been released and its
    /// notice stream closed.
    pub fn push_notice(&self, notice: ChannelNotice) -> bool {
        match self.notices.lock().as_ref() {
            Some(tx) => tx.send(notice).is_ok(),
            None => false,
        }
    }

    /// Seed the answer for `members`.
    pub fn set_members(&self, members: Vec<ChannelMember>) {
        *self.members.lock() = members;
    }

    /// Recorded operation log, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Whether `release` has been called.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn take_failure(&self) -> EngineResult<()> {
        match self.fail_next.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RtmChannel for MockChannel {
    async fn join(&self) -> EngineResult<()> {
        self.record("join".into());
        let gate = self.join_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.take_failure()
    }

    async fn leave(&self) -> EngineResult<()> {
        self.record("leave".into());
        self.take_failure()
    }

    async fn send_message(&self, message: &MessageBody) -> EngineResult<()> {
        self.record(format!("send_message({})", message.text));
        self.take_failure()
    }

    async fn members(&self) -> EngineResult<Vec<ChannelMember>> {
        self.record("members".into());
        self.take_failure()?;
        Ok(self.members.lock().clone())
    }

    fn release(&self) {
        self.record("release".into());
        self.released.store(true, Ordering::SeqCst);
        // Closing the notice stream ends the bridge's pump task.
        let _ = self.notices.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn create_session_returns_instance_and_stream() {
        let engine = MockEngine::new();
        let (session, mut notices) = engine.create_session("app").unwrap();
        assert_eq!(engine.session_count(), 1);

        engine.session(0).push_notice(SessionNotice::TokenExpired);
        drop(session);
        assert_eq!(notices.recv().await, Some(SessionNotice::TokenExpired));
    }

    #[tokio::test]
    async fn fail_next_create_fails_once() {
        let engine = MockEngine::new();
        engine.fail_next_create();
        assert!(engine.create_session("app").is_err());
        assert!(engine.create_session("app").is_ok());
    }

    #[tokio::test]
    async fn scripted_failure_consumed_by_next_op() {
        let engine = MockEngine::new();
        let (session, _notices) = engine.create_session("app").unwrap();
        engine.session(0).fail_next(EngineError::new(102, "offline"));

        let err = session.login(None, "alice").await.unwrap_err();
        assert_eq!(err.code, 102);
        session.logout().await.unwrap();
    }

    #[tokio::test]
    async fn peer_status_defaults_offline() {
        let engine = MockEngine::new();
        let (session, _notices) = engine.create_session("app").unwrap();
        engine.session(0).set_peer_status("alice", true);

        let status = session
            .query_peers_online_status(&["alice".into(), "bob".into()])
            .await
            .unwrap();
        assert_eq!(status.get("alice"), Some(&true));
        assert_eq!(status.get("bob"), Some(&false));
    }

    #[tokio::test]
    async fn get_user_attributes_filters_by_keys() {
        let engine = MockEngine::new();
        let (session, _notices) = engine.create_session("app").unwrap();
        engine.session(0).set_user_attributes(
            "alice",
            vec![
                UserAttribute { key: "a".into(), value: "1".into() },
                UserAttribute { key: "b".into(), value: "2".into() },
            ],
        );

        let all = session.get_user_attributes("alice", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let keys = vec!["b".to_owned()];
        let some = session
            .get_user_attributes("alice", Some(&keys))
            .await
            .unwrap();
        assert_matches!(some.as_slice(), [attr] if attr.key == "b");
    }

    #[tokio::test]
    async fn release_closes_notice_stream() {
        let engine = MockEngine::new();
        let (session, _notices) = engine.create_session("app").unwrap();
        let (channel, mut channel_notices) = session.create_channel("room1").unwrap();

        channel.release();
        assert!(engine.session(0).channel(0).is_released());
        assert!(!engine.session(0).channel(0).push_notice(ChannelNotice::MemberLeft {
            member: ChannelMember {
                user_id: "alice".into(),
                channel_id: "room1".into(),
            },
        }));
        assert_eq!(channel_notices.recv().await, None);
    }

    #[tokio::test]
    async fn gated_join_waits_for_the_signal() {
        let engine = MockEngine::new();
        let (session, _notices) = engine.create_session("app").unwrap();
        let (channel, _channel_notices) = session.create_channel("room1").unwrap();
        let gate = engine.session(0).channel(0).gate_next_join();

        let join = tokio::spawn(async move { channel.join().await });
        let _ = gate.send(());
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn call_log_records_in_order() {
        let engine = MockEngine::new();
        let (session, _notices) = engine.create_session("app").unwrap();
        session.login(Some("tok"), "alice").await.unwrap();
        session.logout().await.unwrap();
        assert_eq!(
            engine.session(0).calls(),
            vec!["login(tok, alice)", "logout"]
        );
    }
}
