#![allow(missing_docs)]

//! End-to-end bridge scenarios driven through raw host requests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use rtm_bridge::{ChannelTransport, RtmBridge};
use rtm_core::command::CommandRequest;
use rtm_core::envelope::{Envelope, Reply};
use rtm_core::handle::Handle;
use rtm_engine::mock::MockEngine;
use rtm_engine::{ChannelNotice, RtmEngine, SessionNotice};
use rtm_core::message::{ChannelMember, MessageBody};

fn make_bridge() -> (RtmBridge, Arc<MockEngine>, UnboundedReceiver<Envelope>) {
    let engine = MockEngine::new();
    let (transport, rx) = ChannelTransport::new();
    let bridge = RtmBridge::new(Arc::clone(&engine) as Arc<dyn RtmEngine>, transport);
    (bridge, engine, rx)
}

fn request(command: &str, arguments: serde_json::Value) -> CommandRequest {
    serde_json::from_value(json!({"command": command, "arguments": arguments}))
        .expect("valid request json")
}

async fn expect_no_envelope(rx: &mut UnboundedReceiver<Envelope>) {
    let quiet = timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(quiet.is_err(), "expected no envelope, got {quiet:?}");
}

#[tokio::test]
async fn create_session_create_channel_send_message() {
    let (bridge, _engine, mut rx) = make_bridge();

    let reply = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    assert_eq!(reply, Reply::Handle(Handle(0)));

    // Channel counter is independent of the session counter.
    let reply = bridge.handle_request(&request(
        "AgoraRtmClient_createChannel",
        json!({"clientIndex": 0, "channelId": "room1"}),
    ));
    assert_eq!(reply, Reply::Handle(Handle(0)));

    let reply = bridge.handle_request(&request(
        "AgoraRtmChannel_sendMessage",
        json!({"channelIndex": 0, "clientIndex": 0, "message": {"text": "hi"}}),
    ));
    assert_eq!(reply, Reply::Accepted);

    let env = rx.recv().await.unwrap();
    let wire = serde_json::to_value(&env).unwrap();
    assert_eq!(wire["event"], "AgoraRtmChannel_sendMessage");
    assert_eq!(wire["obj"], "AgoraRtmChannel");
    assert_eq!(wire["objIndex"], 0);
    assert_eq!(wire["errorCode"], 0);
}

#[tokio::test]
async fn query_on_unallocated_handle_is_answered_without_engine_call() {
    let (bridge, engine, mut rx) = make_bridge();

    let reply = bridge.handle_request(&request(
        "AgoraRtmClient_queryPeersOnlineStatus",
        json!({"clientIndex": 5, "peerIds": ["alice"]}),
    ));
    assert_eq!(reply, Reply::Accepted);

    let env = rx.recv().await.unwrap();
    let wire = serde_json::to_value(&env).unwrap();
    assert_eq!(wire["obj"], "AgoraRtmClient");
    assert_eq!(wire["objIndex"], 5);
    assert_eq!(wire["errorCode"], -1);
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test]
async fn out_of_order_joins_carry_their_own_handles() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmClient_createChannel",
            json!({"clientIndex": 0, "channelId": "room_a"}),
        )),
        Reply::Handle(Handle(0))
    );
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmClient_createChannel",
            json!({"clientIndex": 0, "channelId": "room_b"}),
        )),
        Reply::Handle(Handle(1))
    );

    // Hold channel 0's join so channel 1 completes first.
    let gate = engine.session(0).channel(0).gate_next_join();

    let _ = bridge.handle_request(&request(
        "AgoraRtmChannel_join",
        json!({"channelIndex": 0}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmChannel_join",
        json!({"channelIndex": 1}),
    ));

    let first = rx.recv().await.unwrap();
    assert_eq!(first.event, "AgoraRtmChannel_join");
    assert_eq!(first.obj_index, Handle(1));

    let _ = gate.send(());
    let second = rx.recv().await.unwrap();
    assert_eq!(second.event, "AgoraRtmChannel_join");
    assert_eq!(second.obj_index, Handle(0));
    assert_eq!(second.error_code, Some(0));
}

#[tokio::test]
async fn release_twice_reports_released_then_not_found() {
    let (bridge, engine, _rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createChannel",
        json!({"clientIndex": 0, "channelId": "room1"}),
    ));

    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmChannel_release",
            json!({"channelIndex": 0}),
        )),
        Reply::Released(true)
    );
    assert!(engine.session(0).channel(0).is_released());
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmChannel_release",
            json!({"channelIndex": 0}),
        )),
        Reply::Released(false)
    );
}

#[tokio::test(start_paused = true)]
async fn push_events_after_release_are_suppressed() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));

    // Live object: the event is delivered, tagged with its handle.
    engine
        .session(0)
        .push_notice(SessionNotice::ConnectionStateChanged { state: 3, reason: 1 });
    let live = rx.recv().await.unwrap();
    assert_eq!(live.event, "AgoraRtmClient_onConnectionStateChanged");
    assert_eq!(live.obj_index, Handle(0));

    // Released object: the pump finds no addressee and drops the event.
    assert!(bridge.registry().release_session(Handle(0)));
    engine
        .session(0)
        .push_notice(SessionNotice::MessageReceived {
            message: MessageBody::new("late"),
            peer_id: "bob".into(),
        });
    expect_no_envelope(&mut rx).await;
}

#[tokio::test(start_paused = true)]
async fn released_channel_emits_no_membership_events() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createChannel",
        json!({"clientIndex": 0, "channelId": "room1"}),
    ));
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmChannel_release",
            json!({"channelIndex": 0}),
        )),
        Reply::Released(true)
    );

    // The engine closed the notice stream on release.
    assert!(!engine.session(0).channel(0).push_notice(ChannelNotice::MemberJoined {
        member: ChannelMember {
            user_id: "alice".into(),
            channel_id: "room1".into(),
        },
    }));
    expect_no_envelope(&mut rx).await;
}

#[tokio::test(start_paused = true)]
async fn release_racing_an_in_flight_join_suppresses_the_outcome() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createChannel",
        json!({"clientIndex": 0, "channelId": "room1"}),
    ));

    let gate = engine.session(0).channel(0).gate_next_join();
    let _ = bridge.handle_request(&request(
        "AgoraRtmChannel_join",
        json!({"channelIndex": 0}),
    ));

    // Release wins the race; the join completion finds no addressee.
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmChannel_release",
            json!({"channelIndex": 0}),
        )),
        Reply::Released(true)
    );
    let _ = gate.send(());
    expect_no_envelope(&mut rx).await;
}

#[tokio::test]
async fn malformed_handle_degrades_and_is_answered() {
    let (bridge, engine, mut rx) = make_bridge();

    let reply = bridge.handle_request(&request(
        "AgoraRtmClient_logout",
        json!({"clientIndex": "zero"}),
    ));
    assert_eq!(reply, Reply::Accepted);

    // The degraded sentinel can never resolve; the host still gets its
    // one outcome, addressed to the requested (invalid) handle.
    let env = rx.recv().await.unwrap();
    assert_eq!(env.obj_index, Handle::INVALID);
    assert_eq!(env.error_code, Some(-1));
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test]
async fn unknown_command_is_unhandled_and_silent() {
    let (bridge, engine, mut rx) = make_bridge();
    let reply = bridge.handle_request(&request("AgoraRtmClient_teleport", json!({})));
    assert_eq!(reply, Reply::Unhandled);
    assert_eq!(engine.session_count(), 0);
    drop(bridge);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn independent_sessions_keep_their_own_channels() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "Y"}),
    ));
    assert_eq!(engine.session_count(), 2);

    // Channels created from different sessions share one channel
    // counter: handles 0 and 1.
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmClient_createChannel",
            json!({"clientIndex": 0, "channelId": "a"}),
        )),
        Reply::Handle(Handle(0))
    );
    assert_eq!(
        bridge.handle_request(&request(
            "AgoraRtmClient_createChannel",
            json!({"clientIndex": 1, "channelId": "b"}),
        )),
        Reply::Handle(Handle(1))
    );

    // Each channel's events carry its own handle.
    let member = ChannelMember {
        user_id: "alice".into(),
        channel_id: "b".into(),
    };
    assert!(engine.session(1).channel(0).push_notice(ChannelNotice::MemberLeft {
        member,
    }));
    let env = rx.recv().await.unwrap();
    assert_eq!(env.event, "AgoraRtmChannel_onMemberLeft");
    assert_eq!(env.obj_index, Handle(1));
}

#[tokio::test]
async fn login_after_session_created_targets_the_right_instance() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "Y"}),
    ));

    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_login",
        json!({"clientIndex": 1, "token": "tok", "userId": "alice"}),
    ));

    let env = rx.recv().await.unwrap();
    assert_eq!(env.obj_index, Handle(1));
    assert!(engine.session(0).calls().is_empty());
    assert_eq!(engine.session(1).calls(), vec!["login(tok, alice)"]);
}

#[tokio::test]
async fn get_members_payload_lists_user_and_channel_ids() {
    let (bridge, engine, mut rx) = make_bridge();
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createInstance",
        json!({"appId": "X"}),
    ));
    let _ = bridge.handle_request(&request(
        "AgoraRtmClient_createChannel",
        json!({"clientIndex": 0, "channelId": "room1"}),
    ));
    engine.session(0).channel(0).set_members(vec![
        ChannelMember {
            user_id: "alice".into(),
            channel_id: "room1".into(),
        },
        ChannelMember {
            user_id: "bob".into(),
            channel_id: "room1".into(),
        },
    ]);

    let _ = bridge.handle_request(&request(
        "AgoraRtmChannel_getMembers",
        json!({"channelIndex": 0}),
    ));

    let env = rx.recv().await.unwrap();
    assert_eq!(env.error_code, Some(0));
    let members = env.payload["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["userId"], "alice");
    assert_eq!(members[0]["channelId"], "room1");
}
