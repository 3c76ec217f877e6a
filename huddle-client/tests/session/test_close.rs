use crate::utils::Harness;
use huddle_core::{PeerId, SignalMessage};
use huddle_client::session::SessionEvent;
use huddle_client::transport::TransportEvent;

#[tokio::test]
async fn remove_peer_closes_once_and_is_idempotent() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    harness
        .signal_tx
        .send(SignalMessage::RemovePeer {
            peer_id: peer_id.clone(),
        })
        .await
        .unwrap();

    harness
        .wait_for_event(|e| matches!(e, SessionEvent::PeerRemoved { .. }))
        .await;
    assert_eq!(transport.close_count(), 1);

    // Closing twice is a no-op.
    harness
        .signal_tx
        .send(SignalMessage::RemovePeer {
            peer_id: peer_id.clone(),
        })
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(transport.close_count(), 1);
    assert!(
        !harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::PeerRemoved { .. })),
        "second remove must not emit again"
    );
}

#[tokio::test]
async fn remove_of_unknown_peer_changes_nothing() {
    let mut harness = Harness::start().await;
    let (known, transport) = harness.add_peer(false).await;

    harness
        .signal_tx
        .send(SignalMessage::RemovePeer {
            peer_id: PeerId::new(),
        })
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(transport.close_count(), 0);
    assert!(harness.factory.transport(&known).is_some());

    // Loop still serves the known peer.
    harness.send_candidate(&known, "candidate:alive").await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

#[tokio::test]
async fn connectivity_failure_triggers_the_close_transition() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(true).await;

    transport
        .emit(TransportEvent::ConnectionFailed(peer_id.clone()))
        .await;

    let event = harness
        .wait_for_event(|e| matches!(e, SessionEvent::PeerRemoved { .. }))
        .await;
    match event {
        SessionEvent::PeerRemoved { peer_id: removed } => assert_eq!(removed, peer_id),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(transport.close_count(), 1);
}

#[tokio::test]
async fn signaling_drop_tears_down_every_peer() {
    let mut harness = Harness::start().await;
    let (_a, transport_a) = harness.add_peer(true).await;
    let (_b, transport_b) = harness.add_peer(false).await;

    // Dropping the inbox sender is the transport-drop signal.
    let (dummy_tx, _dummy_rx) = tokio::sync::mpsc::channel(1);
    drop(std::mem::replace(&mut harness.signal_tx, dummy_tx));

    let mut removed = 0;
    while removed < 2 {
        harness
            .wait_for_event(|e| matches!(e, SessionEvent::PeerRemoved { .. }))
            .await;
        removed += 1;
    }
    assert_eq!(transport_a.close_count(), 1);
    assert_eq!(transport_b.close_count(), 1);
}
