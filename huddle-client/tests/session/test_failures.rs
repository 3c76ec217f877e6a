use crate::utils::Harness;
use huddle_core::{PeerId, SdpKind, SessionDescription, SignalMessage, UserData};
use huddle_client::session::SessionEvent;

#[tokio::test]
async fn rejected_description_commit_notices_but_keeps_the_peer() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    transport.fail_remote_description();
    harness
        .signal_tx
        .send(SignalMessage::SessionDescription {
            peer_id: peer_id.clone(),
            session_description: SessionDescription {
                kind: SdpKind::Offer,
                sdp: "remote-offer".to_owned(),
            },
        })
        .await
        .unwrap();

    harness
        .wait_for_event(|e| matches!(e, SessionEvent::Notice { .. }))
        .await;

    // Degraded, not removed: the connectivity layer decides its fate later.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(
        !harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::PeerRemoved { .. })),
    );
    assert_eq!(transport.close_count(), 0);

    // Candidates for the degraded peer still buffer rather than error.
    harness.send_candidate(&peer_id, "candidate:degraded").await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(transport.candidate_applies().is_empty());
}

#[tokio::test]
async fn transport_setup_failure_surfaces_a_notice_and_adds_no_peer() {
    let mut harness = Harness::start().await;

    harness.factory.fail_next_create();
    harness
        .signal_tx
        .send(SignalMessage::AddPeer {
            peer_id: PeerId::new(),
            should_create_offer: true,
            user_data: UserData::new("doomed", "peer-agent"),
        })
        .await
        .unwrap();

    harness
        .wait_for_event(|e| matches!(e, SessionEvent::Notice { .. }))
        .await;
    assert!(
        !harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::PeerAdded { .. })),
    );

    // A later, healthy peer is unaffected.
    let (_ok_peer, transport) = harness.add_peer(true).await;
    assert!(transport.wait_for_calls(1, 1000).await);
}
