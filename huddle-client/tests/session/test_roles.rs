use crate::utils::{Harness, TransportCall};
use huddle_core::{SdpKind, SessionDescription, SignalMessage};
use huddle_client::media::TrackKind;
use huddle_client::session::SessionEvent;

#[tokio::test]
async fn offerer_attaches_tracks_opens_channel_and_offers() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(true).await;

    assert!(transport.wait_for_calls(5, 1000).await, "{:?}", transport.calls());
    let calls = transport.calls();

    assert!(calls.contains(&TransportCall::AttachTrack(TrackKind::Audio)));
    assert!(calls.contains(&TransportCall::AttachTrack(TrackKind::Video)));
    assert!(calls.contains(&TransportCall::OpenChannel));

    let offer_pos = calls
        .iter()
        .position(|c| *c == TransportCall::CreateOffer)
        .expect("offerer must create an offer");
    assert_eq!(calls[offer_pos + 1], TransportCall::SetLocal(SdpKind::Offer));

    // The stored offer went out through the relay, addressed to the peer.
    let sent = harness.link.wait_for_sent(2, 1000).await;
    let relayed = sent.iter().any(|msg| {
        matches!(
            msg,
            SignalMessage::SessionDescription {
                peer_id: to,
                session_description: SessionDescription { kind: SdpKind::Offer, .. },
            } if *to == peer_id
        )
    });
    assert!(relayed, "offer not relayed: {sent:?}");
}

#[tokio::test]
async fn answerer_waits_then_answers_a_remote_offer() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    // Attach only; no offer, no channel from our side.
    transport.wait_for_calls(2, 1000).await;
    let calls = transport.calls();
    assert!(!calls.contains(&TransportCall::CreateOffer));
    assert!(!calls.contains(&TransportCall::OpenChannel));

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

    assert!(
        transport
            .wait_for_calls_matching(
                |call| *call == TransportCall::SetLocal(SdpKind::Answer),
                1000
            )
            .await
    );
    let calls = transport.calls();
    let remote_pos = calls
        .iter()
        .position(|c| *c == TransportCall::SetRemote(SdpKind::Offer))
        .expect("offer must be accepted as remote description");
    let answer_pos = calls
        .iter()
        .position(|c| *c == TransportCall::CreateAnswer)
        .expect("answer must be created");
    assert!(remote_pos < answer_pos);

    let sent = harness.link.wait_for_sent(2, 1000).await;
    assert!(sent.iter().any(|msg| matches!(
        msg,
        SignalMessage::SessionDescription {
            peer_id: to,
            session_description: SessionDescription { kind: SdpKind::Answer, .. },
        } if *to == peer_id
    )));
}

#[tokio::test]
async fn duplicate_add_refreshes_user_data_only() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(true).await;
    assert!(
        transport
            .wait_for_calls_matching(
                |call| *call == TransportCall::SetLocal(SdpKind::Offer),
                1000
            )
            .await
    );
    let calls_before = transport.calls().len();

    harness
        .signal_tx
        .send(SignalMessage::AddPeer {
            peer_id: peer_id.clone(),
            should_create_offer: true,
            user_data: huddle_core::UserData::new("renamed", "peer-agent"),
        })
        .await
        .unwrap();

    let event = harness
        .wait_for_event(|e| matches!(e, SessionEvent::DisplayName { .. }))
        .await;
    match event {
        SessionEvent::DisplayName { peer_id: id, name } => {
            assert_eq!(id, peer_id);
            assert_eq!(name, "renamed");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // No second connection setup happened.
    assert_eq!(transport.calls().len(), calls_before);
    assert!(harness.factory.transport(&peer_id).is_some());
}

#[tokio::test]
async fn candidates_from_transport_are_relayed() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    transport
        .emit(huddle_client::transport::TransportEvent::CandidateGenerated(
            peer_id.clone(),
            huddle_core::CandidateInit {
                candidate: "candidate:local-1".to_owned(),
                sdp_mid: Some("0".to_owned()),
                sdp_m_line_index: Some(0),
            },
        ))
        .await;

    let sent = harness.link.wait_for_sent(2, 1000).await;
    assert!(sent.iter().any(|msg| matches!(
        msg,
        SignalMessage::IceCandidate { peer_id: to, ice_candidate }
            if *to == peer_id && ice_candidate.candidate == "candidate:local-1"
    )));
}
