use crate::utils::Harness;
use huddle_core::PeerId;
use huddle_client::protocol::{DataEnvelope, EnvelopeKind};
use huddle_client::session::{SessionCommand, SessionEvent};
use std::time::Duration;

fn reaction(sender: &PeerId, symbol: &str) -> Vec<u8> {
    DataEnvelope {
        kind: EnvelopeKind::Reaction,
        name: "peer".to_owned(),
        peer_id: sender.clone(),
        message: symbol.to_owned(),
        date: "2024-05-01T10:00:00Z".to_owned(),
    }
    .encode()
    .unwrap()
    .to_vec()
}

#[tokio::test]
async fn reaction_shows_and_auto_clears() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    transport.receive(reaction(&peer_id, "wave")).await;

    let shown = harness
        .wait_for_event(|e| matches!(e, SessionEvent::Reaction { .. }))
        .await;
    assert!(matches!(
        shown,
        SessionEvent::Reaction { symbol: Some(ref s), .. } if s == "wave"
    ));

    // The 80 ms test window elapses and the clear fires.
    let cleared = harness
        .wait_for_event(|e| matches!(e, SessionEvent::Reaction { symbol: None, .. }))
        .await;
    assert!(matches!(
        cleared,
        SessionEvent::Reaction { peer_id: ref id, symbol: None } if *id == peer_id
    ));
}

#[tokio::test]
async fn newer_reaction_survives_the_superseded_ones_clear() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    transport.receive(reaction(&peer_id, "first")).await;
    harness
        .wait_for_event(
            |e| matches!(e, SessionEvent::Reaction { symbol: Some(s), .. } if s == "first"),
        )
        .await;

    // Replace inside the display window.
    tokio::time::sleep(Duration::from_millis(20)).await;
    transport.receive(reaction(&peer_id, "second")).await;
    harness
        .wait_for_event(
            |e| matches!(e, SessionEvent::Reaction { symbol: Some(s), .. } if s == "second"),
        )
        .await;

    // Past both windows: exactly one clear, from the second reaction's timer.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let clears = harness
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Reaction { symbol: None, .. }))
        .count();
    assert_eq!(clears, 1, "the superseded clear must not fire twice");
}

#[tokio::test]
async fn local_reaction_mirrors_the_same_path() {
    let mut harness = Harness::start().await;
    let (_peer_id, transport) = harness.add_peer(true).await;
    transport.open_side_channel().await;

    harness
        .handle
        .commands
        .send(SessionCommand::SendReaction("clap".to_owned()))
        .await
        .unwrap();

    let shown = harness
        .wait_for_event(|e| matches!(e, SessionEvent::Reaction { .. }))
        .await;
    match shown {
        SessionEvent::Reaction { peer_id, symbol } => {
            assert_eq!(peer_id, harness.local_id);
            assert_eq!(symbol.as_deref(), Some("clap"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Broadcast went out as a reaction envelope.
    let ok = transport
        .wait_for_calls_matching(
            |call| {
                matches!(
                    call,
                    crate::utils::TransportCall::Send(payload)
                        if DataEnvelope::decode(payload)
                            .map(|e| e.kind == EnvelopeKind::Reaction)
                            .unwrap_or(false)
                )
            },
            1000,
        )
        .await;
    assert!(ok, "reaction envelope not broadcast");

    harness
        .wait_for_event(|e| matches!(e, SessionEvent::Reaction { symbol: None, .. }))
        .await;
}
