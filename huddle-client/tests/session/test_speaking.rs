use crate::utils::Harness;
use huddle_core::SignalMessage;
use huddle_client::session::SessionEvent;
use huddle_client::transport::TransportEvent;
use tokio::sync::mpsc;

#[tokio::test]
async fn remote_audio_drives_the_talking_flag() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    let (frame_tx, frame_rx) = mpsc::channel(8);
    transport
        .emit(TransportEvent::RemoteAudio(peer_id.clone(), frame_rx))
        .await;

    frame_tx.send(vec![200u8; 32]).await.unwrap();
    let event = harness
        .wait_for_event(|e| matches!(e, SessionEvent::Talking { .. }))
        .await;
    match event {
        SessionEvent::Talking { peer_id: id, talking } => {
            assert_eq!(id, peer_id);
            assert!(talking);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    frame_tx.send(vec![0u8; 32]).await.unwrap();
    let event = harness
        .wait_for_event(|e| matches!(e, SessionEvent::Talking { .. }))
        .await;
    assert!(matches!(
        event,
        SessionEvent::Talking { talking: false, .. }
    ));
}

#[tokio::test]
async fn closing_the_peer_stops_its_detector() {
    let mut harness = Harness::start().await;
    let (peer_id, transport) = harness.add_peer(false).await;

    let (frame_tx, frame_rx) = mpsc::channel(8);
    transport
        .emit(TransportEvent::RemoteAudio(peer_id.clone(), frame_rx))
        .await;

    frame_tx.send(vec![200u8; 32]).await.unwrap();
    harness
        .wait_for_event(|e| matches!(e, SessionEvent::Talking { talking: true, .. }))
        .await;

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

    // The aborted detector reports nothing further, even for loud frames.
    let _ = frame_tx.send(vec![255u8; 32]).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(
        !harness
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::Talking { .. })),
    );
}
