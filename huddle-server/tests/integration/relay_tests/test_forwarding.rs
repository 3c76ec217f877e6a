use crate::create_test_registry;
use crate::utils::Outgoing;
use huddle_core::{CandidateInit, PeerId, RoomId, SdpKind, SessionDescription, UserData};
use huddle_server::registry::RegistryCommand;

async fn join(tx: &tokio::sync::mpsc::Sender<RegistryCommand>, peer_id: &PeerId, name: &str) {
    tx.send(RegistryCommand::Join {
        peer_id: peer_id.clone(),
        room: RoomId::from("standup"),
        user_data: UserData::new(name, "test-agent"),
    })
    .await
    .expect("registry gone");
}

fn candidate(text: &str) -> CandidateInit {
    CandidateInit {
        candidate: text.to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
    }
}

#[tokio::test]
async fn descriptions_and_candidates_pass_through_untouched_in_order() {
    let (tx, output) = create_test_registry();

    let a = PeerId::new();
    let b = PeerId::new();
    join(&tx, &a, "a").await;
    join(&tx, &b, "b").await;

    let sdp = "v=0\r\no=- 46117 2 IN IP4 127.0.0.1\r\ns=-\r\n";
    tx.send(RegistryCommand::RelayDescription {
        from: a.clone(),
        to: b.clone(),
        description: SessionDescription {
            kind: SdpKind::Offer,
            sdp: sdp.to_owned(),
        },
    })
    .await
    .unwrap();
    for text in ["candidate:1", "candidate:2", "candidate:3"] {
        tx.send(RegistryCommand::RelayCandidate {
            from: a.clone(),
            to: b.clone(),
            candidate: candidate(text),
        })
        .await
        .unwrap();
    }

    // 2 join signals + 4 relayed.
    assert!(output.wait_for_signals(6, 1000).await);

    let to_b: Vec<Outgoing> = output
        .for_recipient(&b)
        .await
        .into_iter()
        .filter(|signal| !matches!(signal, Outgoing::AddPeer { .. }))
        .collect();

    match &to_b[0] {
        Outgoing::Description {
            from, description, ..
        } => {
            assert_eq!(*from, a);
            assert_eq!(description.kind, SdpKind::Offer);
            assert_eq!(description.sdp, sdp, "payload must pass through untouched");
        }
        other => panic!("expected the description first, got {other:?}"),
    }

    let relayed: Vec<String> = to_b[1..]
        .iter()
        .map(|signal| match signal {
            Outgoing::Candidate { candidate, .. } => candidate.candidate.clone(),
            other => panic!("expected candidates, got {other:?}"),
        })
        .collect();
    assert_eq!(
        relayed,
        vec!["candidate:1", "candidate:2", "candidate:3"],
        "per-pair order must hold"
    );
}

#[tokio::test]
async fn relay_is_addressed_not_broadcast() {
    let (tx, output) = create_test_registry();

    let a = PeerId::new();
    let b = PeerId::new();
    let c = PeerId::new();
    join(&tx, &a, "a").await;
    join(&tx, &b, "b").await;
    join(&tx, &c, "c").await;
    assert!(output.wait_for_signals(6, 1000).await);

    tx.send(RegistryCommand::RelayCandidate {
        from: a.clone(),
        to: b.clone(),
        candidate: candidate("candidate:ab"),
    })
    .await
    .unwrap();
    assert!(output.wait_for_signals(7, 1000).await);

    assert!(
        !output
            .for_recipient(&c)
            .await
            .iter()
            .any(|signal| matches!(signal, Outgoing::Candidate { .. })),
        "an addressed relay must reach only its recipient"
    );
}
