use crate::session::InternalEvent;
use huddle_core::PeerId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// One fixed-size window of frequency-bin amplitudes from a remote audio
/// stream.
pub type AudioFrame = Vec<u8>;

/// Sample a remote audio stream on a steady cadence and report talking
/// transitions. Talking is a bare threshold on the instantaneous mean; no
/// smoothing, no hysteresis.
///
/// The task runs until its frame source ends or the returned handle is
/// aborted (peer closed).
pub(crate) fn spawn(
    peer_id: PeerId,
    mut frames: mpsc::Receiver<AudioFrame>,
    threshold: f32,
    interval: Duration,
    events: mpsc::Sender<InternalEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut talking = false;

        loop {
            ticker.tick().await;

            // Only the freshest window matters per tick.
            let mut latest: Option<AudioFrame> = None;
            let mut closed = false;
            loop {
                match frames.try_recv() {
                    Ok(frame) => latest = Some(frame),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }

            if let Some(frame) = latest {
                if !frame.is_empty() {
                    let mean =
                        frame.iter().map(|&v| v as f32).sum::<f32>() / frame.len() as f32;
                    let now_talking = mean > threshold;
                    if now_talking != talking {
                        talking = now_talking;
                        if events
                            .send(InternalEvent::Talking {
                                peer_id: peer_id.clone(),
                                talking,
                            })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                }
            }

            if closed {
                debug!("audio stream for {peer_id} ended, stopping detector");
                if talking {
                    let _ = events
                        .send(InternalEvent::Talking {
                            peer_id,
                            talking: false,
                        })
                        .await;
                }
                return;
            }
        }
    })
}
