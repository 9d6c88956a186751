use std::collections::HashMap;

use session::SessionId;

use crate::channels::{OutputRx, RegisterRx, SessionWriteTx, UnregisterRx};

/// Routes outbound frames to the correct per-session write channel.
///
/// Frames for sessions that were never registered, or already unregistered,
/// are dropped silently; disconnection cleanup and in-flight broadcasts are
/// allowed to cross.
pub async fn run_output_router(
    mut output_rx: OutputRx,
    mut register_rx: RegisterRx,
    mut unregister_rx: UnregisterRx,
) {
    let mut writers: HashMap<SessionId, SessionWriteTx> = HashMap::new();

    loop {
        tokio::select! {
            Some(reg) = register_rx.recv() => {
                tracing::debug!(session_id = ?reg.session_id, "Output router: session registered");
                writers.insert(reg.session_id, reg.write_tx);
            }
            Some(session_id) = unregister_rx.recv() => {
                tracing::debug!(session_id = ?session_id, "Output router: session unregistered");
                writers.remove(&session_id);
            }
            Some(frame) = output_rx.recv() => {
                if let Some(tx) = writers.get(&frame.session_id) {
                    if tx.send(frame.payload).is_err() {
                        tracing::debug!(session_id = ?frame.session_id, "Output router: session write channel closed");
                        writers.remove(&frame.session_id);
                    } else if frame.disconnect {
                        tracing::debug!(session_id = ?frame.session_id, "Output router: disconnect requested, dropping writer");
                        writers.remove(&frame.session_id);
                    }
                }
            }
            else => break,
        }
    }

    tracing::info!("Output router shutting down");
}
