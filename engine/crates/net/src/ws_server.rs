use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use session::SessionId;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use crate::channels::{RegisterSession, RegisterTx, SessionWriteRx, UnregisterTx};
use crate::protocol::ClientCommand;
use crate::rate_limiter::ConnectionLimiter;

/// Session ids are process-unique and never reused.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// The engine side of the transport: one call per session lifecycle step.
///
/// Calls for one session arrive sequentially; calls for different sessions
/// interleave freely.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    async fn session_opened(&self, session_id: SessionId);
    async fn command(&self, session_id: SessionId, command: ClientCommand);
    /// An inbound frame that failed to decode into the command set.
    async fn malformed(&self, session_id: SessionId, detail: String);
    async fn session_closed(&self, session_id: SessionId);
}

/// Run the WebSocket server, accepting connections and spawning per-session
/// tasks until the process ends.
pub async fn run_ws_server(
    addr: String,
    handler: Arc<dyn SessionHandler>,
    register_tx: RegisterTx,
    unregister_tx: UnregisterTx,
    limiter: Arc<Mutex<ConnectionLimiter>>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("WebSocket server listening on {}", addr);
    accept_loop(listener, handler, register_tx, unregister_tx, limiter, None).await
}

/// Like [`run_ws_server`] but stops accepting when the shutdown signal fires.
pub async fn run_ws_server_with_shutdown(
    addr: String,
    handler: Arc<dyn SessionHandler>,
    register_tx: RegisterTx,
    unregister_tx: UnregisterTx,
    limiter: Arc<Mutex<ConnectionLimiter>>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("WebSocket server listening on {}", addr);
    accept_loop(
        listener,
        handler,
        register_tx,
        unregister_tx,
        limiter,
        Some(shutdown_rx),
    )
    .await
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<dyn SessionHandler>,
    register_tx: RegisterTx,
    unregister_tx: UnregisterTx,
    limiter: Arc<Mutex<ConnectionLimiter>>,
    mut shutdown_rx: Option<tokio::sync::watch::Receiver<bool>>,
) -> Result<(), std::io::Error> {
    loop {
        let accepted = if let Some(rx) = shutdown_rx.as_mut() {
            tokio::select! {
                accepted = listener.accept() => accepted,
                _ = rx.changed() => {
                    if *rx.borrow() {
                        tracing::info!("WebSocket server: shutdown signal received");
                        return Ok(());
                    }
                    continue;
                }
            }
        } else {
            listener.accept().await
        };

        let (stream, peer_addr) = accepted?;

        if let Err(rejection) = limiter.lock().unwrap().try_admit(peer_addr.ip()) {
            tracing::warn!(%peer_addr, %rejection, "Connection rejected");
            continue;
        }

        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::info!(?session_id, %peer_addr, "New WebSocket connection");

        let handler = handler.clone();
        let register_tx = register_tx.clone();
        let unregister_tx = unregister_tx.clone();
        let limiter = limiter.clone();
        let max_frame_bytes = limiter.lock().unwrap().max_frame_bytes();

        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws_stream) => {
                    handle_ws_session(
                        ws_stream,
                        session_id,
                        handler,
                        register_tx,
                        unregister_tx,
                        max_frame_bytes,
                    )
                    .await;
                }
                Err(e) => {
                    tracing::warn!(?session_id, "WebSocket handshake failed: {}", e);
                }
            }
            limiter.lock().unwrap().release(peer_addr.ip());
        });
    }
}

async fn handle_ws_session(
    ws_stream: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    session_id: SessionId,
    handler: Arc<dyn SessionHandler>,
    register_tx: RegisterTx,
    unregister_tx: UnregisterTx,
    max_frame_bytes: usize,
) {
    let (mut ws_writer, mut ws_reader) = ws_stream.split();

    // Register the write half before the engine can emit anything for us.
    let (write_tx, mut write_rx): (_, SessionWriteRx) = tokio::sync::mpsc::unbounded_channel();
    let _ = register_tx.send(RegisterSession {
        session_id,
        write_tx,
    });

    handler.session_opened(session_id).await;

    // Writer task: forward routed frames as WS text messages.
    let writer_handle = tokio::spawn(async move {
        while let Some(text) = write_rx.recv().await {
            if ws_writer.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_writer.close().await;
    });

    while let Some(result) = ws_reader.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if text.len() > max_frame_bytes {
                    handler
                        .malformed(session_id, format!("frame exceeds {max_frame_bytes} bytes"))
                        .await;
                    continue;
                }
                match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(command) => handler.command(session_id, command).await,
                    Err(e) => handler.malformed(session_id, e.to_string()).await,
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) => {
                // tungstenite answers pings automatically
            }
            Ok(_) => {} // ignore binary, pong
            Err(e) => {
                tracing::debug!(?session_id, "WebSocket read error: {}", e);
                break;
            }
        }
    }

    handler.session_closed(session_id).await;
    let _ = unregister_tx.send(session_id);

    writer_handle.abort();
    tracing::info!(?session_id, "WebSocket session ended");
}
