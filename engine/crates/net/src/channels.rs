use session::{OutboundFrame, SessionId};
use tokio::sync::mpsc;

/// Sender from the engine into the output router.
pub type OutputTx = mpsc::UnboundedSender<OutboundFrame>;
/// Receiver in the output router for outbound frames.
pub type OutputRx = mpsc::UnboundedReceiver<OutboundFrame>;

/// Per-session write channel (output router -> session task).
pub type SessionWriteTx = mpsc::UnboundedSender<String>;
pub type SessionWriteRx = mpsc::UnboundedReceiver<String>;

/// Registration message for the output router.
#[derive(Debug)]
pub struct RegisterSession {
    pub session_id: SessionId,
    pub write_tx: SessionWriteTx,
}

pub type RegisterTx = mpsc::UnboundedSender<RegisterSession>;
pub type RegisterRx = mpsc::UnboundedReceiver<RegisterSession>;

pub type UnregisterTx = mpsc::UnboundedSender<SessionId>;
pub type UnregisterRx = mpsc::UnboundedReceiver<SessionId>;
