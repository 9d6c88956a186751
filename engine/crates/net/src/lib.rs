pub mod channels;
pub mod http;
pub mod output_router;
pub mod protocol;
pub mod rate_limiter;
pub mod ws_server;

pub use protocol::{ClientCommand, EventFrame, ServerEvent};
pub use ws_server::SessionHandler;
