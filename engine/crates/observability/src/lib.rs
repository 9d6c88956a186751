use std::time::Instant;

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Wall-clock timer for one dispatched command, logged on completion.
///
/// Collaborator awaits are included in the measurement: a slow generator
/// shows up here rather than anywhere process-wide, since it only ever
/// stalls the issuing command.
#[derive(Debug)]
pub struct CommandTimer {
    command: &'static str,
    session: u64,
    started: Instant,
}

impl CommandTimer {
    const BUDGET_US: u128 = 250_000;

    pub fn start(command: &'static str, session: u64) -> Self {
        Self {
            command,
            session,
            started: Instant::now(),
        }
    }

    pub fn finish(self) {
        let elapsed_us = self.started.elapsed().as_micros();
        if elapsed_us > Self::BUDGET_US {
            tracing::warn!(
                command = self.command,
                session = self.session,
                elapsed_us,
                "command exceeded budget ({}us > {}us)",
                elapsed_us,
                Self::BUDGET_US
            );
        } else {
            tracing::debug!(
                command = self.command,
                session = self.session,
                elapsed_us,
                "command handled"
            );
        }
    }
}
