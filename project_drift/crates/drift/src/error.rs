use space::ExpandError;
use thiserror::Error;

/// What a command handler can fail with. Display text is what the issuing
/// session sees in its `error` event; internal detail goes to the log.
#[derive(Debug, Error)]
pub enum GameError {
    /// Valid command, refused by the game rules. No state was changed (any
    /// partial mutation has already been rolled back by the handler).
    #[error("{0}")]
    Refusal(String),

    /// The content generator failed; the exit is exactly as it was.
    #[error("The way ahead churns with mist but refuses to take shape. Try again.")]
    Expansion(#[from] ExpandError),

    /// Internal inconsistency (dangling exit target, occupant vanished across
    /// a suspension point). Availability over crashing: the user gets a
    /// refusal, the process keeps serving everyone else.
    #[error("Reality glitches for a moment. Try again.")]
    Glitch(String),
}

impl GameError {
    pub fn refusal(message: impl Into<String>) -> Self {
        Self::Refusal(message.into())
    }

    pub fn glitch(detail: impl Into<String>) -> Self {
        Self::Glitch(detail.into())
    }

    /// The issuing session disappeared mid-command.
    pub fn no_player() -> Self {
        Self::Glitch("player record missing for live session".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_displays_its_message() {
        let e = GameError::refusal("Your pack is full.");
        assert_eq!(e.to_string(), "Your pack is full.");
    }

    #[test]
    fn glitch_hides_internal_detail() {
        let e = GameError::glitch("exit north of hub points at missing room-9");
        assert!(!e.to_string().contains("room-9"));
        assert!(e.to_string().contains("Reality glitches"));
    }

    #[test]
    fn expansion_hides_cause() {
        let e = GameError::from(ExpandError::Generator("connection refused".into()));
        assert!(!e.to_string().contains("connection refused"));
    }
}
