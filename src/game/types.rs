use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// How players take part in a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Players join remotely over time using the session code.
    Online,
    /// Full roster fixed at creation, one shared device.
    Local,
}

impl GameMode {
    pub fn as_str(&self) -> &str {
        match self {
            GameMode::Online => "online",
            GameMode::Local => "local",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GameState & Winner
// ---------------------------------------------------------------------------

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Waiting,
    Playing,
    /// Civilians caught every imposter.
    Won,
    /// Imposters reached parity with the civilians.
    Lost,
    /// Terminated by hand.
    Ended,
}

impl GameState {
    pub fn as_str(&self) -> &str {
        match self {
            GameState::Waiting => "waiting",
            GameState::Playing => "playing",
            GameState::Won => "won",
            GameState::Lost => "lost",
            GameState::Ended => "ended",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, GameState::Won | GameState::Lost | GameState::Ended)
    }

    /// Look up the transition table. Returns the state the session lands in
    /// when `action` is applied, or `None` when the action is illegal here.
    ///
    /// `Eliminate` reports `Playing`; the win check may move it further.
    pub fn apply(self, action: Action) -> Option<GameState> {
        use Action::*;
        use GameState::*;
        match (self, action) {
            (Waiting, Join) => Some(Waiting),
            (Waiting, Start) => Some(Playing),
            (Playing, NextPlayer) => Some(Playing),
            (Playing, Eliminate) => Some(Playing),
            (_, End) => Some(Ended),
            _ => None,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side won a finished round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Civilians,
    Imposters,
}

impl Winner {
    pub fn as_str(&self) -> &str {
        match self {
            Winner::Civilians => "civilians",
            Winner::Imposters => "imposters",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Every mutation a client can request on an existing session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Join,
    Start,
    NextPlayer,
    Eliminate,
    End,
}

impl Action {
    /// Parse from string (case-insensitive). `join` is not accepted here
    /// because it has its own endpoint.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" => Some(Action::Start),
            "next_player" | "next" => Some(Action::NextPlayer),
            "eliminate" => Some(Action::Eliminate),
            "end" => Some(Action::End),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Join => "join",
            Action::Start => "start",
            Action::NextPlayer => "next_player",
            Action::Eliminate => "eliminate",
            Action::End => "end",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GameError
// ---------------------------------------------------------------------------

/// Domain errors for session operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session not found: {0}")]
    NotFound(u32),

    #[error("action not available in {mode} mode: {action}")]
    InvalidMode { mode: GameMode, action: Action },

    #[error("player already in session: {0}")]
    DuplicatePlayer(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("cannot {action} while session is {state}")]
    InvalidTransition { action: Action, state: GameState },

    #[error("no free session code after {0} attempts")]
    CodeSpaceExhausted(usize),

    #[error("session store failure: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_strings() {
        assert_eq!(GameState::Waiting.as_str(), "waiting");
        assert_eq!(GameState::Playing.as_str(), "playing");
        assert_eq!(GameState::Won.as_str(), "won");
        assert_eq!(GameState::Lost.as_str(), "lost");
        assert_eq!(GameState::Ended.as_str(), "ended");
    }

    #[test]
    fn finished_states() {
        assert!(!GameState::Waiting.is_finished());
        assert!(!GameState::Playing.is_finished());
        assert!(GameState::Won.is_finished());
        assert!(GameState::Lost.is_finished());
        assert!(GameState::Ended.is_finished());
    }

    #[test]
    fn transition_table_moves_forward_only() {
        assert_eq!(
            GameState::Waiting.apply(Action::Start),
            Some(GameState::Playing)
        );
        assert_eq!(GameState::Playing.apply(Action::Start), None);
        assert_eq!(GameState::Playing.apply(Action::Join), None);
        assert_eq!(GameState::Waiting.apply(Action::NextPlayer), None);
        assert_eq!(GameState::Waiting.apply(Action::Eliminate), None);
        assert_eq!(GameState::Won.apply(Action::Eliminate), None);
        assert_eq!(GameState::Lost.apply(Action::NextPlayer), None);
        assert_eq!(GameState::Ended.apply(Action::Start), None);
    }

    #[test]
    fn end_is_reachable_from_every_state() {
        for state in [
            GameState::Waiting,
            GameState::Playing,
            GameState::Won,
            GameState::Lost,
            GameState::Ended,
        ] {
            assert_eq!(state.apply(Action::End), Some(GameState::Ended));
        }
    }

    #[test]
    fn action_parse_loose() {
        assert_eq!(Action::from_str_loose("START"), Some(Action::Start));
        assert_eq!(
            Action::from_str_loose("next_player"),
            Some(Action::NextPlayer)
        );
        assert_eq!(Action::from_str_loose(" end "), Some(Action::End));
        assert_eq!(Action::from_str_loose("join"), None);
        assert_eq!(Action::from_str_loose("won"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&GameState::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
        let mode: GameMode = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(mode, GameMode::Local);
        let json = serde_json::to_string(&Winner::Imposters).unwrap();
        assert_eq!(json, "\"imposters\"");
    }

    #[test]
    fn error_messages() {
        let err = GameError::InvalidTransition {
            action: Action::Start,
            state: GameState::Playing,
        };
        assert_eq!(err.to_string(), "cannot start while session is playing");
        let err = GameError::InvalidMode {
            mode: GameMode::Local,
            action: Action::Join,
        };
        assert_eq!(err.to_string(), "action not available in local mode: join");
    }
}
