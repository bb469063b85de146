//! WebSocket message types for real-time session events.
//!
//! Events only carry what every participant may see: the word and the
//! imposter identities appear in `game_over` alone.

use serde::{Deserialize, Serialize};

use crate::game::{Action, GameMode, GameState, Session, SessionCode, Winner};

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Envelope sent from server to every subscribed WebSocket client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsEvent {
    /// Discriminator so clients can switch on event type.
    #[serde(rename = "type")]
    pub event_type: WsEventType,
    /// Event-specific payload.
    #[serde(flatten)]
    pub payload: WsPayload,
}

/// Event type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsEventType {
    PlayerJoined,
    GameStarted,
    TurnAdvanced,
    PlayerEliminated,
    GameOver,
    SessionEnded,
    Error,
    Pong,
    Subscribed,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WsPayload {
    Snapshot(SnapshotPayload),
    PlayerJoined(PlayerJoinedPayload),
    GameStarted(GameStartedPayload),
    TurnAdvanced(TurnAdvancedPayload),
    PlayerEliminated(PlayerEliminatedPayload),
    GameOver(GameOverPayload),
    SessionEnded(SessionEndedPayload),
    Error(ErrorPayload),
    Pong(PongPayload),
}

/// Public snapshot of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub code: SessionCode,
    pub display_name: String,
    pub category: String,
    pub mode: GameMode,
    pub state: GameState,
    pub players: Vec<String>,
    pub eliminated: Vec<String>,
    pub current_player: Option<String>,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoinedPayload {
    pub code: SessionCode,
    pub player: String,
    pub player_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartedPayload {
    pub code: SessionCode,
    pub player_order: Vec<String>,
    pub current_player: Option<String>,
    pub imposter_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnAdvancedPayload {
    pub code: SessionCode,
    pub current_player: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEliminatedPayload {
    pub code: SessionCode,
    pub player: String,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverPayload {
    pub code: SessionCode,
    pub state: GameState,
    pub winner: Option<Winner>,
    pub word: String,
    pub imposters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedPayload {
    pub code: SessionCode,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Client → Server commands
// ---------------------------------------------------------------------------

/// Commands sent from client to server over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    Subscribe { code: SessionCode },
    Unsubscribe { code: SessionCode },
    Ping,
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

fn snapshot(session: &Session) -> SnapshotPayload {
    SnapshotPayload {
        code: session.code(),
        display_name: session.display_name.clone(),
        category: session.category().to_string(),
        mode: session.mode(),
        state: session.state(),
        players: session.players().to_vec(),
        eliminated: session.eliminated().to_vec(),
        current_player: session.current_player().map(str::to_string),
        winner: session.winner(),
    }
}

impl WsEvent {
    /// Events a committed action produces, in the order clients see them.
    pub fn for_action(session: &Session, action: Action, player: Option<&str>) -> Vec<Self> {
        let player = player.unwrap_or_default();
        match action {
            Action::Join => vec![Self::player_joined(session, player)],
            Action::Start => vec![Self::game_started(session)],
            Action::NextPlayer => vec![Self::turn_advanced(session)],
            Action::Eliminate => {
                let mut events = vec![Self::player_eliminated(session, player)];
                if matches!(session.state(), GameState::Won | GameState::Lost) {
                    events.push(Self::game_over(session));
                }
                events
            }
            Action::End => vec![Self::session_ended(session)],
        }
    }

    /// First event on every connection.
    pub fn subscribed(session: &Session) -> Self {
        WsEvent {
            event_type: WsEventType::Subscribed,
            payload: WsPayload::Snapshot(snapshot(session)),
        }
    }

    pub fn player_joined(session: &Session, player: &str) -> Self {
        WsEvent {
            event_type: WsEventType::PlayerJoined,
            payload: WsPayload::PlayerJoined(PlayerJoinedPayload {
                code: session.code(),
                player: player.to_string(),
                player_count: session.players().len(),
            }),
        }
    }

    pub fn game_started(session: &Session) -> Self {
        WsEvent {
            event_type: WsEventType::GameStarted,
            payload: WsPayload::GameStarted(GameStartedPayload {
                code: session.code(),
                player_order: session.player_order().to_vec(),
                current_player: session.current_player().map(str::to_string),
                imposter_count: session.imposter_count(),
            }),
        }
    }

    pub fn turn_advanced(session: &Session) -> Self {
        WsEvent {
            event_type: WsEventType::TurnAdvanced,
            payload: WsPayload::TurnAdvanced(TurnAdvancedPayload {
                code: session.code(),
                current_player: session.current_player().map(str::to_string),
            }),
        }
    }

    pub fn player_eliminated(session: &Session, player: &str) -> Self {
        WsEvent {
            event_type: WsEventType::PlayerEliminated,
            payload: WsPayload::PlayerEliminated(PlayerEliminatedPayload {
                code: session.code(),
                player: player.to_string(),
                remaining: session.players().len() - session.eliminated().len(),
            }),
        }
    }

    /// Reveals the word and the imposters; only sent once the round is decided.
    pub fn game_over(session: &Session) -> Self {
        WsEvent {
            event_type: WsEventType::GameOver,
            payload: WsPayload::GameOver(GameOverPayload {
                code: session.code(),
                state: session.state(),
                winner: session.winner(),
                word: session.word().to_string(),
                imposters: session.imposters().to_vec(),
            }),
        }
    }

    pub fn session_ended(session: &Session) -> Self {
        WsEvent {
            event_type: WsEventType::SessionEnded,
            payload: WsPayload::SessionEnded(SessionEndedPayload {
                code: session.code(),
                winner: session.winner(),
            }),
        }
    }

    pub fn error(message: &str) -> Self {
        WsEvent {
            event_type: WsEventType::Error,
            payload: WsPayload::Error(ErrorPayload {
                message: message.to_string(),
            }),
        }
    }

    pub fn pong() -> Self {
        WsEvent {
            event_type: WsEventType::Pong,
            payload: WsPayload::Pong(PongPayload {
                timestamp: chrono::Utc::now().timestamp_millis(),
            }),
        }
    }

    /// Serialize to JSON text for sending over WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","message":"serialization failed"}"#.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
