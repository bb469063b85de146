//! The session entity and its state transitions.
//!
//! `Session` owns the roster, role assignment, turn rotation, elimination
//! and win evaluation. It is pure data plus rules: persistence, locking and
//! code allocation live in [`SessionManager`](super::manager::SessionManager).

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::game::types::{Action, GameError, GameMode, GameState, Winner};

/// Numeric join key shared between players.
pub type SessionCode = u32;

/// Minimum roster size for a round to start.
pub const MIN_PLAYERS: usize = 2;

// =========================================================================
// Session
// =========================================================================

/// One round of the party game.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    code: SessionCode,
    category: String,
    word: String,
    players: Vec<String>,
    imposter_count: usize,
    imposters: Vec<String>,
    player_order: Vec<String>,
    eliminated: Vec<String>,
    current_player: Option<String>,
    mode: GameMode,
    state: GameState,
    winner: Option<Winner>,

    // Metadata
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Open an online lobby with its creator as the only player. Imposters
    /// are drawn when the session starts.
    pub fn new_online(
        code: SessionCode,
        category: String,
        word: String,
        imposter_count: usize,
        player_name: &str,
        display_name: Option<String>,
    ) -> Result<Self, GameError> {
        let player = normalize_name(player_name)?;
        Ok(Self::blank(
            code,
            category,
            word,
            vec![player],
            imposter_count,
            GameMode::Online,
            display_name,
        ))
    }

    /// Create a single-device session with the roster fixed up front.
    /// Imposters are drawn immediately.
    pub fn new_local<R: Rng + ?Sized>(
        code: SessionCode,
        category: String,
        word: String,
        imposter_count: usize,
        players: &[String],
        display_name: Option<String>,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if players.len() < MIN_PLAYERS {
            return Err(GameError::InvalidInput(format!(
                "a local session needs at least {MIN_PLAYERS} players, got {}",
                players.len()
            )));
        }
        if imposter_count >= players.len() {
            return Err(GameError::InvalidInput(format!(
                "{imposter_count} imposters is too many for {} players",
                players.len()
            )));
        }

        let mut roster: Vec<String> = Vec::with_capacity(players.len());
        for name in players {
            let name = normalize_name(name)?;
            if roster.contains(&name) {
                return Err(GameError::DuplicatePlayer(name));
            }
            roster.push(name);
        }

        let mut session = Self::blank(
            code,
            category,
            word,
            roster,
            imposter_count,
            GameMode::Local,
            display_name,
        );
        session.player_order = session.players.clone();
        session.assign_imposters(rng);
        Ok(session)
    }

    fn blank(
        code: SessionCode,
        category: String,
        word: String,
        players: Vec<String>,
        imposter_count: usize,
        mode: GameMode,
        display_name: Option<String>,
    ) -> Self {
        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Game {code}"));
        let now = Utc::now();
        Self {
            code,
            category,
            word,
            players,
            imposter_count,
            imposters: Vec::new(),
            player_order: Vec::new(),
            eliminated: Vec::new(),
            current_player: None,
            mode,
            state: GameState::Waiting,
            winner: None,
            display_name,
            created_at: now,
            updated_at: now,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn code(&self) -> SessionCode {
        self.code
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The secret word. Callers projecting to players go through
    /// [`PlayerView`](super::view::PlayerView), which redacts it.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Roster in join order.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn imposter_count(&self) -> usize {
        self.imposter_count
    }

    /// Empty until roles are assigned.
    pub fn imposters(&self) -> &[String] {
        &self.imposters
    }

    pub fn player_order(&self) -> &[String] {
        &self.player_order
    }

    pub fn eliminated(&self) -> &[String] {
        &self.eliminated
    }

    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.players.iter().any(|p| p == name)
    }

    pub fn is_imposter(&self, name: &str) -> bool {
        self.imposters.iter().any(|p| p == name)
    }

    pub fn is_eliminated(&self, name: &str) -> bool {
        self.eliminated.iter().any(|p| p == name)
    }

    /// Local sessions draw roles at creation, online ones at start.
    pub fn roles_assigned(&self) -> bool {
        self.mode == GameMode::Local || self.state != GameState::Waiting
    }

    /// Players still in the round, in turn order.
    pub fn active_players(&self) -> Vec<&str> {
        self.player_order
            .iter()
            .filter(|p| !self.is_eliminated(p))
            .map(String::as_str)
            .collect()
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    /// Validate `action` against the transition table without applying it.
    pub fn check_transition(&self, action: Action) -> Result<GameState, GameError> {
        self.state
            .apply(action)
            .ok_or(GameError::InvalidTransition {
                action,
                state: self.state,
            })
    }

    /// Append a player to an online lobby holding at most `max_players`.
    pub fn join(&mut self, player_name: &str, max_players: usize) -> Result<(), GameError> {
        if self.mode != GameMode::Online {
            return Err(GameError::InvalidMode {
                mode: self.mode,
                action: Action::Join,
            });
        }
        self.check_transition(Action::Join)?;
        let name = normalize_name(player_name)?;
        if self.has_player(&name) {
            return Err(GameError::DuplicatePlayer(name));
        }
        if self.players.len() >= max_players {
            return Err(GameError::InvalidInput(format!(
                "session is full ({max_players} players)"
            )));
        }
        self.players.push(name);
        self.touch();
        Ok(())
    }

    /// Fix the turn order, draw imposters if not done yet, and hand the
    /// first turn to the head of the order.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let next = self.check_transition(Action::Start)?;
        if self.mode == GameMode::Online && self.players.len() < MIN_PLAYERS {
            return Err(GameError::InvalidInput(format!(
                "need at least {MIN_PLAYERS} players to start, have {}",
                self.players.len()
            )));
        }
        if self.imposter_count >= self.players.len() {
            return Err(GameError::InvalidInput(format!(
                "{} imposters is too many for {} players",
                self.imposter_count,
                self.players.len()
            )));
        }

        if self.player_order.is_empty() {
            self.player_order = self.players.clone();
        }
        if self.imposters.is_empty() {
            self.assign_imposters(rng);
        }
        self.current_player = self.player_order.first().cloned();
        self.state = next;
        self.touch();
        Ok(())
    }

    /// Pass the turn to the next player who is still in, wrapping around.
    pub fn advance_turn(&mut self) -> Result<(), GameError> {
        self.check_transition(Action::NextPlayer)?;
        let available = self.active_players();
        if available.is_empty() {
            return Ok(());
        }
        let index = self
            .current_player
            .as_deref()
            .and_then(|cur| available.iter().position(|p| *p == cur))
            .unwrap_or(0);
        let next = available[(index + 1) % available.len()].to_string();
        self.current_player = Some(next);
        self.touch();
        Ok(())
    }

    /// Vote a player out, then evaluate the win condition on the
    /// post-elimination sets. Eliminating someone twice changes nothing.
    pub fn eliminate(&mut self, player_name: &str) -> Result<(), GameError> {
        self.check_transition(Action::Eliminate)?;
        let name = player_name.trim();
        if !self.has_player(name) {
            return Err(GameError::InvalidInput(format!(
                "no such player in session: {name}"
            )));
        }
        if !self.is_eliminated(name) {
            self.eliminated.push(name.to_string());
        }
        self.evaluate_winner();
        self.touch();
        Ok(())
    }

    /// Terminate the session. Any state may end; ending twice is a no-op.
    pub fn end(&mut self) {
        if let Ok(next) = self.check_transition(Action::End) {
            if self.state != next {
                self.state = next;
                self.touch();
            }
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn assign_imposters<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let count = self.imposter_count.min(self.players.len());
        let chosen: Vec<&String> = self.players.choose_multiple(rng, count).collect();
        // Keep roster order so the stored set is stable.
        self.imposters = self
            .players
            .iter()
            .filter(|p| chosen.contains(p))
            .cloned()
            .collect();
    }

    /// Civilians win once every imposter is out; imposters win as soon as
    /// they are at least as many as the surviving civilians.
    fn evaluate_winner(&mut self) {
        let remaining_imposters = self
            .imposters
            .iter()
            .filter(|p| !self.is_eliminated(p))
            .count();
        let remaining_players = self
            .players
            .iter()
            .filter(|p| !self.is_eliminated(p))
            .count();

        if remaining_imposters == 0 {
            self.state = GameState::Won;
            self.winner = Some(Winner::Civilians);
        } else if remaining_imposters >= remaining_players - remaining_imposters {
            self.state = GameState::Lost;
            self.winner = Some(Winner::Imposters);
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[cfg(test)]
    pub(crate) fn set_imposters_for_test(&mut self, imposters: &[&str]) {
        self.imposters = imposters.iter().map(|s| s.to_string()).collect();
    }
}

/// Trim a player name and reject blank ones.
pub fn normalize_name(name: &str) -> Result<String, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidInput("player name must not be empty".into()));
    }
    Ok(name.to_string())
}

// =========================================================================
// Tests
// =========================================================================
