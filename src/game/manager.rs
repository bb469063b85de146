//! Session manager: the lifecycle front door.
//!
//! Every mutation is a read-modify-write against the [`SessionStore`] done
//! under a per-code mutex, so concurrent requests on one session are
//! serialized and never lose updates. Requests on different sessions do not
//! contend. Lock entries exist only for stored codes with a mutation in
//! flight.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::catalog::WordCatalog;
use super::events::SessionObserver;
use super::session::{Session, SessionCode};
use super::store::SessionStore;
use super::types::{Action, GameError};
use super::view::PlayerView;

/// Codes handed out to online sessions.
pub const ONLINE_CODES: RangeInclusive<SessionCode> = 100_000..=499_999;
/// Codes handed out to local sessions; disjoint from the online range.
pub const LOCAL_CODES: RangeInclusive<SessionCode> = 500_000..=999_999;
/// Re-rolls allowed when a drawn code is already in use.
pub const MAX_CODE_ATTEMPTS: usize = 32;

/// Input for [`SessionManager::create_online`].
#[derive(Clone, Debug)]
pub struct NewOnlineSession {
    pub categories: Vec<String>,
    pub imposter_count: usize,
    pub player_name: String,
    pub display_name: Option<String>,
}

/// Input for [`SessionManager::create_local`].
#[derive(Clone, Debug)]
pub struct NewLocalSession {
    /// `None` or empty means "any category in the catalog".
    pub categories: Option<Vec<String>>,
    pub imposter_count: usize,
    pub players: Vec<String>,
    pub display_name: Option<String>,
}

type SessionLock = Arc<Mutex<()>>;

pub struct SessionManager {
    catalog: Arc<WordCatalog>,
    store: Arc<dyn SessionStore>,
    locks: Mutex<HashMap<SessionCode, SessionLock>>,
    max_players: usize,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl SessionManager {
    pub fn new(catalog: Arc<WordCatalog>, store: Arc<dyn SessionStore>, max_players: usize) -> Self {
        Self {
            catalog,
            store,
            locks: Mutex::new(HashMap::new()),
            max_players,
            observer: None,
        }
    }

    /// Notify `observer` of every committed transition.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn catalog(&self) -> &WordCatalog {
        &self.catalog
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    // -----------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------

    /// Open an online lobby. Nothing is stored when validation fails.
    pub async fn create_online(&self, input: NewOnlineSession) -> Result<Session, GameError> {
        if input.categories.is_empty() {
            return Err(GameError::InvalidInput(
                "at least one category is required".into(),
            ));
        }
        let (category, word) = self.draw_word(&input.categories)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = rand::thread_rng().gen_range(ONLINE_CODES);
            let session = Session::new_online(
                code,
                category.clone(),
                word.clone(),
                input.imposter_count,
                &input.player_name,
                input.display_name.clone(),
            )?;
            if self.store.insert(session.clone()).await? {
                info!(code, category = %category, mode = "online", "session created");
                return Ok(session);
            }
            self.check_attempts(code, attempt)?;
        }
    }

    /// Create a single-device session with its full roster. Imposters are
    /// drawn immediately.
    pub async fn create_local(&self, input: NewLocalSession) -> Result<Session, GameError> {
        if input.players.len() > self.max_players {
            return Err(GameError::InvalidInput(format!(
                "at most {} players are allowed, got {}",
                self.max_players,
                input.players.len()
            )));
        }
        let categories = match input.categories {
            Some(list) if !list.is_empty() => list,
            _ => self
                .catalog
                .categories()
                .into_iter()
                .map(str::to_string)
                .collect(),
        };
        let (category, word) = self.draw_word(&categories)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let session = {
                let mut rng = rand::thread_rng();
                let code = rng.gen_range(LOCAL_CODES);
                Session::new_local(
                    code,
                    category.clone(),
                    word.clone(),
                    input.imposter_count,
                    &input.players,
                    input.display_name.clone(),
                    &mut rng,
                )?
            };
            let code = session.code();
            if self.store.insert(session.clone()).await? {
                info!(code, category = %category, mode = "local", players = session.players().len(), "session created");
                return Ok(session);
            }
            self.check_attempts(code, attempt)?;
        }
    }

    // -----------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------

    pub async fn get(&self, code: SessionCode) -> Result<Session, GameError> {
        self.store
            .find(code)
            .await?
            .ok_or(GameError::NotFound(code))
    }

    /// Project a session for `viewer` (see [`PlayerView`] for redaction).
    pub async fn view(
        &self,
        code: SessionCode,
        viewer: Option<&str>,
    ) -> Result<PlayerView, GameError> {
        let session = self.get(code).await?;
        Ok(PlayerView::project(&session, viewer))
    }

    pub async fn session_count(&self) -> Result<usize, GameError> {
        self.store.count().await
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    pub async fn join(&self, code: SessionCode, player_name: &str) -> Result<Session, GameError> {
        let name = player_name.trim();
        let max_players = self.max_players;
        let session = self
            .mutate(code, Action::Join, Some(name), |s| s.join(name, max_players))
            .await?;
        debug!(code, player = name, "player joined");
        Ok(session)
    }

    pub async fn start(&self, code: SessionCode) -> Result<Session, GameError> {
        let session = self
            .mutate(code, Action::Start, None, |s| {
                s.start(&mut rand::thread_rng())
            })
            .await?;
        info!(code, players = session.players().len(), "session started");
        Ok(session)
    }

    pub async fn advance_turn(&self, code: SessionCode) -> Result<Session, GameError> {
        let session = self
            .mutate(code, Action::NextPlayer, None, Session::advance_turn)
            .await?;
        debug!(code, current = ?session.current_player(), "turn advanced");
        Ok(session)
    }

    pub async fn eliminate(
        &self,
        code: SessionCode,
        player_name: &str,
    ) -> Result<Session, GameError> {
        let name = player_name.trim();
        let session = self
            .mutate(code, Action::Eliminate, Some(name), |s| s.eliminate(name))
            .await?;
        debug!(code, player = name, "player eliminated");
        if let Some(winner) = session.winner() {
            info!(code, %winner, state = %session.state(), "round decided");
        }
        Ok(session)
    }

    pub async fn end(&self, code: SessionCode) -> Result<Session, GameError> {
        let session = self
            .mutate(code, Action::End, None, |s| {
                s.end();
                Ok(())
            })
            .await?;
        info!(code, "session ended");
        Ok(session)
    }

    /// Dispatch a named action. `Join` and `Eliminate` need a player name.
    pub async fn perform(
        &self,
        code: SessionCode,
        action: Action,
        player_name: Option<&str>,
    ) -> Result<Session, GameError> {
        let named = || {
            player_name.ok_or_else(|| {
                GameError::InvalidInput(format!("{action} requires a player name"))
            })
        };
        match action {
            Action::Join => self.join(code, named()?).await,
            Action::Start => self.start(code).await,
            Action::NextPlayer => self.advance_turn(code).await,
            Action::Eliminate => self.eliminate(code, named()?).await,
            Action::End => self.end(code).await,
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Pick one of `categories` uniformly and draw its word. Every listed
    /// category must exist, so a bad list fails the same way on every call.
    fn draw_word(&self, categories: &[String]) -> Result<(String, String), GameError> {
        if let Some(unknown) = categories.iter().find(|c| !self.catalog.contains(c)) {
            return Err(GameError::UnknownCategory(unknown.clone()));
        }
        let mut rng = rand::thread_rng();
        let category = categories
            .choose(&mut rng)
            .cloned()
            .ok_or_else(|| GameError::InvalidInput("at least one category is required".into()))?;
        let word = self.catalog.pick_word(&category, &mut rng)?;
        Ok((category, word))
    }

    fn check_attempts(&self, code: SessionCode, attempt: usize) -> Result<(), GameError> {
        warn!(code, attempt, "session code collision, re-rolling");
        if attempt >= MAX_CODE_ATTEMPTS {
            return Err(GameError::CodeSpaceExhausted(attempt));
        }
        Ok(())
    }

    /// Lock for a stored code. Unknown codes never get an entry.
    async fn lock_for(&self, code: SessionCode) -> Result<SessionLock, GameError> {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(&code) {
            return Ok(lock.clone());
        }
        if self.store.find(code).await?.is_none() {
            return Err(GameError::NotFound(code));
        }
        let lock = SessionLock::default();
        locks.insert(code, lock.clone());
        Ok(lock)
    }

    /// Drop our handle and remove the entry once nobody else holds it.
    async fn release(&self, code: SessionCode, lock: SessionLock) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks
            .get(&code)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&code);
        }
    }

    /// Load, apply `f`, save and notify, holding the session's lock
    /// throughout. The record is left untouched when `f` fails.
    async fn mutate<F>(
        &self,
        code: SessionCode,
        action: Action,
        player: Option<&str>,
        f: F,
    ) -> Result<Session, GameError>
    where
        F: FnOnce(&mut Session) -> Result<(), GameError>,
    {
        let lock = self.lock_for(code).await?;
        let result = {
            let _guard = lock.lock().await;
            self.commit(code, action, player, f).await
        };
        self.release(code, lock).await;
        result
    }

    async fn commit<F>(
        &self,
        code: SessionCode,
        action: Action,
        player: Option<&str>,
        f: F,
    ) -> Result<Session, GameError>
    where
        F: FnOnce(&mut Session) -> Result<(), GameError>,
    {
        let mut session = self
            .store
            .find(code)
            .await?
            .ok_or(GameError::NotFound(code))?;
        f(&mut session)?;
        self.store.update(session.clone()).await?;
        if let Some(observer) = &self.observer {
            observer.committed(&session, action, player).await;
        }
        Ok(session)
    }

    #[cfg(test)]
    async fn lock_entries(&self) -> usize {
        self.locks.lock().await.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
