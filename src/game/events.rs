//! Hook for reacting to committed session changes.

use async_trait::async_trait;

use super::session::Session;
use super::types::Action;

/// Receives every successful transition.
///
/// Called while the session's lock is still held, so calls for one code
/// arrive in commit order. Implementations must not block and must not call
/// back into the [`SessionManager`](super::manager::SessionManager) for the
/// same code.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    /// `player` is the trimmed name for `Join` and `Eliminate`.
    async fn committed(&self, session: &Session, action: Action, player: Option<&str>);
}
