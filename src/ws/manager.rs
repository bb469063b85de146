//! Live session audiences: which sockets watch which session code, and the
//! fan-out of committed session changes to them.
//!
//! `WsManager` is installed as the session manager's [`SessionObserver`], so
//! events are queued while the session's lock is held and every watcher
//! receives them in commit order.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::WsEvent;
use crate::game::{Action, Session, SessionCode, SessionObserver};

/// Sending half of one socket's queue. The socket's writer task owns the
/// receiving half.
pub type ClientSender = mpsc::UnboundedSender<WsEvent>;

/// Identifies one connected socket.
pub type ClientId = u64;

type Audience = HashMap<ClientId, ClientSender>;

#[derive(Debug)]
pub struct WsManager {
    audiences: RwLock<HashMap<SessionCode, Audience>>,
    next_id: AtomicU64,
}

impl WsManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            audiences: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Start watching `code`. Events arrive on the returned receiver.
    pub async fn subscribe(
        &self,
        code: SessionCode,
    ) -> (ClientId, mpsc::UnboundedReceiver<WsEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.audiences
            .write()
            .await
            .entry(code)
            .or_default()
            .insert(id, tx);

        debug!(code, client_id = id, "watcher joined");
        (id, rx)
    }

    /// Stop watching. Empty audiences are dropped.
    pub async fn unsubscribe(&self, code: SessionCode, client_id: ClientId) {
        let mut audiences = self.audiences.write().await;
        if let Some(audience) = audiences.get_mut(&code) {
            audience.remove(&client_id);
            if audience.is_empty() {
                audiences.remove(&code);
            }
        }
        debug!(code, client_id, "watcher left");
    }

    /// Queue `events` for every watcher of `code`, in order. Watchers whose
    /// socket is gone are pruned.
    pub async fn broadcast_all(&self, code: SessionCode, events: Vec<WsEvent>) {
        let gone: Vec<ClientId> = {
            let audiences = self.audiences.read().await;
            let Some(audience) = audiences.get(&code) else {
                return;
            };
            audience
                .iter()
                .filter(|(_, tx)| events.iter().any(|e| tx.send(e.clone()).is_err()))
                .map(|(&id, _)| id)
                .collect()
        };
        if gone.is_empty() {
            return;
        }

        let mut audiences = self.audiences.write().await;
        if let Some(audience) = audiences.get_mut(&code) {
            for id in &gone {
                audience.remove(id);
                warn!(code, client_id = id, "pruned closed watcher");
            }
            if audience.is_empty() {
                audiences.remove(&code);
            }
        }
    }

    pub async fn broadcast(&self, code: SessionCode, event: WsEvent) {
        self.broadcast_all(code, vec![event]).await;
    }

    /// Reply to one socket. Returns `false` if it is gone.
    pub async fn send_to(&self, code: SessionCode, client_id: ClientId, event: WsEvent) -> bool {
        let audiences = self.audiences.read().await;
        audiences
            .get(&code)
            .and_then(|audience| audience.get(&client_id))
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Watchers of one session.
    pub async fn subscriber_count(&self, code: SessionCode) -> usize {
        let audiences = self.audiences.read().await;
        audiences.get(&code).map_or(0, HashMap::len)
    }

    /// Open sockets across all sessions.
    pub async fn total_connections(&self) -> usize {
        let audiences = self.audiences.read().await;
        audiences.values().map(HashMap::len).sum()
    }
}

#[async_trait]
impl SessionObserver for WsManager {
    async fn committed(&self, session: &Session, action: Action, player: Option<&str>) {
        let events = WsEvent::for_action(session, action, player);
        self.broadcast_all(session.code(), events).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn local_session(code: SessionCode) -> Session {
        let players: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(9);
        let mut s = Session::new_local(
            code,
            "Food".into(),
            "Soup".into(),
            1,
            &players,
            None,
            &mut rng,
        )
        .unwrap();
        s.start(&mut rng).unwrap();
        s
    }

    fn kind(event: &WsEvent) -> String {
        let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        json["type"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn subscribe_returns_unique_ids() {
        let mgr = WsManager::new();
        let (id1, _rx1) = mgr.subscribe(100_001).await;
        let (id2, _rx2) = mgr.subscribe(100_001).await;
        assert_ne!(id1, id2);
    }

    #[tokio::test]
    async fn subscriber_count_tracks_joins_and_leaves() {
        let mgr = WsManager::new();
        assert_eq!(mgr.subscriber_count(100_001).await, 0);

        let (id1, _rx1) = mgr.subscribe(100_001).await;
        let (_id2, _rx2) = mgr.subscribe(100_001).await;
        assert_eq!(mgr.subscriber_count(100_001).await, 2);

        mgr.unsubscribe(100_001, id1).await;
        assert_eq!(mgr.subscriber_count(100_001).await, 1);
    }

    #[tokio::test]
    async fn broadcast_reaches_only_that_session() {
        let mgr = WsManager::new();
        let (_id1, mut rx1) = mgr.subscribe(100_001).await;
        let (_id2, mut rx2) = mgr.subscribe(100_001).await;
        let (_id3, mut rx3) = mgr.subscribe(100_002).await;

        mgr.broadcast(100_001, WsEvent::error("hello")).await;

        assert_eq!(
            rx1.recv().await.unwrap().to_json(),
            rx2.recv().await.unwrap().to_json()
        );
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_reaches_only_target() {
        let mgr = WsManager::new();
        let (id1, mut rx1) = mgr.subscribe(100_001).await;
        let (_id2, mut rx2) = mgr.subscribe(100_001).await;
        assert!(mgr.send_to(100_001, id1, WsEvent::pong()).await);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
        assert!(!mgr.send_to(100_001, 999, WsEvent::pong()).await);
    }

    #[tokio::test]
    async fn broadcast_all_keeps_order() {
        let mgr = WsManager::new();
        let (_id, mut rx) = mgr.subscribe(100_001).await;
        mgr.broadcast_all(100_001, vec![WsEvent::error("first"), WsEvent::pong()])
            .await;
        assert_eq!(kind(&rx.recv().await.unwrap()), "error");
        assert_eq!(kind(&rx.recv().await.unwrap()), "pong");
    }

    #[tokio::test]
    async fn closed_watchers_are_pruned() {
        let mgr = WsManager::new();
        let (_id1, rx1) = mgr.subscribe(100_001).await;
        let (_id2, _rx2) = mgr.subscribe(100_001).await;
        drop(rx1);

        mgr.broadcast(100_001, WsEvent::pong()).await;
        assert_eq!(mgr.subscriber_count(100_001).await, 1);
        assert_eq!(mgr.total_connections().await, 1);
    }

    #[tokio::test]
    async fn unknown_sessions_are_noops() {
        let mgr = WsManager::new();
        mgr.broadcast(999_999, WsEvent::pong()).await;
        mgr.unsubscribe(999_999, 42).await;
        assert_eq!(mgr.total_connections().await, 0);
    }

    #[tokio::test]
    async fn committed_actions_become_events() {
        let mgr = WsManager::new();
        let session = local_session(500_010);
        let (_id, mut rx) = mgr.subscribe(500_010).await;

        mgr.committed(&session, Action::Start, None).await;
        mgr.committed(&session, Action::NextPlayer, None).await;
        mgr.committed(&session, Action::End, None).await;

        assert_eq!(kind(&rx.recv().await.unwrap()), "game_started");
        assert_eq!(kind(&rx.recv().await.unwrap()), "turn_advanced");
        assert_eq!(kind(&rx.recv().await.unwrap()), "session_ended");
    }
}
