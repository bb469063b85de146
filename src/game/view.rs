//! Per-viewer read model of a session.
//!
//! Redaction rules while a round is open (`waiting` or `playing`):
//! - a viewer sees their own imposter flag and nobody else's;
//! - the word is shown only to a viewer who is a known civilian;
//! - anonymous viewers and online lobbies without roles see neither.
//!
//! Once the session is won, lost or ended everything is revealed.

use serde::Serialize;

use super::session::{Session, SessionCode};
use super::types::{GameMode, GameState, Winner};

/// One roster entry as seen by a viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub name: String,
    /// `None` when the viewer may not know this player's role.
    pub is_imposter: Option<bool>,
    pub eliminated: bool,
    pub is_current: bool,
}

/// What a given viewer is allowed to see of a session.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub code: SessionCode,
    pub display_name: String,
    pub category: String,
    pub word: Option<String>,
    pub mode: GameMode,
    pub state: GameState,
    pub winner: Option<Winner>,
    pub imposter_count: usize,
    pub current_player: Option<String>,
    pub players: Vec<PlayerEntry>,
    /// The viewer's name if they are part of the roster.
    pub viewer: Option<String>,
    /// The viewer's own role, when known.
    pub viewer_is_imposter: Option<bool>,
}

impl PlayerView {
    /// Project `session` for `viewer`. An unknown viewer name is treated as
    /// anonymous.
    pub fn project(session: &Session, viewer: Option<&str>) -> Self {
        let viewer = viewer
            .map(str::trim)
            .filter(|v| session.has_player(v))
            .map(str::to_string);
        let reveal_all = session.state().is_finished();
        let roles_known = session.roles_assigned();

        let viewer_is_imposter = match &viewer {
            Some(v) if roles_known => Some(session.is_imposter(v)),
            _ => None,
        };

        let word = if reveal_all || viewer_is_imposter == Some(false) {
            Some(session.word().to_string())
        } else {
            None
        };

        let current = session.current_player();
        let players = session
            .players()
            .iter()
            .map(|name| {
                let own = viewer.as_deref() == Some(name.as_str());
                let is_imposter = if reveal_all || (own && roles_known) {
                    Some(session.is_imposter(name))
                } else {
                    None
                };
                PlayerEntry {
                    name: name.clone(),
                    is_imposter,
                    eliminated: session.is_eliminated(name),
                    is_current: current == Some(name.as_str()),
                }
            })
            .collect();

        PlayerView {
            code: session.code(),
            display_name: session.display_name.clone(),
            category: session.category().to_string(),
            word,
            mode: session.mode(),
            state: session.state(),
            winner: session.winner(),
            imposter_count: session.imposter_count(),
            current_player: current.map(str::to_string),
            players,
            viewer,
            viewer_is_imposter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session(imposters: &[&str]) -> Session {
        let players: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let mut s = Session::new_local(
            500_100,
            "Animals".into(),
            "Owl".into(),
            imposters.len(),
            &players,
            None,
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap();
        s.set_imposters_for_test(imposters);
        s
    }

    fn entry<'a>(view: &'a PlayerView, name: &str) -> &'a PlayerEntry {
        view.players.iter().find(|p| p.name == name).unwrap()
    }

    #[test]
    fn civilian_sees_word_and_only_own_flag() {
        let s = session(&["A"]);
        let view = PlayerView::project(&s, Some("B"));
        assert_eq!(view.word.as_deref(), Some("Owl"));
        assert_eq!(view.viewer_is_imposter, Some(false));
        assert_eq!(entry(&view, "B").is_imposter, Some(false));
        assert_eq!(entry(&view, "A").is_imposter, None);
        assert_eq!(entry(&view, "C").is_imposter, None);
    }

    #[test]
    fn imposter_does_not_see_word() {
        let s = session(&["A"]);
        let view = PlayerView::project(&s, Some("A"));
        assert!(view.word.is_none());
        assert_eq!(view.viewer_is_imposter, Some(true));
        assert_eq!(entry(&view, "A").is_imposter, Some(true));
        assert_eq!(entry(&view, "B").is_imposter, None);
    }

    #[test]
    fn anonymous_viewer_sees_no_roles() {
        let s = session(&["A"]);
        for viewer in [None, Some("Stranger")] {
            let view = PlayerView::project(&s, viewer);
            assert!(view.word.is_none());
            assert!(view.viewer.is_none());
            assert!(view.players.iter().all(|p| p.is_imposter.is_none()));
        }
    }

    #[test]
    fn online_lobby_hides_word_before_roles() {
        let s = Session::new_online(100_200, "Food".into(), "Pizza".into(), 1, "Ana", None)
            .unwrap();
        let view = PlayerView::project(&s, Some("Ana"));
        assert!(view.word.is_none());
        assert!(view.viewer_is_imposter.is_none());
        assert_eq!(view.viewer.as_deref(), Some("Ana"));
    }

    #[test]
    fn finished_session_reveals_everything() {
        let mut s = session(&["A"]);
        s.start(&mut StdRng::seed_from_u64(0)).unwrap();
        s.eliminate("A").unwrap();
        let view = PlayerView::project(&s, None);
        assert_eq!(view.word.as_deref(), Some("Owl"));
        assert_eq!(view.winner, Some(Winner::Civilians));
        assert_eq!(entry(&view, "A").is_imposter, Some(true));
        assert_eq!(entry(&view, "B").is_imposter, Some(false));
        assert!(entry(&view, "A").eliminated);
    }

    #[test]
    fn marks_current_player() {
        let mut s = session(&["D"]);
        s.start(&mut StdRng::seed_from_u64(0)).unwrap();
        let view = PlayerView::project(&s, Some("B"));
        assert_eq!(view.current_player.as_deref(), Some("A"));
        assert!(entry(&view, "A").is_current);
        assert!(!entry(&view, "B").is_current);
    }

    #[test]
    fn serializes_redacted_flags_as_null() {
        let s = session(&["A"]);
        let json = serde_json::to_value(PlayerView::project(&s, Some("B"))).unwrap();
        assert!(json["players"][0]["isImposter"].is_null());
        assert_eq!(json["players"][1]["isImposter"], false);
        assert_eq!(json["viewerIsImposter"], false);
        assert_eq!(json["word"], "Owl");
    }
}
