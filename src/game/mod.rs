pub mod catalog;
pub mod events;
pub mod manager;
pub mod session;
pub mod store;
pub mod types;
pub mod view;

pub use catalog::{CatalogError, WordCatalog};
pub use events::SessionObserver;
pub use manager::{NewLocalSession, NewOnlineSession, SessionManager};
pub use session::{Session, SessionCode};
pub use store::{InMemorySessionStore, SessionStore};
pub use types::*;
pub use view::{PlayerEntry, PlayerView};
