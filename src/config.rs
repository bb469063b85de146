use std::path::PathBuf;

use crate::game::{CatalogError, WordCatalog};

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Optional JSON word catalog replacing the built-in one.
    pub words_file: Option<PathBuf>,
    /// Largest roster a session may hold.
    pub max_players: usize,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8083),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            words_file: std::env::var("IMPOSTER_WORDS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            max_players: std::env::var("IMPOSTER_MAX_PLAYERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n >= 2)
                .unwrap_or(20),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured word catalog, or the built-in one.
    pub fn load_catalog(&self) -> Result<WordCatalog, CatalogError> {
        match &self.words_file {
            Some(path) => WordCatalog::from_path(path),
            None => WordCatalog::builtin(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8083,
            host: "0.0.0.0".to_string(),
            words_file: None,
            max_players: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8083);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.words_file.is_none());
        assert_eq!(config.max_players, 20);
        assert_eq!(config.bind_addr(), "0.0.0.0:8083");
    }

    #[test]
    fn from_env_defaults() {
        // Without setting env vars, should fall back to defaults
        let config = AppConfig::from_env();
        assert_eq!(config.port, 8083);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn default_catalog_is_builtin() {
        let catalog = AppConfig::default().load_catalog().unwrap();
        assert!(!catalog.categories().is_empty());
    }

    #[test]
    fn catalog_from_words_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.json");
        std::fs::write(&path, r#"{"Planets":["Mars","Venus"]}"#).unwrap();
        let config = AppConfig {
            words_file: Some(path),
            ..AppConfig::default()
        };
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.categories(), vec!["Planets"]);
    }
}
