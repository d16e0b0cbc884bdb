//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Document store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Document store tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Maximum optimistic transaction retries before surfacing a conflict.
    #[serde(default = "default_max_txn_retries")]
    pub max_txn_retries: u32,
    /// Capacity of the change-notification broadcast channel.
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
}

fn default_max_txn_retries() -> u32 {
    5
}

fn default_change_buffer() -> usize {
    64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_txn_retries: default_max_txn_retries(),
            change_buffer: default_change_buffer(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Environment variables use the `PROVENDER` prefix with `__` as the
    /// section separator, e.g. `PROVENDER__STORE__MAX_TXN_RETRIES=10`.
    /// A `.env` file is honored when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment contains malformed values.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("PROVENDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.store.max_txn_retries, 5);
        assert_eq!(cfg.store.change_buffer, 64);
    }

    #[test]
    fn test_deserialize_partial() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"store": {"max_txn_retries": 9}}"#).unwrap();
        assert_eq!(cfg.store.max_txn_retries, 9);
        assert_eq!(cfg.store.change_buffer, 64);
    }
}
