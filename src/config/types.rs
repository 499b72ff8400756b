use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HotelError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tenant: TenantConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.tenant.owner_id.trim().is_empty() {
            return Err(HotelError::Config("tenant.owner_id must not be empty".into()));
        }
        if self.reports.trailing_days == 0 {
            return Err(HotelError::Config(
                "reports.trailing_days must be at least 1".into(),
            ));
        }
        if self.reports.max_window_days < self.reports.trailing_days {
            return Err(HotelError::Config(format!(
                "reports.max_window_days ({}) is smaller than reports.trailing_days ({})",
                self.reports.max_window_days, self.reports.trailing_days
            )));
        }
        Ok(())
    }
}

/// The tenant on whose behalf this server acts. Properties owned by any
/// other tenant are reported as not found.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantConfig {
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON or YAML dataset. `None` serves the built-in demo hotel.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub persist: bool,
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            persist: true,
            seed_demo: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportsConfig {
    /// Days in the default report window, counted inclusively and ending
    /// today: 30 covers the previous 29 days plus today.
    #[serde(default = "default_trailing_days")]
    pub trailing_days: u32,
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            trailing_days: default_trailing_days(),
            max_window_days: default_max_window_days(),
        }
    }
}

fn default_owner_id() -> String {
    "demo-user".into()
}

fn default_true() -> bool {
    true
}

fn default_trailing_days() -> u32 {
    30
}

fn default_max_window_days() -> u32 {
    366
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.tenant.owner_id, "demo-user");
        assert!(config.store.data_path.is_none());
        assert!(config.store.persist);
        assert!(config.store.seed_demo);
        assert_eq!(config.reports.trailing_days, 30);
        assert_eq!(config.reports.max_window_days, 366);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_serde_roundtrip() {
        let original = Config::default();
        let yaml = serde_yml::to_string(&original).unwrap();
        let restored: Config = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(restored.tenant.owner_id, original.tenant.owner_id);
        assert_eq!(restored.reports.trailing_days, original.reports.trailing_days);
        assert_eq!(restored.store.persist, original.store.persist);
    }

    #[test]
    fn config_deserialize_with_overrides() {
        let yaml = "reports:\n  trailing_days: 7\nstore:\n  data_path: /var/lib/hotel/data.json";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.reports.trailing_days, 7);
        assert_eq!(config.reports.max_window_days, 366);
        assert_eq!(
            config.store.data_path.as_deref(),
            Some(std::path::Path::new("/var/lib/hotel/data.json"))
        );
        assert!(config.store.persist);
        assert_eq!(config.tenant.owner_id, "demo-user");
    }

    #[test]
    fn validate_rejects_inconsistent_windows() {
        let mut config = Config::default();
        config.reports.trailing_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reports.max_window_days = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tenant.owner_id = " ".into();
        assert!(config.validate().is_err());
    }
}
