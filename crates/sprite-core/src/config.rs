//! Front-end core configuration, loaded from TOML.
//!
//! ```toml
//! [api]
//! base_url = "https://ivypowered.com/api"
//! timeout_secs = 30
//!
//! [vault]
//! address = "..."
//!
//! [log]
//! level = "info"
//! json = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SpriteError;

pub const DEFAULT_API_BASE: &str = "https://ivypowered.com/api";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub vault: VaultConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl SpriteConfig {
    pub fn from_file(path: &Path) -> Result<Self, SpriteError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpriteError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, SpriteError> {
        let config: Self =
            toml::from_str(content).map_err(|e| SpriteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, SpriteError> {
        toml::to_string_pretty(self).map_err(|e| SpriteError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SpriteError> {
        let base = url::Url::parse(&self.api.base_url)
            .map_err(|e| SpriteError::Config(format!("api.base_url: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SpriteError::Config(format!(
                "api.base_url: unsupported scheme {}",
                base.scheme()
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(SpriteError::Config("api.timeout_secs must be > 0".into()));
        }
        if let Some(address) = &self.vault.address {
            chain_sol::validate_address(address)
                .map_err(|e| SpriteError::Config(format!("vault.address: {e}")))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,

    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            timeout_secs: default_api_timeout(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_owned()
}

const fn default_api_timeout() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

/// The on-chain vault that deposits and withdrawals go through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Base58 vault address. Payment pages refuse to run without it.
    #[serde(default)]
    pub address: Option<String>,
}

impl VaultConfig {
    pub fn address_bytes(&self) -> Result<[u8; 32], SpriteError> {
        let address = self
            .address
            .as_deref()
            .ok_or_else(|| SpriteError::Config("vault.address is not set".into()))?;
        chain_sol::address_to_bytes(address)
            .map_err(|e| SpriteError::Config(format!("vault.address: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SpriteConfig::from_toml("").unwrap();
        assert_eq!(config, SpriteConfig::default());
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.log.level, "info");
        assert!(config.vault.address.is_none());
    }

    #[test]
    fn full_file_parses() {
        let config = SpriteConfig::from_toml(
            r#"
            [api]
            base_url = "http://localhost:8080/api"
            timeout_secs = 5

            [vault]
            address = "11111111111111111111111111111111"

            [log]
            level = "sprite_core=debug"
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.vault.address_bytes().unwrap(), [0u8; 32]);
        assert!(config.log.json);
    }

    #[test]
    fn rejects_bad_vault_address() {
        let err = SpriteConfig::from_toml("[vault]\naddress = \"xyz\"").unwrap_err();
        assert!(err.to_string().contains("vault.address"));
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(SpriteConfig::from_toml("[api]\nbase_url = \"ftp://x\"").is_err());
        assert!(SpriteConfig::from_toml("[api]\nbase_url = \"not a url\"").is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(SpriteConfig::from_toml("[api]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn missing_vault_is_reported_on_use() {
        let err = VaultConfig::default().address_bytes().unwrap_err();
        assert_eq!(err.to_string(), "Config error: vault.address is not set");
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = SpriteConfig::default();
        config.vault.address = Some("11111111111111111111111111111111".into());
        let text = config.to_toml().unwrap();
        assert_eq!(SpriteConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprite.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(SpriteConfig::from_file(&path).unwrap().log.level, "warn");
        assert!(SpriteConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
