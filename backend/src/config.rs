use shielded_ledger::Identity;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_API_KEY: &str = "dev-secret-key";
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Process configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub api_key: String,
    pub data_dir: PathBuf,
    /// Identity allowed to rotate verifiers.
    pub admin: Identity,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = lookup("BACKEND_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());

        // In production, this should be a strong secret.
        let api_key = lookup("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string());
        if api_key.is_empty() {
            return Err(ConfigError::Invalid { var: "API_KEY", reason: "must not be empty".to_string() });
        }

        let data_dir = PathBuf::from(lookup("LEDGER_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let admin = lookup("LEDGER_ADMIN").ok_or(ConfigError::Missing("LEDGER_ADMIN"))?;
        let admin: Identity = admin
            .parse()
            .map_err(|e| ConfigError::Invalid { var: "LEDGER_ADMIN", reason: format!("{e}") })?;
        if admin.is_zero() {
            return Err(ConfigError::Invalid { var: "LEDGER_ADMIN", reason: "zero identity".to_string() });
        }

        Ok(Self { addr, api_key, data_dir, admin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_admin_is_set() {
        let cfg = config(&[("LEDGER_ADMIN", "0x00000000000000000000000000000000000000aa")]).unwrap();
        assert_eq!(cfg.addr, DEFAULT_ADDR);
        assert_eq!(cfg.api_key, DEFAULT_API_KEY);
        assert_eq!(cfg.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(cfg.admin.as_bytes()[19], 0xaa);
    }

    #[test]
    fn admin_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("LEDGER_ADMIN"))));
    }

    #[test]
    fn malformed_admin_is_rejected() {
        assert!(matches!(
            config(&[("LEDGER_ADMIN", "not-hex")]),
            Err(ConfigError::Invalid { var: "LEDGER_ADMIN", .. })
        ));
        assert!(matches!(
            config(&[("LEDGER_ADMIN", "0x00")]),
            Err(ConfigError::Invalid { var: "LEDGER_ADMIN", .. })
        ));
    }
}
