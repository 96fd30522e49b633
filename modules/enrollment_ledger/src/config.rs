//! Configuration for the enrollment ledger module

use serde::{Deserialize, Serialize};

/// Enrollment ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Page size used when a listing does not ask for one
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound for requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Record audit entries for mutating requests
    #[serde(default = "default_true")]
    pub audit_enabled: bool,

    /// Largest response body buffered as an audit after-state, in bytes
    #[serde(default = "default_audit_body_limit")]
    pub audit_body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            audit_enabled: true,
            audit_body_limit: default_audit_body_limit(),
        }
    }
}

fn default_page_size() -> u64 {
    20
}

fn default_max_page_size() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_audit_body_limit() -> usize {
    256 * 1024 // 256KB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "max_page_size": 50 }"#).unwrap();
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.default_page_size, 20);
        assert!(config.audit_enabled);
        assert_eq!(config.audit_body_limit, 256 * 1024);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<Config>(r#"{ "page_size": 10 }"#);
        assert!(result.is_err());
    }
}
