use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Query defaults
    pub default_limit: u32,                     // Results per page when the caller sets none
    pub default_offset: u32,

    // Re-indexing (migrations)
    pub reindex_batch_size: usize,              // Records per rayon chunk
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_limit: 50,
            default_offset: 0,
            reindex_batch_size: 1000,
        }
    }
}

impl Config {
    /// Load overrides from a JSON object; absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "default_limit must be at least 1"));
        }
        if self.reindex_batch_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "reindex_batch_size must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_expectations() {
        let config = Config::default();
        assert_eq!(config.default_limit, 50);
        assert_eq!(config.default_offset, 0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{"default_limit": 10}"#).unwrap();
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.reindex_batch_size, 1000);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = Config::from_json(r#"{"default_limit": 0}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
