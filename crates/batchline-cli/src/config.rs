//! Demo driver configuration, read from the environment.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("BATCHLINE_COMMIT_INTERVAL must be greater than zero")]
    ZeroCommitInterval,
}

/// Driver settings.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub checkpoint_path: PathBuf,
    pub commit_interval: usize,
    pub items: u32,
    pub fail_after: Option<usize>,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Environment variables:
    /// - BATCHLINE_CHECKPOINT: checkpoint file (default: $TMPDIR/batchline-checkpoint.json)
    /// - BATCHLINE_COMMIT_INTERVAL: items per checkpoint (default: 3)
    /// - BATCHLINE_ITEMS: number of demo items (default: 10)
    /// - BATCHLINE_FAIL_AFTER: stop without closing after this many items (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let checkpoint_path = lookup("BATCHLINE_CHECKPOINT")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("batchline-checkpoint.json"));

        let commit_interval = parse(&lookup, "BATCHLINE_COMMIT_INTERVAL")?.unwrap_or(3);
        if commit_interval == 0 {
            return Err(ConfigError::ZeroCommitInterval);
        }

        let items = parse(&lookup, "BATCHLINE_ITEMS")?.unwrap_or(10);
        let fail_after = parse(&lookup, "BATCHLINE_FAIL_AFTER")?;

        Ok(Self {
            checkpoint_path,
            commit_interval,
            items,
            fail_after,
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = CliConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.commit_interval, 3);
        assert_eq!(config.items, 10);
        assert_eq!(config.fail_after, None);
        assert!(config.checkpoint_path.ends_with("batchline-checkpoint.json"));
    }

    #[test]
    fn values_are_read_from_env() {
        let config = CliConfig::from_lookup(lookup(&[
            ("BATCHLINE_CHECKPOINT", "/var/tmp/ckpt.json"),
            ("BATCHLINE_COMMIT_INTERVAL", "5"),
            ("BATCHLINE_ITEMS", "42"),
            ("BATCHLINE_FAIL_AFTER", "7"),
        ]))
        .unwrap();
        assert_eq!(config.checkpoint_path, PathBuf::from("/var/tmp/ckpt.json"));
        assert_eq!(config.commit_interval, 5);
        assert_eq!(config.items, 42);
        assert_eq!(config.fail_after, Some(7));
    }

    #[test]
    fn zero_commit_interval_is_rejected() {
        let result = CliConfig::from_lookup(lookup(&[("BATCHLINE_COMMIT_INTERVAL", "0")]));
        assert!(matches!(result, Err(ConfigError::ZeroCommitInterval)));
    }

    #[test]
    fn garbage_number_is_rejected() {
        let result = CliConfig::from_lookup(lookup(&[("BATCHLINE_ITEMS", "many")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { name: "BATCHLINE_ITEMS", .. })
        ));
    }
}
