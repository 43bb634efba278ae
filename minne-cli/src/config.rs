//! Harness configuration: clap flags layered over an optional YAML file and
//! `MINNE_*` environment variables.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file, environment,
//! command-line flags.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use minne_core::Strategy;

use crate::commands::Cli;
use crate::error::CliError;

/// Settings the REPL constructs its heap from.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReplConfig {
    /// Number of bytes the allocator will manage.
    #[validate(range(min = 1, message = "arena size must be at least 1 byte"))]
    pub size: usize,

    /// Placement strategy for the arena.
    pub strategy: Strategy,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            size: 1024,
            strategy: Strategy::FirstFit,
        }
    }
}

/// Merges all configuration layers and validates the result.
pub fn load(cli: &Cli) -> Result<ReplConfig, CliError> {
    let mut figment = Figment::from(Serialized::defaults(ReplConfig::default()));

    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.clone()));
        }
        figment = figment.merge(Yaml::file(path));
    }

    figment = figment.merge(Env::prefixed("MINNE_"));

    if let Some(size) = cli.size {
        figment = figment.merge(Serialized::default("size", size));
    }
    if let Some(strategy) = cli.strategy {
        figment = figment.merge(Serialized::default("strategy", strategy));
    }

    let config: ReplConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> Cli {
        Cli {
            size: None,
            strategy: None,
            config: None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = load(&empty_cli()).unwrap();
        assert_eq!(config.size, 1024);
        assert_eq!(config.strategy, Strategy::FirstFit);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli {
            size: Some(4096),
            strategy: Some(Strategy::NextFit),
            config: None,
        };
        let config = load(&cli).unwrap();
        assert_eq!(config.size, 4096);
        assert_eq!(config.strategy, Strategy::NextFit);
    }

    #[test]
    fn test_zero_size_rejected() {
        let cli = Cli {
            size: Some(0),
            strategy: None,
            config: None,
        };
        assert!(matches!(load(&cli), Err(CliError::Validation(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli {
            size: None,
            strategy: None,
            config: Some("/does/not/exist.yaml".into()),
        };
        assert!(matches!(load(&cli), Err(CliError::FileNotFound(_))));
    }
}
