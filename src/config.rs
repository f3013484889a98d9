//! Service configuration
//!
//! Command-line flags fall back to environment variables. Owners and the
//! approval policy can be seeded from a JSON governance file.

use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::approval::{ApprovalPolicy, ApprovalRule, OwnerEntry, OwnerRegistry};

#[derive(Debug, Clone, Parser)]
#[command(name = "quorum", version, about = "Policy-driven multi-party approval service")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "QUORUM_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Base URL of the ledger gateway that executes approved proposals
    #[arg(long, env = "LEDGER_URL")]
    pub ledger_url: String,

    /// Seconds before a ledger request is abandoned
    #[arg(long, env = "LEDGER_TIMEOUT_SECS", default_value_t = 30)]
    pub ledger_timeout_secs: u64,

    /// Account debited by transfer proposals
    #[arg(long, env = "WALLET_ADDRESS")]
    pub wallet_address: Option<String>,

    /// JSON file with initial owners and approval policy
    #[arg(long, env = "QUORUM_GOVERNANCE")]
    pub governance: Option<PathBuf>,

    /// Start without a governance file: no owners, threshold 0, so any
    /// single endorsement executes
    #[arg(long, env = "QUORUM_ALLOW_OPEN_GOVERNANCE")]
    pub allow_open_governance: bool,
}

impl Config {
    /// Governance file to load, or `None` when starting open was allowed
    pub fn governance_path(&self) -> Result<Option<&Path>, ConfigError> {
        match (&self.governance, self.allow_open_governance) {
            (Some(path), _) => Ok(Some(path.as_path())),
            (None, true) => Ok(None),
            (None, false) => Err(ConfigError::MissingGovernance),
        }
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid governance file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No governance file given; pass --governance or --allow-open-governance")]
    MissingGovernance,
}

/// Initial owners and policy
///
/// ```json
/// {
///   "owners": [{"identity": "H1", "role": "human"}, {"identity": "A1", "role": "ai"}],
///   "default_threshold": 2,
///   "rules": [
///     {"condition": {"kind": "amount_at_most", "value": 0.5},
///      "threshold": 1, "humans_required": 1, "ai_agents_required": 0}
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GovernanceFile {
    #[serde(default)]
    pub owners: Vec<OwnerEntry>,
    #[serde(default)]
    pub default_threshold: u32,
    #[serde(default)]
    pub rules: Vec<ApprovalRule>,
}

impl GovernanceFile {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn into_parts(self) -> (OwnerRegistry, ApprovalPolicy) {
        (
            OwnerRegistry::from_entries(self.owners),
            ApprovalPolicy::new(self.default_threshold, self.rules),
        )
    }
}
