//! Proposals and their endorsements
//!
//! A proposal wraps an opaque payload together with the set of identities
//! that have endorsed it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::registry::Identity;

/// Lifecycle status of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Collecting endorsements
    Pending,
    /// Quorum met; execution in flight or last attempt failed
    Approved,
    /// Executed and removed from the pending set
    Executed,
    /// Discarded by a caller
    Abandoned,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Executed => "executed",
            ProposalStatus::Abandoned => "abandoned",
        }
    }

    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Executed | ProposalStatus::Abandoned)
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProposalStatus::Pending),
            "approved" => Ok(ProposalStatus::Approved),
            "executed" => Ok(ProposalStatus::Executed),
            "abandoned" => Ok(ProposalStatus::Abandoned),
            _ => Err(format!("Invalid proposal status: {}", s)),
        }
    }
}

/// Caller-supplied parameters for a new action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParams {
    /// Recipient of the action
    pub destination: Identity,
    /// Amount in whole ledger units
    pub amount: f64,
    /// Optional memo attached to the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Action descriptor built by a payload builder
///
/// `body` is whatever the builder produced for the executor; the engine only
/// looks at the descriptive fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub destination: Identity,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// A recorded sign-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub signer: Identity,
    pub endorsed_at: DateTime<Utc>,
}

/// A unit of work awaiting endorsements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique identifier
    pub id: Uuid,
    /// The action to execute once approved
    pub payload: Payload,
    /// Endorsements in the order they were recorded, one per signer
    pub endorsements: Vec<Endorsement>,
    /// Current status
    pub status: ProposalStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// Create a new pending proposal with no endorsements
    pub fn new(payload: Payload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            payload,
            endorsements: Vec::new(),
            status: ProposalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn amount(&self) -> f64 {
        self.payload.amount
    }

    pub fn has_endorsement(&self, signer: &Identity) -> bool {
        self.endorsements.iter().any(|e| &e.signer == signer)
    }

    /// Record an endorsement. Returns false if the signer had already endorsed.
    pub fn add_endorsement(&mut self, signer: Identity) -> bool {
        if self.has_endorsement(&signer) {
            return false;
        }
        let now = Utc::now();
        self.endorsements.push(Endorsement {
            signer,
            endorsed_at: now,
        });
        self.updated_at = now;
        true
    }

    pub fn signers(&self) -> impl Iterator<Item = &Identity> {
        self.endorsements.iter().map(|e| &e.signer)
    }

    pub(crate) fn set_status(&mut self, status: ProposalStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
