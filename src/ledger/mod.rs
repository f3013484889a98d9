//! Ledger collaborators
//!
//! The approval engine never talks to a ledger directly. It asks a
//! [`PayloadBuilder`] to turn caller parameters into a payload, and hands
//! approved payloads to an [`Executor`].

pub mod builder;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approval::{ActionParams, Payload};

pub use builder::TransferBuilder;
pub use http::HttpExecutor;

/// Payload could not be built from the supplied parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Destination is required")]
    MissingDestination,

    #[error("Payload rejected: {0}")]
    Rejected(String),
}

/// Approved payload failed to execute
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Ledger unreachable: {0}")]
    Transport(String),

    #[error("Ledger rejected transaction ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

/// Proof that a payload was executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Ledger transaction signature
    pub signature: String,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionReceipt {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            executed_at: Utc::now(),
        }
    }
}

/// Builds opaque payloads from caller parameters
#[async_trait]
pub trait PayloadBuilder: Send + Sync {
    async fn construct_payload(&self, params: &ActionParams) -> Result<Payload, ConstructionError>;
}

/// Submits approved payloads for real-world effect
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, payload: &Payload) -> Result<ExecutionReceipt, ExecutionError>;
}
