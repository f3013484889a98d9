//! Quorum - policy-driven multi-party approval engine

pub mod api;
pub mod approval;
pub mod config;
pub mod error;
pub mod ledger;

use std::sync::Arc;

use crate::approval::ProposalCoordinator;

/// Application state shared across handlers
pub struct AppState {
    pub coordinator: ProposalCoordinator,
}

impl AppState {
    pub fn new(coordinator: ProposalCoordinator) -> Arc<Self> {
        Arc::new(Self { coordinator })
    }
}
