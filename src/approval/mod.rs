//! Multi-party approval engine
//!
//! Owners tagged as humans or AI agents endorse proposals; an ordered policy
//! decides how many endorsements, and of which kind, a proposal needs before
//! it is handed to the executor.

pub mod coordinator;
pub mod evaluator;
pub mod policy;
pub mod proposal;
pub mod registry;

pub use coordinator::{
    ApprovalError, ApprovalResult, EndorseOutcome, GovernanceSummary, ProposalCoordinator,
    ProposalEvent,
};
pub use evaluator::{evaluate, Verdict};
pub use policy::{ApprovalPolicy, ApprovalRule, Condition, Requirement, RuleSummary};
pub use proposal::{ActionParams, Endorsement, Payload, Proposal, ProposalStatus};
pub use registry::{Identity, OwnerEntry, OwnerRegistry, Role};
