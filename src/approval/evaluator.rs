//! Quorum evaluation
//!
//! Combines the registry, the policy and a proposal's endorsements into a
//! verdict. Evaluation is pure: it never mutates the proposal, and calling it
//! twice with the same inputs yields the same verdict.

use serde::Serialize;

use super::policy::{ApprovalPolicy, Requirement};
use super::proposal::Proposal;
use super::registry::{Identity, OwnerRegistry, Role};

/// Outcome of evaluating a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub approved: bool,
    /// Endorsements from current owners
    pub counted: u32,
    /// Counted endorsements from humans
    pub humans: u32,
    /// Counted endorsements from AI agents
    pub ai_agents: u32,
    /// Requirement resolved from the policy
    pub requirement: Requirement,
    /// Recorded signers that are not owners and therefore do not count
    pub non_counting: Vec<Identity>,
}

/// Decide whether a proposal has met its quorum
pub fn evaluate(proposal: &Proposal, registry: &OwnerRegistry, policy: &ApprovalPolicy) -> Verdict {
    let mut counted = 0u32;
    let mut humans = 0u32;
    let mut ai_agents = 0u32;
    let mut non_counting = Vec::new();

    for signer in proposal.signers() {
        if !registry.is_owner(signer) {
            non_counting.push(signer.clone());
            continue;
        }
        counted += 1;
        match registry.role_of(signer) {
            Some(Role::Human) => humans += 1,
            Some(Role::AiAgent) => ai_agents += 1,
            None => {}
        }
    }

    let requirement = policy.resolve(proposal);
    let approved = counted >= requirement.threshold
        && humans >= requirement.humans_required
        && ai_agents >= requirement.ai_agents_required;

    Verdict {
        approved,
        counted,
        humans,
        ai_agents,
        requirement,
        non_counting,
    }
}
