//! Proposal lifecycle coordinator
//!
//! The coordinator handles:
//! - Owner registry and approval policy administration
//! - Proposal creation through the payload builder
//! - Endorsement collection and quorum evaluation
//! - Execution handoff and removal of executed proposals
//! - Event broadcasting
//!
//! Every pending proposal lives in its own slot. The slot gate serialises
//! record -> evaluate -> execute -> remove for one proposal, so a proposal is
//! handed to the executor at most once per approval even when endorsements
//! race. The executor is awaited holding only that gate.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use super::evaluator::{evaluate, Verdict};
use super::policy::{ApprovalPolicy, ApprovalRule, RuleSummary};
use super::proposal::{ActionParams, Proposal, ProposalStatus};
use super::registry::{Identity, OwnerEntry, OwnerRegistry, Role};
use crate::ledger::{ConstructionError, ExecutionReceipt, Executor, PayloadBuilder};

/// Events emitted by the coordinator
#[derive(Debug, Clone)]
pub enum ProposalEvent {
    /// A proposal entered the pending set
    ProposalCreated { proposal_id: Uuid, amount: f64 },
    /// An endorsement was recorded; `counted` is false for non-owners
    Endorsed {
        proposal_id: Uuid,
        signer: Identity,
        counted: bool,
    },
    /// Quorum was met and execution is about to start
    Approved { proposal_id: Uuid, counted: u32 },
    /// Execution succeeded and the proposal left the pending set
    Executed { proposal_id: Uuid, signature: String },
    /// Execution failed; the proposal stays pending
    ExecutionFailed { proposal_id: Uuid, error: String },
    /// A caller discarded the proposal
    Abandoned { proposal_id: Uuid },
    /// The owner registry changed
    OwnersUpdated { owner_count: usize },
    /// The approval policy was replaced
    PolicyUpdated {
        default_threshold: u32,
        rule_count: usize,
    },
}

/// Error types for coordinator operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApprovalError {
    #[error("Proposal not found: {0}")]
    NotFound(Uuid),

    #[error("Payload construction failed: {0}")]
    Construction(#[from] ConstructionError),
}

/// Result type for coordinator operations
pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// What an endorsement (or an execution retry) led to
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EndorseOutcome {
    /// The signer had already endorsed; nothing changed
    AlreadyEndorsed,
    /// Quorum not met yet
    Pending { verdict: Verdict },
    /// Quorum met and the payload executed
    Executed {
        verdict: Verdict,
        receipt: ExecutionReceipt,
    },
    /// Quorum met but execution failed; the proposal stays pending
    ExecutionFailed { verdict: Verdict, error: String },
}

/// Registry and policy snapshot for administration views
#[derive(Debug, Clone, Serialize)]
pub struct GovernanceSummary {
    pub owners: Vec<OwnerEntry>,
    pub default_threshold: u32,
    pub rules: Vec<RuleSummary>,
}

#[derive(Default)]
struct Governance {
    registry: OwnerRegistry,
    policy: ApprovalPolicy,
}

struct ProposalSlot {
    /// Serialises lifecycle transitions of this proposal
    gate: Mutex<()>,
    /// Proposal data; held only briefly so snapshots never wait on execution
    proposal: RwLock<Proposal>,
}

/// Coordinator for the proposal lifecycle
pub struct ProposalCoordinator {
    governance: RwLock<Governance>,
    /// Pending proposals by ID
    pending: RwLock<HashMap<Uuid, Arc<ProposalSlot>>>,
    builder: Arc<dyn PayloadBuilder>,
    executor: Arc<dyn Executor>,
    /// Event broadcaster
    event_tx: broadcast::Sender<ProposalEvent>,
}

impl ProposalCoordinator {
    /// Create a coordinator with an empty registry and a zero-threshold policy
    pub fn new(builder: Arc<dyn PayloadBuilder>, executor: Arc<dyn Executor>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            governance: RwLock::new(Governance::default()),
            pending: RwLock::new(HashMap::new()),
            builder,
            executor,
            event_tx,
        }
    }

    /// Start with a given registry and policy
    pub fn with_governance(mut self, registry: OwnerRegistry, policy: ApprovalPolicy) -> Self {
        self.governance = RwLock::new(Governance { registry, policy });
        self
    }

    /// Subscribe to coordinator events
    pub fn subscribe(&self) -> broadcast::Receiver<ProposalEvent> {
        self.event_tx.subscribe()
    }

    // Administration

    /// Replace owners and role labels from owner entries
    pub async fn configure_owners(&self, entries: Vec<OwnerEntry>) {
        let owner_count = {
            let mut governance = self.governance.write().await;
            governance.registry = OwnerRegistry::from_entries(entries);
            governance.registry.owner_count()
        };

        tracing::info!(owner_count, "Owner registry configured");
        let _ = self
            .event_tx
            .send(ProposalEvent::OwnersUpdated { owner_count });
    }

    /// Replace the owner set, keeping role labels
    pub async fn set_owners(&self, owners: Vec<Identity>) {
        let owner_count = {
            let mut governance = self.governance.write().await;
            governance.registry.set_owners(owners);
            governance.registry.owner_count()
        };

        tracing::info!(owner_count, "Owner set replaced");
        let _ = self
            .event_tx
            .send(ProposalEvent::OwnersUpdated { owner_count });
    }

    /// Label an identity with a role
    pub async fn set_role(&self, identity: Identity, role: Role) {
        let owner_count = {
            let mut governance = self.governance.write().await;
            governance.registry.set_role(identity.clone(), role);
            governance.registry.owner_count()
        };

        tracing::info!(%identity, role = role.as_str(), "Role assigned");

        let _ = self
            .event_tx
            .send(ProposalEvent::OwnersUpdated { owner_count });
    }

    /// Replace the default threshold and rule list
    pub async fn set_policy(&self, default_threshold: u32, rules: Vec<ApprovalRule>) {
        let rule_count = rules.len();
        {
            let mut governance = self.governance.write().await;
            governance.policy.set_logic(default_threshold, rules);
        }

        tracing::info!(default_threshold, rule_count, "Approval policy replaced");
        let _ = self.event_tx.send(ProposalEvent::PolicyUpdated {
            default_threshold,
            rule_count,
        });
    }

    /// Copy of the current owner registry
    pub async fn registry(&self) -> OwnerRegistry {
        self.governance.read().await.registry.clone()
    }

    pub async fn governance_summary(&self) -> GovernanceSummary {
        let governance = self.governance.read().await;
        GovernanceSummary {
            owners: governance.registry.entries(),
            default_threshold: governance.policy.default_threshold,
            rules: governance.policy.summary(),
        }
    }

    // Lifecycle

    /// Build a payload from caller parameters and store a new pending proposal
    pub async fn create_proposal(&self, params: ActionParams) -> ApprovalResult<Proposal> {
        let payload = self.builder.construct_payload(&params).await?;
        let proposal = Proposal::new(payload);
        let proposal_id = proposal.id;
        let amount = proposal.amount();

        {
            let mut pending = self.pending.write().await;
            pending.insert(
                proposal_id,
                Arc::new(ProposalSlot {
                    gate: Mutex::new(()),
                    proposal: RwLock::new(proposal.clone()),
                }),
            );
        }

        tracing::info!(%proposal_id, amount, "Proposal created");
        let _ = self.event_tx.send(ProposalEvent::ProposalCreated {
            proposal_id,
            amount,
        });

        Ok(proposal)
    }

    /// Record an endorsement and execute the proposal once quorum is met
    ///
    /// Endorsements are never rejected: a signer that is not an owner is
    /// recorded but does not count. Execution failure is reported in the
    /// outcome, not as an error.
    pub async fn endorse(
        &self,
        proposal_id: Uuid,
        signer: Identity,
    ) -> ApprovalResult<EndorseOutcome> {
        let slot = self.slot(proposal_id).await?;
        let _gate = slot.gate.lock().await;

        let snapshot = {
            let mut proposal = slot.proposal.write().await;
            if proposal.status.is_terminal() {
                return Err(ApprovalError::NotFound(proposal_id));
            }
            if !proposal.add_endorsement(signer.clone()) {
                tracing::debug!(%proposal_id, %signer, "Signer has already endorsed");
                return Ok(EndorseOutcome::AlreadyEndorsed);
            }
            proposal.clone()
        };

        let verdict = self.evaluate_snapshot(&snapshot).await;
        let counted = !verdict.non_counting.contains(&signer);
        if counted {
            tracing::info!(%proposal_id, %signer, "Endorsement recorded");
        } else {
            tracing::warn!(
                %proposal_id,
                %signer,
                "Endorsement recorded from non-owner; it will not count toward quorum"
            );
        }
        let _ = self.event_tx.send(ProposalEvent::Endorsed {
            proposal_id,
            signer,
            counted,
        });

        Ok(self.settle(proposal_id, &slot, verdict).await)
    }

    /// Re-evaluate a pending proposal and retry execution if it is approved
    pub async fn retry_execution(&self, proposal_id: Uuid) -> ApprovalResult<EndorseOutcome> {
        let slot = self.slot(proposal_id).await?;
        let _gate = slot.gate.lock().await;

        let snapshot = {
            let proposal = slot.proposal.read().await;
            if proposal.status.is_terminal() {
                return Err(ApprovalError::NotFound(proposal_id));
            }
            proposal.clone()
        };

        tracing::info!(%proposal_id, "Retrying execution");
        let verdict = self.evaluate_snapshot(&snapshot).await;
        Ok(self.settle(proposal_id, &slot, verdict).await)
    }

    /// Current verdict for a pending proposal
    pub async fn evaluate(&self, proposal_id: Uuid) -> ApprovalResult<Verdict> {
        let (_, verdict) = self.inspect(proposal_id).await?;
        Ok(verdict)
    }

    /// A pending proposal together with the verdict for that same snapshot
    pub async fn inspect(&self, proposal_id: Uuid) -> ApprovalResult<(Proposal, Verdict)> {
        let snapshot = self
            .get_proposal(proposal_id)
            .await
            .ok_or(ApprovalError::NotFound(proposal_id))?;
        let verdict = self.evaluate_snapshot(&snapshot).await;
        Ok((snapshot, verdict))
    }

    /// Discard a pending proposal
    pub async fn abandon(&self, proposal_id: Uuid) -> ApprovalResult<Proposal> {
        let slot = self.slot(proposal_id).await?;
        let _gate = slot.gate.lock().await;

        let proposal = {
            let mut proposal = slot.proposal.write().await;
            if proposal.status.is_terminal() {
                return Err(ApprovalError::NotFound(proposal_id));
            }
            proposal.set_status(ProposalStatus::Abandoned);
            proposal.clone()
        };
        self.pending.write().await.remove(&proposal_id);

        tracing::info!(%proposal_id, "Proposal abandoned");
        let _ = self
            .event_tx
            .send(ProposalEvent::Abandoned { proposal_id });

        Ok(proposal)
    }

    /// Get a pending proposal by ID
    pub async fn get_proposal(&self, proposal_id: Uuid) -> Option<Proposal> {
        let slot = self.slot(proposal_id).await.ok()?;
        let proposal = slot.proposal.read().await;
        if proposal.status.is_terminal() {
            return None;
        }
        Some(proposal.clone())
    }

    /// Snapshot of pending proposals, oldest first
    pub async fn list_pending(&self) -> Vec<Proposal> {
        let slots: Vec<Arc<ProposalSlot>> = {
            let pending = self.pending.read().await;
            pending.values().cloned().collect()
        };

        let snapshots = join_all(slots.iter().map(|slot| async move {
            let proposal = slot.proposal.read().await;
            if proposal.status.is_terminal() {
                None
            } else {
                Some(proposal.clone())
            }
        }))
        .await;

        let mut proposals: Vec<Proposal> = snapshots.into_iter().flatten().collect();
        proposals.sort_by_key(|p| p.created_at);
        proposals
    }

    async fn slot(&self, proposal_id: Uuid) -> ApprovalResult<Arc<ProposalSlot>> {
        let pending = self.pending.read().await;
        pending
            .get(&proposal_id)
            .cloned()
            .ok_or(ApprovalError::NotFound(proposal_id))
    }

    async fn evaluate_snapshot(&self, proposal: &Proposal) -> Verdict {
        let governance = self.governance.read().await;
        evaluate(proposal, &governance.registry, &governance.policy)
    }

    /// Act on a verdict. Caller must hold the slot gate.
    async fn settle(
        &self,
        proposal_id: Uuid,
        slot: &ProposalSlot,
        verdict: Verdict,
    ) -> EndorseOutcome {
        if !verdict.approved {
            let mut proposal = slot.proposal.write().await;
            if proposal.status == ProposalStatus::Approved {
                proposal.set_status(ProposalStatus::Pending);
            }
            tracing::debug!(
                %proposal_id,
                counted = verdict.counted,
                threshold = verdict.requirement.threshold,
                "Proposal requires more endorsements"
            );
            return EndorseOutcome::Pending { verdict };
        }

        let payload = {
            let mut proposal = slot.proposal.write().await;
            proposal.set_status(ProposalStatus::Approved);
            proposal.payload.clone()
        };

        tracing::info!(%proposal_id, counted = verdict.counted, "Proposal approved, executing");
        let _ = self.event_tx.send(ProposalEvent::Approved {
            proposal_id,
            counted: verdict.counted,
        });

        match self.executor.execute(&payload).await {
            Ok(receipt) => {
                slot.proposal
                    .write()
                    .await
                    .set_status(ProposalStatus::Executed);
                self.pending.write().await.remove(&proposal_id);

                tracing::info!(%proposal_id, signature = %receipt.signature, "Proposal executed");
                let _ = self.event_tx.send(ProposalEvent::Executed {
                    proposal_id,
                    signature: receipt.signature.clone(),
                });

                EndorseOutcome::Executed { verdict, receipt }
            }
            Err(e) => {
                tracing::error!(%proposal_id, error = %e, "Failed to execute proposal");
                let error = e.to_string();
                let _ = self.event_tx.send(ProposalEvent::ExecutionFailed {
                    proposal_id,
                    error: error.clone(),
                });

                EndorseOutcome::ExecutionFailed { verdict, error }
            }
        }
    }
}
