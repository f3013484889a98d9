//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use quorum::approval::{
    ActionParams, ApprovalPolicy, ApprovalRule, Condition, OwnerEntry, OwnerRegistry, Payload,
    ProposalCoordinator, Role,
};
use quorum::ledger::{ExecutionError, ExecutionReceipt, Executor, TransferBuilder};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Executor that records every payload it is handed
#[derive(Default)]
pub struct RecordingExecutor {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
    executed: Mutex<Vec<Payload>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Executor that sleeps before answering, to widen race windows
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn executed(&self) -> Vec<Payload> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(&self, payload: &Payload) -> Result<ExecutionReceipt, ExecutionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ExecutionError::Rejected {
                status: 503,
                body: "ledger busy".to_string(),
            });
        }
        self.executed.lock().unwrap().push(payload.clone());
        Ok(ExecutionReceipt::new(format!("sig-{}", n)))
    }
}

fn owner(identity: &str, role: Role) -> OwnerEntry {
    OwnerEntry {
        identity: identity.into(),
        role: Some(role),
    }
}

/// Owners H1, H2 (human) and A1 (AI agent)
pub fn scenario_registry() -> OwnerRegistry {
    OwnerRegistry::from_entries(vec![
        owner("H1", Role::Human),
        owner("H2", Role::Human),
        owner("A1", Role::AiAgent),
    ])
}

/// Amounts up to 0.5 need one human; everything else needs two endorsements
pub fn scenario_policy() -> ApprovalPolicy {
    ApprovalPolicy::new(
        2,
        vec![ApprovalRule::new(
            Condition::AmountAtMost { value: 0.5 },
            1,
            1,
            0,
        )],
    )
}

pub fn scenario_coordinator(executor: Arc<RecordingExecutor>) -> ProposalCoordinator {
    ProposalCoordinator::new(Arc::new(TransferBuilder::new()), executor)
        .with_governance(scenario_registry(), scenario_policy())
}

pub fn transfer(amount: f64) -> ActionParams {
    ActionParams {
        destination: "recipient".into(),
        amount,
        memo: None,
    }
}
