//! Approval policy: ordered rules with a default quorum
//!
//! Rules are scanned in order and the first rule whose condition matches a
//! proposal decides its requirement. Later rules are shadowed for that
//! proposal and their conditions are never evaluated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::proposal::Proposal;
use super::registry::Identity;

/// Predicate used by [`Condition::Predicate`]
pub type PredicateFn = Arc<dyn Fn(&Proposal) -> bool + Send + Sync>;

/// When a rule applies to a proposal
///
/// The declarative variants can be loaded from configuration. `Predicate`
/// carries an in-process closure and is never (de)serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Matches every proposal
    Always,
    /// amount <= value
    AmountAtMost { value: f64 },
    /// amount < value
    AmountBelow { value: f64 },
    /// amount >= value
    AmountAtLeast { value: f64 },
    /// amount > value
    AmountAbove { value: f64 },
    /// min <= amount <= max
    AmountBetween { min: f64, max: f64 },
    /// The proposal carries a memo
    HasMemo,
    /// The proposal pays a specific destination
    DestinationIs { identity: Identity },
    #[serde(skip)]
    Predicate(PredicateFn),
}

impl Condition {
    /// Wrap a closure as a condition
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Proposal) -> bool + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(f))
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        let amount = proposal.amount();
        match self {
            Condition::Always => true,
            Condition::AmountAtMost { value } => amount <= *value,
            Condition::AmountBelow { value } => amount < *value,
            Condition::AmountAtLeast { value } => amount >= *value,
            Condition::AmountAbove { value } => amount > *value,
            Condition::AmountBetween { min, max } => amount >= *min && amount <= *max,
            Condition::HasMemo => proposal.payload.memo.is_some(),
            Condition::DestinationIs { identity } => &proposal.payload.destination == identity,
            Condition::Predicate(f) => f(proposal),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::AmountAtMost { value } => write!(f, "amount <= {}", value),
            Condition::AmountBelow { value } => write!(f, "amount < {}", value),
            Condition::AmountAtLeast { value } => write!(f, "amount >= {}", value),
            Condition::AmountAbove { value } => write!(f, "amount > {}", value),
            Condition::AmountBetween { min, max } => {
                write!(f, "{} <= amount <= {}", min, max)
            }
            Condition::HasMemo => write!(f, "has memo"),
            Condition::DestinationIs { identity } => write!(f, "destination == {}", identity),
            Condition::Predicate(_) => write!(f, "custom predicate"),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self)
    }
}

/// Quorum that must be met for approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requirement {
    /// Minimum number of counted owner endorsements
    pub threshold: u32,
    /// Minimum number of counted human endorsements
    pub humans_required: u32,
    /// Minimum number of counted AI agent endorsements
    pub ai_agents_required: u32,
}

impl Requirement {
    pub fn new(threshold: u32, humans_required: u32, ai_agents_required: u32) -> Self {
        Self {
            threshold,
            humans_required,
            ai_agents_required,
        }
    }

    /// Requirement with only a total threshold
    pub fn threshold_only(threshold: u32) -> Self {
        Self::new(threshold, 0, 0)
    }
}

/// A conditional requirement
///
/// `threshold >= max(humans_required, ai_agents_required)` is conventional
/// but not checked; rules are applied exactly as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub condition: Condition,
    pub threshold: u32,
    #[serde(default)]
    pub humans_required: u32,
    #[serde(default)]
    pub ai_agents_required: u32,
}

impl ApprovalRule {
    pub fn new(
        condition: Condition,
        threshold: u32,
        humans_required: u32,
        ai_agents_required: u32,
    ) -> Self {
        Self {
            condition,
            threshold,
            humans_required,
            ai_agents_required,
        }
    }

    pub fn requirement(&self) -> Requirement {
        Requirement::new(self.threshold, self.humans_required, self.ai_agents_required)
    }
}

/// Printable view of a rule, including closure-backed ones
#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    pub condition: String,
    pub threshold: u32,
    pub humans_required: u32,
    pub ai_agents_required: u32,
}

impl From<&ApprovalRule> for RuleSummary {
    fn from(rule: &ApprovalRule) -> Self {
        Self {
            condition: rule.condition.to_string(),
            threshold: rule.threshold,
            humans_required: rule.humans_required,
            ai_agents_required: rule.ai_agents_required,
        }
    }
}

/// Ordered rules plus the fallback threshold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    pub default_threshold: u32,
    #[serde(default)]
    pub rules: Vec<ApprovalRule>,
}

impl ApprovalPolicy {
    pub fn new(default_threshold: u32, rules: Vec<ApprovalRule>) -> Self {
        Self {
            default_threshold,
            rules,
        }
    }

    /// Replace the default threshold and the rule list together
    pub fn set_logic(&mut self, default_threshold: u32, rules: Vec<ApprovalRule>) {
        self.default_threshold = default_threshold;
        self.rules = rules;
    }

    /// Requirement applied to a proposal: first matching rule, else the default
    pub fn resolve(&self, proposal: &Proposal) -> Requirement {
        self.rules
            .iter()
            .find(|rule| rule.condition.matches(proposal))
            .map(ApprovalRule::requirement)
            .unwrap_or_else(|| Requirement::threshold_only(self.default_threshold))
    }

    pub fn summary(&self) -> Vec<RuleSummary> {
        self.rules.iter().map(RuleSummary::from).collect()
    }
}
