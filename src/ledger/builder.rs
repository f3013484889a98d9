//! Local transfer payload builder
//!
//! Produces a transfer instruction, plus a memo instruction when the caller
//! supplied one, in a JSON body the ledger gateway understands.

use async_trait::async_trait;
use serde_json::json;

use super::{ConstructionError, PayloadBuilder};
use crate::approval::{ActionParams, Identity, Payload};

/// Base units per whole ledger unit
pub const BASE_UNITS_PER_UNIT: f64 = 1e9;

/// Builds transfer payloads from a fixed source account
#[derive(Debug, Clone, Default)]
pub struct TransferBuilder {
    source: Option<Identity>,
}

impl TransferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debit the given account instead of leaving the source to the gateway
    pub fn with_source(source: Identity) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn source(&self) -> Option<&Identity> {
        self.source.as_ref()
    }

    fn to_base_units(amount: f64) -> Result<u64, ConstructionError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ConstructionError::InvalidAmount(amount));
        }
        let units = (amount * BASE_UNITS_PER_UNIT).round();
        if units < 1.0 || units > u64::MAX as f64 {
            return Err(ConstructionError::InvalidAmount(amount));
        }
        Ok(units as u64)
    }
}

#[async_trait]
impl PayloadBuilder for TransferBuilder {
    async fn construct_payload(&self, params: &ActionParams) -> Result<Payload, ConstructionError> {
        if params.destination.as_str().trim().is_empty() {
            return Err(ConstructionError::MissingDestination);
        }
        if self.source.as_ref() == Some(&params.destination) {
            return Err(ConstructionError::Rejected(format!(
                "destination {} is the source account",
                params.destination
            )));
        }
        let base_units = Self::to_base_units(params.amount)?;

        let mut instructions = vec![json!({
            "program": "system",
            "type": "transfer",
            "to": params.destination,
            "base_units": base_units,
        })];

        if let Some(memo) = params.memo.as_deref().filter(|m| !m.is_empty()) {
            instructions.push(json!({
                "program": "memo",
                "data": memo,
            }));
        }

        Ok(Payload {
            destination: params.destination.clone(),
            amount: params.amount,
            memo: params.memo.clone(),
            body: json!({
                "source": self.source,
                "instructions": instructions,
            }),
        })
    }
}
