//! HTTP routes over the proposal coordinator

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::approval::{
    ActionParams, ApprovalRule, EndorseOutcome, GovernanceSummary, Identity, OwnerEntry, Proposal,
    Verdict,
};
use crate::error::{AppError, Result};
use crate::AppState;

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/proposals", get(list_proposals).post(create_proposal))
        .route("/proposals/:id", get(get_proposal).delete(abandon_proposal))
        .route("/proposals/:id/endorsements", post(endorse))
        .route("/proposals/:id/execute", post(retry_execution))
        .route("/governance", get(get_governance))
        .route("/governance/owners", put(set_owners))
        .route("/governance/policy", put(set_policy))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// A pending proposal together with its current verdict
#[derive(Debug, Serialize)]
pub struct ProposalView {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub verdict: Verdict,
}

#[derive(Debug, Deserialize)]
pub struct EndorseRequest {
    pub signer: Identity,
}

#[derive(Debug, Deserialize)]
pub struct SetOwnersRequest {
    pub owners: Vec<OwnerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SetPolicyRequest {
    pub default_threshold: u32,
    #[serde(default)]
    pub rules: Vec<ApprovalRule>,
}

async fn list_proposals(State(state): State<Arc<AppState>>) -> Json<Vec<Proposal>> {
    Json(state.coordinator.list_pending().await)
}

async fn create_proposal(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ActionParams>,
) -> Result<(StatusCode, Json<Proposal>)> {
    let proposal = state.coordinator.create_proposal(params).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

async fn get_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProposalView>> {
    let (proposal, verdict) = state.coordinator.inspect(id).await?;
    Ok(Json(ProposalView { proposal, verdict }))
}

async fn abandon_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>> {
    Ok(Json(state.coordinator.abandon(id).await?))
}

async fn endorse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<EndorseRequest>,
) -> Result<Json<EndorseOutcome>> {
    if request.signer.as_str().trim().is_empty() {
        return Err(AppError::BadRequest("signer must not be empty".to_string()));
    }
    Ok(Json(state.coordinator.endorse(id, request.signer).await?))
}

async fn retry_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EndorseOutcome>> {
    Ok(Json(state.coordinator.retry_execution(id).await?))
}

async fn get_governance(State(state): State<Arc<AppState>>) -> Json<GovernanceSummary> {
    Json(state.coordinator.governance_summary().await)
}

async fn set_owners(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetOwnersRequest>,
) -> Json<GovernanceSummary> {
    state.coordinator.configure_owners(request.owners).await;
    Json(state.coordinator.governance_summary().await)
}

async fn set_policy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPolicyRequest>,
) -> Json<GovernanceSummary> {
    state
        .coordinator
        .set_policy(request.default_threshold, request.rules)
        .await;
    Json(state.coordinator.governance_summary().await)
}
