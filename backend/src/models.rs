use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shielded_ledger::{Field, Identity, LedgerEvent, Relation, VerifierId};

/// Body of `POST /api/v1/mint` and `POST /api/v1/transfer`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Proof bytes, standard base64. The ledger treats them as opaque.
    pub proof_b64: String,
    /// `0x`-hex field elements in relation order.
    pub public_inputs: Vec<Field>,
}

/// Result of an accepted transition.
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    pub commitment_count: u64,
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RotateVerifierRequest {
    pub vk_b64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitmentCountResponse {
    pub commitment_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitmentResponse {
    pub commitment: Field,
    pub exists: bool,
    /// 1-based position, when present.
    pub index: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NullifierResponse {
    pub nullifier: Field,
    pub used: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiersResponse {
    pub admin: Identity,
    pub mint: VerifierId,
    pub transfer: VerifierId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ZkVkResponse {
    pub relation: Relation,
    pub verifier_id: VerifierId,
    pub curve: String,
    pub proof_system: String,
    pub vk_b64: String,
}

#[derive(Debug, Deserialize)]
pub struct ListEventsParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
    pub events: Vec<JournaledEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JournaledEvent {
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    pub event: LedgerEvent,
}
