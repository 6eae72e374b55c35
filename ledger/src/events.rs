//! Notifications emitted by accepted transitions.

use crate::types::{Field, VerifierId};
use crate::verifier::Relation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// `index` is the 1-based position of the commitment in the commitment set.
    CommitmentAdded { commitment: Field, index: u64 },
    NullifierUsed { nullifier: Field },
    PrivateMint { commitment: Field, request_id: Field, timestamp: u64 },
    PrivateTransfer {
        nullifier: Field,
        sender_output: Field,
        recipient_output: Field,
        timestamp: u64,
    },
    VerifierUpdated { relation: Relation, verifier: VerifierId },
}

impl LedgerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::CommitmentAdded { .. } => "CommitmentAdded",
            LedgerEvent::NullifierUsed { .. } => "NullifierUsed",
            LedgerEvent::PrivateMint { .. } => "PrivateMint",
            LedgerEvent::PrivateTransfer { .. } => "PrivateTransfer",
            LedgerEvent::VerifierUpdated { .. } => "VerifierUpdated",
        }
    }
}
