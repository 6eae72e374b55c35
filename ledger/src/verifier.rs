//! Proof verification gateway.
//!
//! The ledger never looks inside a proof. For each relation it holds one [`ProofVerifier`] and
//! consumes only the boolean it returns.

use crate::types::{Field, VerifierId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Public inputs of the mint relation: `[output_commitment, mint_request_id]`.
pub const MINT_PUBLIC_INPUTS: usize = 2;

/// Public inputs of the transfer relation:
/// `[input_commitment, sender_output, recipient_output, nullifier, new_nonce]`.
pub const TRANSFER_PUBLIC_INPUTS: usize = 5;

/// The statement a proof attests to. Each relation has its own verifier slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Mint,
    Transfer,
}

impl Relation {
    pub const ALL: [Relation; 2] = [Relation::Mint, Relation::Transfer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Mint => "mint",
            Relation::Transfer => "transfer",
        }
    }

    pub fn public_input_len(&self) -> usize {
        match self {
            Relation::Mint => MINT_PUBLIC_INPUTS,
            Relation::Transfer => TRANSFER_PUBLIC_INPUTS,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relation: {0}")]
pub struct UnknownRelation(pub String);

impl FromStr for Relation {
    type Err = UnknownRelation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mint" => Ok(Relation::Mint),
            "transfer" => Ok(Relation::Transfer),
            other => Err(UnknownRelation(other.to_string())),
        }
    }
}

/// A zero-knowledge verification capability for one relation.
///
/// Implementations must be deterministic and side-effect free, and must answer `false` rather
/// than panic when handed malformed proof bytes or inputs.
pub trait ProofVerifier: fmt::Debug + Send + Sync {
    fn verify(&self, proof: &[u8], public_inputs: &[Field]) -> bool;

    /// Reference recorded in `VerifierUpdated` events.
    fn id(&self) -> VerifierId;
}

/// A filled verifier slot.
pub type VerifierSlot = Arc<dyn ProofVerifier>;

/// Verifier with a fixed answer.
///
/// Useful as a placeholder slot that rejects everything until an admin installs a real one.
#[derive(Debug, Clone, Copy)]
pub struct FixedVerifier {
    id: VerifierId,
    accepts: bool,
}

impl FixedVerifier {
    pub fn accepting(id: VerifierId) -> Self {
        Self { id, accepts: true }
    }

    pub fn rejecting(id: VerifierId) -> Self {
        Self { id, accepts: false }
    }
}

impl ProofVerifier for FixedVerifier {
    fn verify(&self, _proof: &[u8], _public_inputs: &[Field]) -> bool {
        self.accepts
    }

    fn id(&self) -> VerifierId {
        self.id
    }
}
