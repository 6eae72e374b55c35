//! Tagged outcomes for every ledger operation.
//!
//! Each enum covers one operation family. `code()` returns the stable name callers can match on
//! across process boundaries.

use crate::types::{Field, Identity};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("commitment {0} already exists")]
    CommitmentAlreadyExists(Field),

    #[error("nullifier {0} already used")]
    NullifierAlreadyUsed(Field),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::CommitmentAlreadyExists(_) => "CommitmentAlreadyExists",
            RegistryError::NullifierAlreadyUsed(_) => "NullifierAlreadyUsed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintError {
    #[error("invalid public input shape: expected {expected} elements, got {got}")]
    InvalidPublicInputShape { expected: usize, got: usize },

    #[error("commitment {0} already exists")]
    CommitmentAlreadyExists(Field),

    #[error("mint proof rejected")]
    InvalidProof,
}

impl MintError {
    pub fn code(&self) -> &'static str {
        match self {
            MintError::InvalidPublicInputShape { .. } => "InvalidPublicInputShape",
            MintError::CommitmentAlreadyExists(_) => "CommitmentAlreadyExists",
            MintError::InvalidProof => "InvalidProof",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("invalid public input shape: expected {expected} elements, got {got}")]
    InvalidPublicInputShape { expected: usize, got: usize },

    #[error("input commitment {0} not found")]
    CommitmentNotFound(Field),

    #[error("nullifier {0} already used")]
    NullifierAlreadyUsed(Field),

    #[error("commitment {0} already exists")]
    CommitmentAlreadyExists(Field),

    #[error("transfer proof rejected")]
    InvalidProof,
}

impl TransferError {
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidPublicInputShape { .. } => "InvalidPublicInputShape",
            TransferError::CommitmentNotFound(_) => "CommitmentNotFound",
            TransferError::NullifierAlreadyUsed(_) => "NullifierAlreadyUsed",
            TransferError::CommitmentAlreadyExists(_) => "CommitmentAlreadyExists",
            TransferError::InvalidProof => "InvalidProof",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("caller {caller} is not the ledger admin")]
    OnlyOwner { caller: Identity },

    #[error("verifier reference is null")]
    InvalidReference,
}

impl AdminError {
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::OnlyOwner { .. } => "OnlyOwner",
            AdminError::InvalidReference => "InvalidReference",
        }
    }
}

/// An admitted transition was committed after the ledger had already moved on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stale transition: admitted at epoch {admitted}, ledger is at epoch {current}")]
pub struct StaleTransition {
    pub admitted: u64,
    pub current: u64,
}

impl StaleTransition {
    pub fn code(&self) -> &'static str {
        "StaleTransition"
    }
}
