//! Shielded-value ledger core.
//!
//! This crate contains:
//! - The commitment/nullifier registry (append-only sets with uniqueness checks).
//! - The proof verification gateway abstraction, one swappable verifier per relation.
//! - The mint/transfer state machine and admin-gated verifier rotation.
//!
//! Nothing here performs cryptography. Proofs are opaque bytes handed to a [`ProofVerifier`].

pub mod clock;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod types;
pub mod verifier;

pub use errors::{AdminError, MintError, RegistryError, StaleTransition, TransferError};
pub use events::LedgerEvent;
pub use ledger::{Ledger, LedgerConfig, Transition};
pub use types::{Field, Identity, VerifierId};
pub use verifier::{ProofVerifier, Relation, VerifierSlot};
