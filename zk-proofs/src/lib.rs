//! ZK layer for the shielded ledger.
//!
//! This crate contains:
//! - Poseidon-based note derivations (address, commitment, nullifier).
//! - SNARK circuits for the mint and transfer relations.
//! - Prover + verifier orchestration.
//! - Serialization helpers for transporting proofs, keys and scalars.

pub mod constants;
pub mod circuit;
pub mod groth16;
pub mod note;
pub mod types;
