//! Types shared between the circuits and the host-side prover/verifier.

use crate::groth16::ZkError;
use crate::note::{derive_address, note_commitment, nullifier};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::CanonicalDeserialize;

/// Private inputs of a mint: the note being created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintWitness {
    pub owner: Fr,
    pub amount: u64,
    pub nonce: u64,
}

impl MintWitness {
    pub fn commitment(&self) -> Fr {
        note_commitment(self.owner, self.amount, self.nonce)
    }
}

/// Private inputs of a transfer.
///
/// The sender spends their note `(derive_address(secret), balance, nonce)` and receives change
/// `balance - amount` at `nonce + 1`. The recipient note carries `amount` at the same new nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferWitness {
    pub secret: Fr,
    pub balance: u64,
    pub nonce: u64,
    pub amount: u64,
    pub recipient: Fr,
}

impl TransferWitness {
    pub fn new_nonce(&self) -> Result<u64, ZkError> {
        self.nonce.checked_add(1).ok_or(ZkError::NonceOverflow)
    }

    pub fn change(&self) -> Result<u64, ZkError> {
        self.balance
            .checked_sub(self.amount)
            .ok_or(ZkError::InsufficientBalance { balance: self.balance, amount: self.amount })
    }

    /// Public inputs the circuit enforces for this witness.
    pub fn public_inputs(&self) -> Result<TransferPublicInputs, ZkError> {
        let owner = derive_address(self.secret);
        let change = self.change()?;
        let new_nonce = self.new_nonce()?;

        Ok(TransferPublicInputs {
            input_commitment: note_commitment(owner, self.balance, self.nonce),
            sender_output: note_commitment(owner, change, new_nonce),
            recipient_output: note_commitment(self.recipient, self.amount, new_nonce),
            nullifier: nullifier(self.secret, self.nonce),
            new_nonce: Fr::from(new_nonce),
        })
    }
}

/// Public inputs for a mint proof.
///
/// Ordering MUST match the circuit's public input allocation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintPublicInputs {
    pub commitment: Fr,
    pub request_id: Fr,
}

impl MintPublicInputs {
    pub fn to_field_elems(&self) -> Vec<Fr> {
        vec![self.commitment, self.request_id]
    }
}

/// Public inputs for a transfer proof, in circuit allocation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferPublicInputs {
    pub input_commitment: Fr,
    pub sender_output: Fr,
    pub recipient_output: Fr,
    pub nullifier: Fr,
    pub new_nonce: Fr,
}

impl TransferPublicInputs {
    pub fn to_field_elems(&self) -> Vec<Fr> {
        vec![
            self.input_commitment,
            self.sender_output,
            self.recipient_output,
            self.nullifier,
            self.new_nonce,
        ]
    }
}

/// Encode a scalar as 32 big-endian bytes.
pub fn fr_to_be_bytes(x: &Fr) -> [u8; 32] {
    let le = x.into_bigint().to_bytes_le();
    let mut out = [0u8; 32];
    for (dst, src) in out.iter_mut().rev().zip(le.iter()) {
        *dst = *src;
    }
    out
}

/// Decode 32 big-endian bytes into a scalar.
///
/// Values at or above the field modulus are rejected rather than reduced, so every scalar has
/// exactly one byte encoding.
pub fn fr_from_be_bytes(bytes: &[u8; 32]) -> Result<Fr, ZkError> {
    let mut le = *bytes;
    le.reverse();
    Fr::deserialize_compressed(&le[..]).map_err(|_| ZkError::NonCanonicalScalar)
}
