//! Groth16 prover/verifier orchestration for the mint and transfer circuits.
//!
//! SECURITY NOTE (prototype): Groth16 requires a trusted setup that produces a proving key (PK)
//! and verifying key (VK). This prototype generates keys locally. In production, an MPC ceremony
//! (or a transparent system) should be used.

use crate::circuit::{MintCircuit, TransferCircuit};
use crate::types::{MintPublicInputs, MintWitness, TransferPublicInputs, TransferWitness};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkError {
    #[error("insufficient balance: {balance} < {amount}")]
    InsufficientBalance { balance: u64, amount: u64 },

    #[error("nonce overflow")]
    NonceOverflow,

    #[error("scalar is not a canonical field element")]
    NonCanonicalScalar,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("proof verification failed")]
    VerificationFailed,

    #[error("arkworks error: {0}")]
    Ark(String),
}

/// Generate a Groth16 keypair for the mint circuit.
pub fn setup_mint_keys(rng: &mut impl RngCore) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ZkError> {
    // Constraints do not depend on witness values; any consistent assignment works.
    let witness = MintWitness { owner: Fr::from(0u64), amount: 0, nonce: 0 };
    let circuit = MintCircuit {
        witness,
        public_commitment: witness.commitment(),
        public_request_id: Fr::from(0u64),
    };

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    let vk = pk.vk.clone();
    Ok((pk, vk))
}

/// Generate a Groth16 keypair for the transfer circuit.
pub fn setup_transfer_keys(rng: &mut impl RngCore) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ZkError> {
    let witness = TransferWitness {
        secret: Fr::from(0u64),
        balance: 0,
        nonce: 0,
        amount: 0,
        recipient: Fr::from(0u64),
    };
    let circuit = transfer_circuit(witness, witness.public_inputs()?);

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    let vk = pk.vk.clone();
    Ok((pk, vk))
}

fn transfer_circuit(witness: TransferWitness, public: TransferPublicInputs) -> TransferCircuit {
    TransferCircuit {
        witness,
        public_input_commitment: public.input_commitment,
        public_sender_output: public.sender_output,
        public_recipient_output: public.recipient_output,
        public_nullifier: public.nullifier,
        public_new_nonce: public.new_nonce,
    }
}

/// Prove a mint of `witness` under `request_id`.
pub fn prove_mint(
    rng: &mut impl RngCore,
    pk: &ProvingKey<Bn254>,
    witness: MintWitness,
    request_id: Fr,
) -> Result<(Proof<Bn254>, MintPublicInputs), ZkError> {
    let public = MintPublicInputs { commitment: witness.commitment(), request_id };

    let circuit = MintCircuit {
        witness,
        public_commitment: public.commitment,
        public_request_id: public.request_id,
    };

    let proof = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    Ok((proof, public))
}

/// Prove a transfer. Fails before proving when the witness overspends.
pub fn prove_transfer(
    rng: &mut impl RngCore,
    pk: &ProvingKey<Bn254>,
    witness: TransferWitness,
) -> Result<(Proof<Bn254>, TransferPublicInputs), ZkError> {
    let public = witness.public_inputs()?;
    let circuit = transfer_circuit(witness, public);

    let proof = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    Ok((proof, public))
}

/// Verify a proof against an ordered public-input vector.
pub fn verify_relation_proof(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    public_inputs: &[Fr],
) -> Result<(), ZkError> {
    let pvk = prepare_verifying_key(vk);
    let ok = Groth16::<Bn254>::verify_proof(&pvk, proof, public_inputs)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;
    if !ok {
        return Err(ZkError::VerificationFailed);
    }
    Ok(())
}

/// Serialize a proving key to bytes.
pub fn serialize_pk(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    pk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, ZkError> {
    ProvingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    vk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ZkError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ZkError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}
