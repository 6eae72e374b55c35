//! Groth16-backed proof verification gateway.

use ark_bn254::{Bn254, Fr};
use ark_groth16::VerifyingKey;
use sha2::{Digest, Sha256};
use shielded_ledger::{Field, ProofVerifier, Relation, VerifierId};
use std::fmt;
use tracing::debug;
use zk_proofs::groth16::{deserialize_proof, deserialize_vk, verify_relation_proof, ZkError};
use zk_proofs::types::fr_from_be_bytes;

/// Verifies proofs for one relation against one verifying key.
///
/// The id is the SHA-256 of the compressed key, so the same key always yields the same
/// reference across restarts.
pub struct Groth16Gateway {
    relation: Relation,
    vk: VerifyingKey<Bn254>,
    vk_bytes: Vec<u8>,
    id: VerifierId,
}

impl Groth16Gateway {
    pub fn from_vk_bytes(relation: Relation, vk_bytes: Vec<u8>) -> Result<Self, ZkError> {
        let vk = deserialize_vk(&vk_bytes)?;

        // One base point per public input, plus the constant term.
        let expected = relation.public_input_len() + 1;
        if vk.gamma_abc_g1.len() != expected {
            return Err(ZkError::Serialization(format!(
                "verifying key takes {} public inputs, {relation} needs {}",
                vk.gamma_abc_g1.len().saturating_sub(1),
                relation.public_input_len()
            )));
        }

        let id = VerifierId::new(Sha256::digest(&vk_bytes).into());
        Ok(Self { relation, vk, vk_bytes, id })
    }

    pub fn vk_bytes(&self) -> &[u8] {
        &self.vk_bytes
    }
}

impl fmt::Debug for Groth16Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groth16Gateway")
            .field("relation", &self.relation)
            .field("id", &self.id)
            .finish()
    }
}

impl ProofVerifier for Groth16Gateway {
    fn verify(&self, proof: &[u8], public_inputs: &[Field]) -> bool {
        let Ok(proof) = deserialize_proof(proof) else {
            debug!(relation = %self.relation, "proof bytes do not decode");
            return false;
        };

        let inputs: Result<Vec<Fr>, _> = public_inputs.iter().map(|x| fr_from_be_bytes(x.as_bytes())).collect();
        let Ok(inputs) = inputs else {
            debug!(relation = %self.relation, "public input is not a canonical scalar");
            return false;
        };

        verify_relation_proof(&self.vk, &proof, &inputs).is_ok()
    }

    fn id(&self) -> VerifierId {
        self.id
    }
}
