use ark_bn254::Fr;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use zk_proofs::groth16::{
    deserialize_pk, deserialize_proof, deserialize_vk, prove_mint, prove_transfer, serialize_pk,
    serialize_proof, serialize_vk, setup_mint_keys, setup_transfer_keys, verify_relation_proof, ZkError,
};
use zk_proofs::note::{derive_address, note_commitment};
use zk_proofs::types::{fr_from_be_bytes, fr_to_be_bytes, MintWitness, TransferWitness};

#[test]
fn mint_proof_verifies_and_binds_request_id() {
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let (pk, vk) = setup_mint_keys(&mut rng).unwrap();

    let witness = MintWitness { owner: derive_address(Fr::from(11u64)), amount: 1_000, nonce: 0 };
    let (proof, public) = prove_mint(&mut rng, &pk, witness, Fr::from(7u64)).unwrap();
    let inputs = public.to_field_elems();
    verify_relation_proof(&vk, &proof, &inputs).unwrap();

    // Keys and proofs survive the wire.
    let vk = deserialize_vk(&serialize_vk(&vk).unwrap()).unwrap();
    let proof = deserialize_proof(&serialize_proof(&proof).unwrap()).unwrap();
    verify_relation_proof(&vk, &proof, &inputs).unwrap();

    // A proving key read back from disk still produces accepted proofs.
    let pk = deserialize_pk(&serialize_pk(&pk).unwrap()).unwrap();
    let (reproof, republic) = prove_mint(&mut rng, &pk, witness, Fr::from(7u64)).unwrap();
    assert_eq!(republic.to_field_elems(), inputs);
    verify_relation_proof(&vk, &reproof, &inputs).unwrap();
    assert!(deserialize_pk(&[0u8; 8]).is_err());

    let mut swapped = inputs.clone();
    swapped[1] = Fr::from(8u64);
    assert!(matches!(
        verify_relation_proof(&vk, &proof, &swapped),
        Err(ZkError::VerificationFailed)
    ));

    let mut other_note = inputs;
    other_note[0] = note_commitment(witness.owner, 1_001, 0);
    assert!(verify_relation_proof(&vk, &proof, &other_note).is_err());
}

#[test]
fn transfer_proof_verifies_against_its_public_inputs() {
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let (pk, vk) = setup_transfer_keys(&mut rng).unwrap();

    let witness = TransferWitness {
        secret: Fr::from(424242u64),
        balance: 100,
        nonce: 0,
        amount: 25,
        recipient: derive_address(Fr::from(99u64)),
    };
    let (proof, public) = prove_transfer(&mut rng, &pk, witness).unwrap();
    let inputs = public.to_field_elems();
    assert_eq!(inputs.len(), 5);
    verify_relation_proof(&vk, &proof, &inputs).unwrap();

    // Public inputs travel as 32-byte big-endian words.
    let decoded: Vec<Fr> = inputs
        .iter()
        .map(|x| fr_from_be_bytes(&fr_to_be_bytes(x)).unwrap())
        .collect();
    verify_relation_proof(&vk, &proof, &decoded).unwrap();

    // Any reordering breaks verification.
    let mut reordered = inputs.clone();
    reordered.swap(1, 2);
    assert!(verify_relation_proof(&vk, &proof, &reordered).is_err());

    // A mint key cannot check a transfer proof.
    let (_, mint_vk) = setup_mint_keys(&mut rng).unwrap();
    assert!(verify_relation_proof(&mint_vk, &proof, &inputs).is_err());
}

#[test]
fn overspending_transfer_is_refused_before_proving() {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let (pk, _) = setup_transfer_keys(&mut rng).unwrap();
    let witness = TransferWitness {
        secret: Fr::from(1u64),
        balance: 5,
        nonce: 0,
        amount: 6,
        recipient: Fr::from(2u64),
    };
    assert!(matches!(
        prove_transfer(&mut rng, &pk, witness),
        Err(ZkError::InsufficientBalance { balance: 5, amount: 6 })
    ));
}
