//! Crate-wide constants used by the circuits and host-side orchestration.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Bit width of note amounts and balances.
///
/// Values are range-checked to this width inside both circuits so `balance - amount` can never
/// wrap around the field modulus.
pub const AMOUNT_BITS: usize = 64;

// Domain-separation tags, absorbed first so the three hashes can never collide with each other.
pub const ADDRESS_TAG: u64 = 1;
pub const COMMITMENT_TAG: u64 = 2;
pub const NULLIFIER_TAG: u64 = 3;

// Width-3 Poseidon over BN254 (rate 2, capacity 1, alpha 5, 8 full and 57 partial rounds).
// Prototype parameters: derived at runtime, not taken from an audited constant set.
pub const POSEIDON_RATE: usize = 2;
pub const POSEIDON_CAPACITY: usize = 1;
pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;
pub const POSEIDON_ALPHA: u64 = 5;

/// Sponge parameters shared by the native hasher and the in-circuit gadget.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let full = POSEIDON_FULL_ROUNDS as u64;
    let partial = POSEIDON_PARTIAL_ROUNDS as u64;
    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(Fr::MODULUS_BIT_SIZE as u64, POSEIDON_RATE, full, partial, 0);

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        POSEIDON_CAPACITY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_matches_the_declared_width() {
        let cfg = poseidon_config();
        assert_eq!(cfg.rate + cfg.capacity, 3);
        assert_eq!(cfg.mds.len(), 3);
        assert_eq!(cfg.ark.len(), POSEIDON_FULL_ROUNDS + POSEIDON_PARTIAL_ROUNDS);
    }
}
