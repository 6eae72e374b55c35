use proptest::prelude::*;
use shielded_ledger::registry::Registry;
use shielded_ledger::verifier::FixedVerifier;
use shielded_ledger::{Field, Identity, Ledger, LedgerConfig, VerifierId, VerifierSlot};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Mint { commitment: u8, request: u8 },
    Transfer { input: u8, sender: u8, recipient: u8, nullifier: u8 },
}

// Small value domains so collisions, double spends and unknown inputs are all common.
fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..16, any::<u8>()).prop_map(|(commitment, request)| Op::Mint { commitment, request }),
        (0u8..16, 0u8..16, 0u8..16, 0u8..8).prop_map(|(input, sender, recipient, nullifier)| {
            Op::Transfer { input, sender, recipient, nullifier }
        }),
    ]
}

fn field(tag: u64, v: u8) -> Field {
    Field::from_u64((tag << 8) | u64::from(v))
}

fn ledger() -> Ledger {
    let verifier: VerifierSlot = Arc::new(FixedVerifier::accepting(VerifierId::new([1; 32])));
    Ledger::new(LedgerConfig {
        admin: Identity::new([1; 20]),
        mint_verifier: verifier.clone(),
        transfer_verifier: verifier,
    })
    .unwrap()
}

proptest! {
    #[test]
    fn sets_only_grow_and_count_tracks_accepted_outputs(ops in prop::collection::vec(op(), 1..64)) {
        let mut ledger = ledger();
        let mut seen_commitments: HashSet<Field> = HashSet::new();
        let mut seen_nullifiers: HashSet<Field> = HashSet::new();

        for op in ops {
            let before = ledger.commitment_count();
            match op {
                Op::Mint { commitment, request } => {
                    let c = field(1, commitment);
                    let accepted = ledger.mint(b"p", &[c, field(9, request)]).is_ok();
                    prop_assert_eq!(accepted, !seen_commitments.contains(&c));
                    if accepted {
                        seen_commitments.insert(c);
                        prop_assert_eq!(ledger.commitment_count(), before + 1);
                    } else {
                        prop_assert_eq!(ledger.commitment_count(), before);
                    }
                }
                Op::Transfer { input, sender, recipient, nullifier } => {
                    let (i, s, r, n) = (field(1, input), field(1, sender), field(1, recipient), field(2, nullifier));
                    let result = ledger.transfer(b"p", &[i, s, r, n, Field::from_u64(1)]);
                    let expected = seen_commitments.contains(&i)
                        && !seen_nullifiers.contains(&n)
                        && !seen_commitments.contains(&s)
                        && !seen_commitments.contains(&r)
                        && s != r;
                    prop_assert_eq!(result.is_ok(), expected);
                    if expected {
                        seen_commitments.insert(s);
                        seen_commitments.insert(r);
                        seen_nullifiers.insert(n);
                        prop_assert_eq!(ledger.commitment_count(), before + 2);
                    } else {
                        prop_assert_eq!(ledger.commitment_count(), before);
                    }
                }
            }

            prop_assert_eq!(ledger.commitment_count(), seen_commitments.len() as u64);
            for c in &seen_commitments {
                prop_assert!(ledger.has_commitment(c));
            }
            for n in &seen_nullifiers {
                prop_assert!(ledger.is_nullifier_used(n));
            }
        }
    }

    #[test]
    fn restore_reproduces_indices(values in prop::collection::hash_set(any::<u64>(), 0..32)) {
        let commitments: Vec<Field> = values.into_iter().map(Field::from_u64).collect();
        let registry = Registry::restore(commitments.clone(), Vec::<Field>::new()).unwrap();

        prop_assert_eq!(registry.commitment_count(), commitments.len() as u64);
        for (i, c) in commitments.iter().enumerate() {
            prop_assert_eq!(registry.index_of(c), Some(i as u64 + 1));
        }
    }
}
