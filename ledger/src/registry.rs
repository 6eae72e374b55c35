//! Commitment and nullifier sets.
//!
//! Both sets only grow. Commitments keep their insertion order so the 1-based index reported in
//! `CommitmentAdded` events stays valid for the lifetime of the ledger.

use crate::errors::RegistryError;
use crate::types::Field;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct Registry {
    /// Commitment -> 1-based insertion index.
    index: HashMap<Field, u64>,
    commitments: Vec<Field>,
    nullifiers: HashSet<Field>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from previously accepted values.
    ///
    /// `commitments` must be in index order. Duplicates are rejected exactly as live inserts are.
    pub fn restore<C, N>(commitments: C, nullifiers: N) -> Result<Self, RegistryError>
    where
        C: IntoIterator<Item = Field>,
        N: IntoIterator<Item = Field>,
    {
        let mut registry = Self::new();
        for commitment in commitments {
            registry.insert(commitment)?;
        }
        for nullifier in nullifiers {
            registry.mark_used(nullifier)?;
        }
        Ok(registry)
    }

    pub fn exists(&self, commitment: &Field) -> bool {
        self.index.contains_key(commitment)
    }

    /// Insert a new commitment and return its 1-based index.
    pub fn insert(&mut self, commitment: Field) -> Result<u64, RegistryError> {
        match self.index.entry(commitment) {
            Entry::Occupied(_) => Err(RegistryError::CommitmentAlreadyExists(commitment)),
            Entry::Vacant(slot) => {
                self.commitments.push(commitment);
                let index = self.commitments.len() as u64;
                slot.insert(index);
                Ok(index)
            }
        }
    }

    pub fn is_used(&self, nullifier: &Field) -> bool {
        self.nullifiers.contains(nullifier)
    }

    pub fn mark_used(&mut self, nullifier: Field) -> Result<(), RegistryError> {
        if !self.nullifiers.insert(nullifier) {
            return Err(RegistryError::NullifierAlreadyUsed(nullifier));
        }
        Ok(())
    }

    /// Append a commitment whose absence the caller has already established.
    ///
    /// Only the ledger's apply path uses this, under the epoch check that guarantees nothing was
    /// written since the absence was observed.
    pub(crate) fn append_commitment(&mut self, commitment: Field) -> u64 {
        debug_assert!(!self.exists(&commitment), "commitment appended twice");
        self.commitments.push(commitment);
        let index = self.commitments.len() as u64;
        self.index.insert(commitment, index);
        index
    }

    pub(crate) fn append_nullifier(&mut self, nullifier: Field) {
        let fresh = self.nullifiers.insert(nullifier);
        debug_assert!(fresh, "nullifier appended twice");
    }

    pub fn commitment_count(&self) -> u64 {
        self.commitments.len() as u64
    }

    pub fn nullifier_count(&self) -> usize {
        self.nullifiers.len()
    }

    /// 1-based index of a commitment, if present.
    pub fn index_of(&self, commitment: &Field) -> Option<u64> {
        self.index.get(commitment).copied()
    }

    /// Commitments in insertion order.
    pub fn commitments(&self) -> &[Field] {
        &self.commitments
    }

    /// Spent nullifiers, in no particular order.
    pub fn nullifiers(&self) -> impl Iterator<Item = &Field> {
        self.nullifiers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(v: u64) -> Field {
        Field::from_u64(v)
    }

    #[test]
    fn insert_assigns_stable_one_based_indices() {
        let mut registry = Registry::new();
        assert_eq!(registry.insert(f(10)).unwrap(), 1);
        assert_eq!(registry.insert(f(20)).unwrap(), 2);
        assert_eq!(registry.index_of(&f(10)), Some(1));
        assert_eq!(registry.index_of(&f(20)), Some(2));
        assert_eq!(registry.commitments(), &[f(10), f(20)]);
        assert_eq!(registry.commitment_count(), 2);
    }

    #[test]
    fn duplicate_commitment_is_rejected_without_side_effects() {
        let mut registry = Registry::new();
        registry.insert(f(1)).unwrap();
        assert_eq!(
            registry.insert(f(1)),
            Err(RegistryError::CommitmentAlreadyExists(f(1)))
        );
        assert_eq!(registry.commitment_count(), 1);
        assert_eq!(registry.index_of(&f(1)), Some(1));
    }

    #[test]
    fn nullifier_can_be_marked_once() {
        let mut registry = Registry::new();
        assert!(!registry.is_used(&f(7)));
        registry.mark_used(f(7)).unwrap();
        assert!(registry.is_used(&f(7)));
        assert_eq!(
            registry.mark_used(f(7)),
            Err(RegistryError::NullifierAlreadyUsed(f(7)))
        );
        assert_eq!(registry.nullifier_count(), 1);
    }

    #[test]
    fn appends_continue_the_index_sequence() {
        let mut registry = Registry::new();
        registry.insert(f(1)).unwrap();
        assert_eq!(registry.append_commitment(f(2)), 2);
        assert_eq!(registry.append_commitment(f(3)), 3);
        registry.append_nullifier(f(100));
        assert!(registry.is_used(&f(100)));
        assert_eq!(registry.insert(f(3)), Err(RegistryError::CommitmentAlreadyExists(f(3))));
    }

    #[test]
    fn restore_rejects_duplicates() {
        let restored = Registry::restore([f(1), f(2)], [f(9)]).unwrap();
        assert_eq!(restored.commitment_count(), 2);
        assert!(restored.is_used(&f(9)));

        assert_eq!(
            Registry::restore([f(1), f(1)], Vec::<Field>::new()).unwrap_err(),
            RegistryError::CommitmentAlreadyExists(f(1))
        );
        assert_eq!(
            Registry::restore(Vec::<Field>::new(), [f(3), f(3)]).unwrap_err(),
            RegistryError::NullifierAlreadyUsed(f(3))
        );
    }
}
