//! The shielded ledger state machine.
//!
//! Every operation runs in two steps:
//! 1) Admission (`admit_*`, `&self`): shape and precondition checks, then the gateway call. The
//!    result is a [`Transition`] carrying the exact events it will emit.
//! 2) Commit (`commit`, `&mut self`): applies the transition. A transition admitted at an older
//!    epoch is refused, so nothing observable can happen between a check and its mutation.
//!
//! `mint`, `transfer` and the verifier setters run both steps back to back.
//!
//! Check order is part of the interface: shape, existence, nullifier, uniqueness, proof. A
//! proof that would verify is still refused with the uniqueness error when an output exists.

use crate::clock::{Clock, SystemClock};
use crate::errors::{AdminError, MintError, StaleTransition, TransferError};
use crate::events::LedgerEvent;
use crate::registry::Registry;
use crate::types::{Field, Identity, VerifierId};
use crate::verifier::{Relation, VerifierSlot, MINT_PUBLIC_INPUTS, TRANSFER_PUBLIC_INPUTS};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Construction-time parameters.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub admin: Identity,
    pub mint_verifier: VerifierSlot,
    pub transfer_verifier: VerifierSlot,
}

#[derive(Debug)]
pub struct Ledger {
    admin: Identity,
    mint_verifier: VerifierSlot,
    transfer_verifier: VerifierSlot,
    registry: Registry,
    /// Number of transitions applied since construction.
    epoch: u64,
    clock: Arc<dyn Clock>,
}

/// An admitted, not yet applied, state change.
#[derive(Debug, Clone)]
pub struct Transition {
    epoch: u64,
    change: Change,
    events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone)]
enum Change {
    Mint {
        commitment: Field,
    },
    Transfer {
        nullifier: Field,
        sender_output: Field,
        recipient_output: Field,
    },
    Rotate {
        relation: Relation,
        verifier: VerifierSlot,
    },
}

impl Transition {
    /// Epoch the transition was admitted at.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Events the transition emits when committed, in emission order.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }
}

impl Ledger {
    /// Create an empty ledger. Both initial verifiers must be non-null references.
    pub fn new(config: LedgerConfig) -> Result<Self, AdminError> {
        Self::with_registry(config, Registry::new())
    }

    /// Resume a ledger over previously accepted commitments and nullifiers.
    pub fn with_registry(config: LedgerConfig, registry: Registry) -> Result<Self, AdminError> {
        if config.mint_verifier.id().is_zero() || config.transfer_verifier.id().is_zero() {
            return Err(AdminError::InvalidReference);
        }

        Ok(Self {
            admin: config.admin,
            mint_verifier: config.mint_verifier,
            transfer_verifier: config.transfer_verifier,
            registry,
            epoch: 0,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn has_commitment(&self, commitment: &Field) -> bool {
        self.registry.exists(commitment)
    }

    pub fn is_nullifier_used(&self, nullifier: &Field) -> bool {
        self.registry.is_used(nullifier)
    }

    pub fn commitment_count(&self) -> u64 {
        self.registry.commitment_count()
    }

    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn verifier(&self, relation: Relation) -> &VerifierSlot {
        match relation {
            Relation::Mint => &self.mint_verifier,
            Relation::Transfer => &self.transfer_verifier,
        }
    }

    pub fn verifier_id(&self, relation: Relation) -> VerifierId {
        self.verifier(relation).id()
    }

    /// Check a mint against the current state without applying it.
    pub fn admit_mint(&self, proof: &[u8], public_inputs: &[Field]) -> Result<Transition, MintError> {
        let [commitment, request_id] = public_inputs else {
            return Err(MintError::InvalidPublicInputShape {
                expected: MINT_PUBLIC_INPUTS,
                got: public_inputs.len(),
            });
        };

        if self.registry.exists(commitment) {
            debug!(%commitment, "mint rejected: commitment exists");
            return Err(MintError::CommitmentAlreadyExists(*commitment));
        }

        if !self.mint_verifier.verify(proof, public_inputs) {
            debug!(%commitment, "mint rejected: proof did not verify");
            return Err(MintError::InvalidProof);
        }

        let index = self.registry.commitment_count() + 1;
        let timestamp = self.clock.now();

        Ok(Transition {
            epoch: self.epoch,
            change: Change::Mint { commitment: *commitment },
            events: vec![
                LedgerEvent::CommitmentAdded { commitment: *commitment, index },
                LedgerEvent::PrivateMint {
                    commitment: *commitment,
                    request_id: *request_id,
                    timestamp,
                },
            ],
        })
    }

    /// Check a transfer against the current state without applying it.
    pub fn admit_transfer(&self, proof: &[u8], public_inputs: &[Field]) -> Result<Transition, TransferError> {
        let [input, sender_output, recipient_output, nullifier, _new_nonce] = public_inputs else {
            return Err(TransferError::InvalidPublicInputShape {
                expected: TRANSFER_PUBLIC_INPUTS,
                got: public_inputs.len(),
            });
        };

        if !self.registry.exists(input) {
            debug!(%input, "transfer rejected: input commitment unknown");
            return Err(TransferError::CommitmentNotFound(*input));
        }

        // Double-spend check.
        if self.registry.is_used(nullifier) {
            debug!(%nullifier, "transfer rejected: nullifier already used");
            return Err(TransferError::NullifierAlreadyUsed(*nullifier));
        }

        for output in [sender_output, recipient_output] {
            if self.registry.exists(output) {
                debug!(%output, "transfer rejected: output commitment exists");
                return Err(TransferError::CommitmentAlreadyExists(*output));
            }
        }
        // The second insert would collide with the first.
        if sender_output == recipient_output {
            debug!(output = %recipient_output, "transfer rejected: outputs are identical");
            return Err(TransferError::CommitmentAlreadyExists(*recipient_output));
        }

        if !self.transfer_verifier.verify(proof, public_inputs) {
            debug!(%nullifier, "transfer rejected: proof did not verify");
            return Err(TransferError::InvalidProof);
        }

        let count = self.registry.commitment_count() + 2;
        let timestamp = self.clock.now();

        Ok(Transition {
            epoch: self.epoch,
            change: Change::Transfer {
                nullifier: *nullifier,
                sender_output: *sender_output,
                recipient_output: *recipient_output,
            },
            events: vec![
                LedgerEvent::NullifierUsed { nullifier: *nullifier },
                LedgerEvent::CommitmentAdded { commitment: *sender_output, index: count - 1 },
                LedgerEvent::CommitmentAdded { commitment: *recipient_output, index: count },
                LedgerEvent::PrivateTransfer {
                    nullifier: *nullifier,
                    sender_output: *sender_output,
                    recipient_output: *recipient_output,
                    timestamp,
                },
            ],
        })
    }

    /// Check a verifier rotation without applying it.
    pub fn admit_rotation(
        &self,
        caller: &Identity,
        relation: Relation,
        verifier: VerifierSlot,
    ) -> Result<Transition, AdminError> {
        if *caller != self.admin {
            warn!(%caller, %relation, "verifier rotation by non-admin refused");
            return Err(AdminError::OnlyOwner { caller: *caller });
        }

        let id = verifier.id();
        if id.is_zero() {
            return Err(AdminError::InvalidReference);
        }

        Ok(Transition {
            epoch: self.epoch,
            change: Change::Rotate { relation, verifier },
            events: vec![LedgerEvent::VerifierUpdated { relation, verifier: id }],
        })
    }

    /// Apply an admitted transition, provided nothing was applied since it was admitted.
    pub fn commit(&mut self, transition: Transition) -> Result<Vec<LedgerEvent>, StaleTransition> {
        if transition.epoch != self.epoch {
            return Err(StaleTransition {
                admitted: transition.epoch,
                current: self.epoch,
            });
        }
        Ok(self.apply(transition))
    }

    pub fn mint(&mut self, proof: &[u8], public_inputs: &[Field]) -> Result<Vec<LedgerEvent>, MintError> {
        let transition = self.admit_mint(proof, public_inputs)?;
        Ok(self.apply(transition))
    }

    pub fn transfer(&mut self, proof: &[u8], public_inputs: &[Field]) -> Result<Vec<LedgerEvent>, TransferError> {
        let transition = self.admit_transfer(proof, public_inputs)?;
        Ok(self.apply(transition))
    }

    pub fn set_verifier(
        &mut self,
        caller: &Identity,
        relation: Relation,
        verifier: VerifierSlot,
    ) -> Result<Vec<LedgerEvent>, AdminError> {
        let transition = self.admit_rotation(caller, relation, verifier)?;
        Ok(self.apply(transition))
    }

    pub fn set_mint_verifier(&mut self, caller: &Identity, verifier: VerifierSlot) -> Result<Vec<LedgerEvent>, AdminError> {
        self.set_verifier(caller, Relation::Mint, verifier)
    }

    pub fn set_transfer_verifier(
        &mut self,
        caller: &Identity,
        verifier: VerifierSlot,
    ) -> Result<Vec<LedgerEvent>, AdminError> {
        self.set_verifier(caller, Relation::Transfer, verifier)
    }

    /// Callers guarantee `transition` was admitted at the current epoch.
    fn apply(&mut self, transition: Transition) -> Vec<LedgerEvent> {
        match transition.change {
            Change::Mint { commitment } => {
                let index = self.registry.append_commitment(commitment);
                info!(%commitment, index, "mint accepted");
            }
            Change::Transfer { nullifier, sender_output, recipient_output } => {
                self.registry.append_nullifier(nullifier);
                self.registry.append_commitment(sender_output);
                let count = self.registry.append_commitment(recipient_output);
                info!(%nullifier, count, "transfer accepted");
            }
            Change::Rotate { relation, verifier } => {
                let id = verifier.id();
                match relation {
                    Relation::Mint => self.mint_verifier = verifier,
                    Relation::Transfer => self.transfer_verifier = verifier,
                }
                warn!(%relation, verifier = %id, "verifier rotated");
            }
        }
        self.epoch += 1;
        transition.events
    }
}
