use crate::db::{self, Db};
use crate::errors::ApiError;
use crate::models::OperationResponse;
use crate::verifier::Groth16Gateway;
use shielded_ledger::{Ledger, ProofVerifier, Relation, Transition};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use zk_proofs::groth16::{serialize_pk, serialize_vk, setup_mint_keys, setup_transfer_keys};

use rand::rngs::OsRng;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub api_key: Arc<str>,
    ledger: Arc<Mutex<Ledger>>,
}

impl AppState {
    pub fn new(db: Db, api_key: impl Into<Arc<str>>, ledger: Ledger) -> Self {
        Self {
            db,
            api_key: api_key.into(),
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Short-lived read access for queries.
    pub async fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        let ledger = self.ledger.lock().await;
        f(&*ledger)
    }

    /// Admit, journal, then commit one transition, all under the ledger lock.
    ///
    /// Admission runs on a blocking thread since it includes the pairing check. If journaling
    /// fails the transition is dropped and the in-memory ledger is untouched.
    pub async fn execute<F>(&self, admit: F, verifier_key: Option<Vec<u8>>) -> Result<OperationResponse, ApiError>
    where
        F: FnOnce(&Ledger) -> Result<Transition, ApiError> + Send + 'static,
    {
        let guard = self.ledger.clone().lock_owned().await;

        let (mut guard, admitted) = tokio::task::spawn_blocking(move || {
            let admitted = admit(&*guard);
            (guard, admitted)
        })
        .await
        .map_err(|_| ApiError::Internal)?;
        let transition = admitted?;

        db::journal(&self.db, transition.events(), verifier_key.as_deref()).await?;

        let events = guard.commit(transition)?;
        Ok(OperationResponse {
            commitment_count: guard.commitment_count(),
            events,
        })
    }
}

/// Current verifier for `relation`: the journaled key if there is one, otherwise the key
/// produced by the local trusted setup (prototype), generated on first start.
pub async fn load_verifier(db: &Db, data_dir: &Path, relation: Relation) -> Result<Arc<Groth16Gateway>, ApiError> {
    if let Some((id, vk)) = db::load_verifier_key(db, relation).await? {
        let gateway = build_gateway(relation, vk).await?;
        if gateway.id() != id {
            error!(%relation, stored = %id, computed = %gateway.id(), "stored verifier id does not match its key");
            return Err(ApiError::Internal);
        }
        return Ok(Arc::new(gateway));
    }

    let vk = ensure_keys(data_dir.to_path_buf(), relation).await?;
    let gateway = build_gateway(relation, vk).await?;
    db::store_verifier_key(db, relation, gateway.id(), gateway.vk_bytes()).await?;
    info!(%relation, verifier = %gateway.id(), "verifier installed");
    Ok(Arc::new(gateway))
}

/// Decode and check a verifying key off the async runtime.
pub async fn build_gateway(relation: Relation, vk: Vec<u8>) -> Result<Groth16Gateway, ApiError> {
    tokio::task::spawn_blocking(move || Groth16Gateway::from_vk_bytes(relation, vk))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|e| ApiError::BadRequest(format!("invalid verifying key: {e}")))
}

/// Ensure Groth16 keys for `relation` exist on disk and return the verifying key bytes.
///
/// This runs the trusted setup (prototype) when no key is present.
async fn ensure_keys(data_dir: PathBuf, relation: Relation) -> Result<Vec<u8>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let keys_dir = data_dir.join("keys");
        std::fs::create_dir_all(&keys_dir).map_err(|_| ApiError::Internal)?;

        let pk_path = keys_dir.join(format!("{relation}_pk.bin"));
        let vk_path = keys_dir.join(format!("{relation}_vk.bin"));

        if vk_path.exists() {
            return std::fs::read(&vk_path).map_err(|_| ApiError::Internal);
        }

        // Trusted setup randomness (prototype).
        //
        // IMPORTANT: In production, use MPC setup or a transparent proof system.
        let mut rng = OsRng;
        let (pk, vk) = match relation {
            Relation::Mint => setup_mint_keys(&mut rng),
            Relation::Transfer => setup_transfer_keys(&mut rng),
        }
        .map_err(|_| ApiError::Internal)?;

        let pk_bytes = serialize_pk(&pk).map_err(|_| ApiError::Internal)?;
        let vk_bytes = serialize_vk(&vk).map_err(|_| ApiError::Internal)?;

        std::fs::write(&pk_path, pk_bytes).map_err(|_| ApiError::Internal)?;
        std::fs::write(&vk_path, &vk_bytes).map_err(|_| ApiError::Internal)?;

        info!(%relation, "generated Groth16 keys");
        Ok(vk_bytes)
    })
    .await
    .map_err(|_| ApiError::Internal)?
}
