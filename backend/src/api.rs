use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::state::{build_gateway, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use base64::Engine;
use shielded_ledger::{AdminError, Field, Identity, Relation, VerifierSlot};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

pub const API_KEY_HEADER: &str = "X-API-KEY";
pub const CALLER_HEADER: &str = "X-CALLER";

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/mint", post(mint))
        .route("/api/v1/transfer", post(transfer))
        .route("/api/v1/admin/verifiers/:relation", put(rotate_verifier))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/commitments/count", get(commitment_count))
        .route("/api/v1/commitments/:commitment", get(get_commitment))
        .route("/api/v1/nullifiers/:nullifier", get(get_nullifier))
        .route("/api/v1/events", get(list_events))
        .route("/api/v1/verifiers", get(get_verifiers))
        .route("/api/v1/zk/vk/:relation", get(get_vk))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(provided_key) = headers.get(API_KEY_HEADER) {
        if provided_key == state.api_key.as_ref() {
            return Ok(next.run(request).await);
        }
    }

    warn!("unauthorized access attempt");
    Err(ApiError::Unauthorized)
}

fn decode_b64(value: &str, name: &str) -> Result<Vec<u8>, ApiError> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|_| ApiError::BadRequest(format!("invalid {name}")))
}

fn parse_field(value: &str, name: &str) -> Result<Field, ApiError> {
    value.parse().map_err(|e| ApiError::BadRequest(format!("invalid {name}: {e}")))
}

fn parse_relation(value: &str) -> Result<Relation, ApiError> {
    value.parse().map_err(|e| ApiError::NotFound(format!("{e}")))
}

async fn mint(
    State(state): State<AppState>,
    body: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let Json(req) = body?;
    let proof = decode_b64(&req.proof_b64, "proof_b64")?;
    let inputs = req.public_inputs;

    let response = state
        .execute(move |ledger| Ok(ledger.admit_mint(&proof, &inputs)?), None)
        .await?;
    Ok(Json(response))
}

async fn transfer(
    State(state): State<AppState>,
    body: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let Json(req) = body?;
    let proof = decode_b64(&req.proof_b64, "proof_b64")?;
    let inputs = req.public_inputs;

    let response = state
        .execute(move |ledger| Ok(ledger.admit_transfer(&proof, &inputs)?), None)
        .await?;
    Ok(Json(response))
}

async fn rotate_verifier(
    State(state): State<AppState>,
    Path(relation): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RotateVerifierRequest>, JsonRejection>,
) -> Result<Json<OperationResponse>, ApiError> {
    let relation = parse_relation(&relation)?;

    let caller = headers
        .get(CALLER_HEADER)
        .ok_or_else(|| ApiError::BadRequest(format!("missing {CALLER_HEADER} header")))?
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("invalid {CALLER_HEADER} header")))?;
    let caller: Identity = caller
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid {CALLER_HEADER} header: {e}")))?;

    // Authorization is decided before the key is even decoded.
    let admin = state.read(|ledger| *ledger.admin()).await;
    if caller != admin {
        warn!(%caller, %relation, "verifier rotation by non-admin refused");
        return Err(AdminError::OnlyOwner { caller }.into());
    }

    let Json(req) = body?;
    let vk = decode_b64(&req.vk_b64, "vk_b64")?;
    let gateway = build_gateway(relation, vk).await?;
    let vk_bytes = gateway.vk_bytes().to_vec();
    let gateway: VerifierSlot = Arc::new(gateway);

    let response = state
        .execute(
            move |ledger| Ok(ledger.admit_rotation(&caller, relation, gateway)?),
            Some(vk_bytes),
        )
        .await?;
    Ok(Json(response))
}

async fn commitment_count(State(state): State<AppState>) -> Json<CommitmentCountResponse> {
    let commitment_count = state.read(|ledger| ledger.commitment_count()).await;
    Json(CommitmentCountResponse { commitment_count })
}

async fn get_commitment(
    State(state): State<AppState>,
    Path(commitment): Path<String>,
) -> Result<Json<CommitmentResponse>, ApiError> {
    let commitment = parse_field(&commitment, "commitment")?;
    let index = state.read(|ledger| ledger.registry().index_of(&commitment)).await;

    Ok(Json(CommitmentResponse {
        commitment,
        exists: index.is_some(),
        index,
    }))
}

async fn get_nullifier(
    State(state): State<AppState>,
    Path(nullifier): Path<String>,
) -> Result<Json<NullifierResponse>, ApiError> {
    let nullifier = parse_field(&nullifier, "nullifier")?;
    let used = state.read(|ledger| ledger.is_nullifier_used(&nullifier)).await;
    Ok(Json(NullifierResponse { nullifier, used }))
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<Json<EventListResponse>, ApiError> {
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(50).min(500);

    let total = db::count_events(&state.db).await?;
    let rows = db::list_events(&state.db, offset, limit).await?;

    let events = rows
        .into_iter()
        .map(|(seq, created_at, event)| JournaledEvent { seq, created_at, event })
        .collect();

    Ok(Json(EventListResponse { offset, limit, total, events }))
}

async fn get_verifiers(State(state): State<AppState>) -> Json<VerifiersResponse> {
    let response = state
        .read(|ledger| VerifiersResponse {
            admin: *ledger.admin(),
            mint: ledger.verifier_id(Relation::Mint),
            transfer: ledger.verifier_id(Relation::Transfer),
        })
        .await;
    Json(response)
}

async fn get_vk(State(state): State<AppState>, Path(relation): Path<String>) -> Result<Json<ZkVkResponse>, ApiError> {
    let relation = parse_relation(&relation)?;
    let Some((verifier_id, vk_bytes)) = db::load_verifier_key(&state.db, relation).await? else {
        return Err(ApiError::NotFound(format!("no verifying key installed for {relation}")));
    };

    let b64 = base64::engine::general_purpose::STANDARD.encode(vk_bytes);

    Ok(Json(ZkVkResponse {
        relation,
        verifier_id,
        curve: "bn254".to_string(),
        proof_system: "groth16".to_string(),
        vk_b64: b64,
    }))
}
