use crate::config::ConfigError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shielded_ledger::{AdminError, MintError, RegistryError, StaleTransition, TransferError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A ledger operation refused the request. `code` is the ledger's stable error name.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        code: &'static str,
        message: String,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    fn rejected(status: StatusCode, code: &'static str, message: impl ToString) -> Self {
        ApiError::Rejected { status, code, message: message.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            ApiError::Rejected { status, code, message } => (status, code, message),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "BadRequest", m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "NotFound", m),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", "missing or invalid API key".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal", "internal error".to_string()),
        };

        (status, Json(ErrorBody { error: msg, code })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MintError> for ApiError {
    fn from(e: MintError) -> Self {
        let status = match e {
            MintError::InvalidPublicInputShape { .. } | MintError::InvalidProof => StatusCode::BAD_REQUEST,
            MintError::CommitmentAlreadyExists(_) => StatusCode::CONFLICT,
        };
        ApiError::rejected(status, e.code(), &e)
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status = match e {
            TransferError::InvalidPublicInputShape { .. } | TransferError::InvalidProof => StatusCode::BAD_REQUEST,
            TransferError::CommitmentNotFound(_) => StatusCode::NOT_FOUND,
            TransferError::NullifierAlreadyUsed(_) | TransferError::CommitmentAlreadyExists(_) => {
                StatusCode::CONFLICT
            }
        };
        ApiError::rejected(status, e.code(), &e)
    }
}

impl From<AdminError> for ApiError {
    fn from(e: AdminError) -> Self {
        let status = match e {
            AdminError::OnlyOwner { .. } => StatusCode::FORBIDDEN,
            AdminError::InvalidReference => StatusCode::BAD_REQUEST,
        };
        ApiError::rejected(status, e.code(), &e)
    }
}

impl From<StaleTransition> for ApiError {
    fn from(e: StaleTransition) -> Self {
        ApiError::rejected(StatusCode::CONFLICT, e.code(), &e)
    }
}

/// Failures that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal does not replay: {0}")]
    Replay(#[from] RegistryError),

    #[error("ledger construction failed: {0}")]
    Ledger(#[from] AdminError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use shielded_ledger::{Field, Identity};

    fn status_and_code(e: ApiError) -> (StatusCode, &'static str) {
        match e {
            ApiError::Rejected { status, code, .. } => (status, code),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ledger_errors_map_to_http_status() {
        assert_eq!(
            status_and_code(MintError::CommitmentAlreadyExists(Field::zero()).into()),
            (StatusCode::CONFLICT, "CommitmentAlreadyExists")
        );
        assert_eq!(
            status_and_code(MintError::InvalidProof.into()),
            (StatusCode::BAD_REQUEST, "InvalidProof")
        );
        assert_eq!(
            status_and_code(TransferError::CommitmentNotFound(Field::zero()).into()),
            (StatusCode::NOT_FOUND, "CommitmentNotFound")
        );
        assert_eq!(
            status_and_code(TransferError::NullifierAlreadyUsed(Field::zero()).into()),
            (StatusCode::CONFLICT, "NullifierAlreadyUsed")
        );
        assert_eq!(
            status_and_code(AdminError::OnlyOwner { caller: Identity::zero() }.into()),
            (StatusCode::FORBIDDEN, "OnlyOwner")
        );
        assert_eq!(
            status_and_code(AdminError::InvalidReference.into()),
            (StatusCode::BAD_REQUEST, "InvalidReference")
        );
        assert_eq!(
            status_and_code(StaleTransition { admitted: 0, current: 1 }.into()),
            (StatusCode::CONFLICT, "StaleTransition")
        );
    }
}
