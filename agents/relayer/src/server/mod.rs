use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use derive_new::new;
use relayer_core::RelayerError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    authorisation::AuthorisationService,
    deployment::DeploymentService,
    msg::{pending_messages::PendingMessages, status::MessageStatusService},
};

pub mod authorisation;
pub mod deploy;
pub mod execution;

/// Everything the API routes call into
#[derive(Clone, Debug, new)]
pub struct ServerState {
    pub pending_messages: PendingMessages,
    pub status: MessageStatusService,
    pub deployments: DeploymentService,
    pub authorisations: AuthorisationService,
    /// Used for requests that do not name a network
    pub default_network: String,
}

impl ServerState {
    pub fn router(self) -> Router {
        Router::new()
            .route("/wallet/execution", post(execution::create))
            .route("/wallet/execution/{network}/{hash}", get(execution::status))
            .route("/wallet/deploy", post(deploy::create))
            .route("/wallet/deploy/{network}/{hash}", get(deploy::status))
            .route("/authorisation", post(authorisation::request))
            .route(
                "/authorisation/{network}/{wallet}",
                get(authorisation::pending),
            )
            .route("/authorisation/cancel", post(authorisation::cancel))
            .route("/authorisation/deny", post(authorisation::deny))
            .with_state(self)
    }

    fn network(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.default_network.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    /// `<ErrorKind>: <message>`
    pub error: String,
}

/// A [`RelayerError`] rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub RelayerError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<RelayerError> for ApiError {
    fn from(err: RelayerError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        use RelayerError::*;
        match &self.0 {
            MessageNotFound | NotFound(_) => StatusCode::NOT_FOUND,
            DuplicatedSignature | DuplicatedExecution => StatusCode::CONFLICT,
            InvalidSignature
            | NotEnoughSignatures { .. }
            | InvalidProxy
            | NotEnoughToken
            | InsufficientGas { .. }
            | ChainNotSupported(_)
            | InvalidEnsDomain(_) => StatusCode::BAD_REQUEST,
            RelayerUnderfunded
            | TransactionHashNotFound
            | TransactionReverted(_)
            | Database(_)
            | Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.persisted_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (RelayerError::MessageNotFound, StatusCode::NOT_FOUND),
            (RelayerError::DuplicatedSignature, StatusCode::CONFLICT),
            (
                RelayerError::ChainNotSupported("unknownChain".to_owned()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RelayerError::TransactionHashNotFound,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code(), status);
        }
    }
}
