use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use relayer_core::{MessageStatus, SignedMessage, H256};
use serde::Deserialize;

use super::{ApiResult, ServerState};

#[derive(Clone, Debug, Deserialize)]
pub struct RequestBody {
    #[serde(flatten)]
    pub signed: SignedMessage,
    #[serde(default)]
    pub network: Option<String>,
}

/// Add one signature of a message, queueing it once the wallet's threshold
/// is met.
///
/// Example request
/// ```json
/// {
///     "from": "0x1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a",
///     "to": "0x0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e",
///     "value": "2",
///     "data": "0x",
///     "nonce": 0,
///     "gasPrice": "1000000000",
///     "gasToken": "0x7070707070707070707070707070707070707070",
///     "gasLimit": "200000",
///     "gasLimitExecution": "120000",
///     "signature": "0x...",
///     "network": "ganache"
/// }
/// ```
pub async fn create(
    State(state): State<ServerState>,
    Json(body): Json<RequestBody>,
) -> ApiResult<(StatusCode, Json<MessageStatus>)> {
    let network = state.network(body.network);
    tracing::debug!(%network, hash = ?body.signed.message_hash(), "Received signed message");
    let status = state.pending_messages.add(&body.signed, &network).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn status(
    State(state): State<ServerState>,
    Path((network, hash)): Path<(String, H256)>,
) -> ApiResult<Json<MessageStatus>> {
    Ok(Json(state.status.get_status(hash, &network).await?))
}
