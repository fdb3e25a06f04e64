use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use relayer_core::{Deployment, DeploymentRequest, H256};
use serde::{Deserialize, Serialize};

use super::{ApiResult, ServerState};

#[derive(Clone, Debug, Deserialize)]
pub struct RequestBody {
    #[serde(flatten)]
    pub request: DeploymentRequest,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseBody {
    pub hash: H256,
}

/// Queue the deployment of a counterfactual wallet
pub async fn create(
    State(state): State<ServerState>,
    Json(body): Json<RequestBody>,
) -> ApiResult<(StatusCode, Json<ResponseBody>)> {
    let network = state.network(body.network);
    tracing::debug!(%network, ens_name = %body.request.ens_name, "Received deployment");
    let hash = state.deployments.deploy(body.request, &network).await?;
    Ok((StatusCode::CREATED, Json(ResponseBody { hash })))
}

pub async fn status(
    State(state): State<ServerState>,
    Path((network, hash)): Path<(String, H256)>,
) -> ApiResult<Json<Deployment>> {
    Ok(Json(state.deployments.get(hash, &network).await?))
}
