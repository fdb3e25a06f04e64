use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use relayer_core::{AuthorisationRequest, H160};
use serde::Deserialize;

use super::{ApiResult, ServerState};
use crate::authorisation::AuthorisationUpdate;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub wallet_contract_address: H160,
    pub key: H160,
    #[serde(default)]
    pub device_info: serde_json::Value,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateBody {
    #[serde(flatten)]
    pub update: AuthorisationUpdate,
    #[serde(default)]
    pub network: Option<String>,
}

/// Ask for a device key to be added to a wallet
pub async fn request(
    State(state): State<ServerState>,
    Json(body): Json<RequestBody>,
) -> ApiResult<(StatusCode, Json<AuthorisationRequest>)> {
    let request = AuthorisationRequest {
        wallet_contract_address: body.wallet_contract_address,
        key: body.key,
        device_info: body.device_info,
        network: state.network(body.network),
    };
    state.authorisations.request(&request).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn pending(
    State(state): State<ServerState>,
    Path((network, wallet)): Path<(String, H160)>,
) -> ApiResult<Json<Vec<AuthorisationRequest>>> {
    Ok(Json(state.authorisations.get_pending(wallet, &network).await?))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Json(body): Json<UpdateBody>,
) -> ApiResult<StatusCode> {
    let network = state.network(body.network);
    state.authorisations.cancel(&body.update, &network).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deny(
    State(state): State<ServerState>,
    Json(body): Json<UpdateBody>,
) -> ApiResult<StatusCode> {
    let network = state.network(body.network);
    state.authorisations.deny(&body.update, &network).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use ethers_signers::Signer;
    use relayer_core::{
        cancel_authorisation_hash, deny_authorisation_hash,
        test_utils::{sign_hash, test_signer, MockChain},
    };
    use serde_json::json;

    use crate::{
        server::ErrorBody,
        test_utils::{parse_body_to_json, send_request, TestNetwork, WALLET},
    };

    use super::*;

    fn pending_uri() -> String {
        format!("/authorisation/{}/{WALLET:?}", TestNetwork::NAME)
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn request_list_and_cancel() {
        let network = TestNetwork::new(MockChain::new());
        let app = network.server_state().router();
        let device = test_signer(3);

        let response = send_request(
            app.clone(),
            Method::POST,
            "/authorisation",
            Some(json!({
                "walletContractAddress": WALLET,
                "key": device.address(),
                "deviceInfo": { "name": "iPhone", "city": "Warsaw" },
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send_request(app.clone(), Method::GET, &pending_uri(), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let pending: Vec<AuthorisationRequest> = parse_body_to_json(response.into_body()).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].key, device.address());
        assert_eq!(pending[0].network, TestNetwork::NAME);
        assert_eq!(pending[0].device_info["city"], "Warsaw");

        let signature = sign_hash(&device, cancel_authorisation_hash(WALLET, device.address())).await;
        let response = send_request(
            app.clone(),
            Method::POST,
            "/authorisation/cancel",
            Some(json!({
                "walletContractAddress": WALLET,
                "key": device.address(),
                "signature": signature,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send_request(app, Method::GET, &pending_uri(), None).await;
        let pending: Vec<AuthorisationRequest> = parse_body_to_json(response.into_body()).await;
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn deny_by_unknown_key_is_rejected() {
        let mut chain = MockChain::new();
        chain.expect_key_exist().returning(|_, _| Ok(false));
        let network = TestNetwork::new(chain);
        let device = test_signer(3).address();
        let signature = sign_hash(&test_signer(5), deny_authorisation_hash(WALLET, device)).await;

        let response = send_request(
            network.server_state().router(),
            Method::POST,
            "/authorisation/deny",
            Some(json!({
                "walletContractAddress": WALLET,
                "key": device,
                "signature": signature,
                "network": TestNetwork::NAME,
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = parse_body_to_json(response.into_body()).await;
        assert_eq!(body.error, "InvalidSignature: Invalid signature");
    }
}
