// src/api/account.rs
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{ApiJson, AppState};
use crate::account::format_balance;
use crate::error::ApiError;
use crate::types::{as_checksum_addr, as_decimal};
use crate::validate::Validator;

const DEMO_MESSAGE: &str = "Demo mode: Contracts not deployed. This is a simulated address.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAddressResponse {
    #[serde(serialize_with = "as_checksum_addr")]
    owner: Address,
    #[serde(serialize_with = "as_decimal")]
    salt: U256,
    #[serde(serialize_with = "as_checksum_addr")]
    address: Address,
    is_deployed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    factory_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    demo_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfoResponse {
    #[serde(serialize_with = "as_checksum_addr")]
    address: Address,
    is_deployed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance_formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// GET /api/account/address/:owner/:salt
pub async fn counterfactual_address(
    State(state): State<Arc<AppState>>,
    Path((owner, salt)): Path<(String, String)>,
) -> Result<Json<AccountAddressResponse>, ApiError> {
    let mut v = Validator::default();
    let owner = v.address("owner", Some(&Value::String(owner)), "Invalid owner address");
    let salt = v.uint("salt", Some(&Value::String(salt)), "Salt must be numeric");
    v.finish()?;

    let derived = state.accounts.derive(owner, salt).await?;
    if derived.demo_mode {
        return Ok(Json(AccountAddressResponse {
            owner,
            salt,
            address: derived.address,
            is_deployed: false,
            factory_address: None,
            demo_mode: Some(true),
            message: Some(DEMO_MESSAGE.to_string()),
        }));
    }

    let is_deployed = state.accounts.is_deployed(derived.address).await?;
    Ok(Json(AccountAddressResponse {
        owner,
        salt,
        address: derived.address,
        is_deployed,
        factory_address: None,
        demo_mode: None,
        message: None,
    }))
}

/// POST /api/account/create
///
/// Only computes the counterfactual address; deployment happens through the
/// first user operation carrying `initCode`.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<AccountAddressResponse>, ApiError> {
    let mut v = Validator::default();
    let owner = v.address("owner", body.get("owner"), "Invalid owner address");
    let salt = v
        .optional_uint("salt", body.get("salt"), "Salt must be numeric")
        .unwrap_or_default();
    v.finish()?;

    let derived = state.accounts.derive(owner, salt).await?;
    let Some(factory) = state.accounts.source().factory() else {
        info!("[DEMO MODE] Created account address {:?} for owner {:?}", derived.address, owner);
        return Ok(Json(AccountAddressResponse {
            owner,
            salt,
            address: derived.address,
            is_deployed: false,
            factory_address: Some("DEMO_MODE".to_string()),
            demo_mode: Some(true),
            message: Some(format!(
                "{DEMO_MESSAGE} To use real contracts, deploy them first."
            )),
        }));
    };

    let is_deployed = state.accounts.is_deployed(derived.address).await?;
    info!(
        "Account address {:?} for owner {:?} (deployed: {})",
        derived.address, owner, is_deployed
    );

    let message = if is_deployed {
        "Account already exists"
    } else {
        "Account address computed. Deploy via UserOp with initCode."
    };

    Ok(Json(AccountAddressResponse {
        owner,
        salt,
        address: derived.address,
        is_deployed,
        factory_address: Some(to_checksum(&factory, None)),
        demo_mode: None,
        message: Some(message.to_string()),
    }))
}

/// GET /api/account/:address
pub async fn info(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<AccountInfoResponse>, ApiError> {
    let mut v = Validator::default();
    let address = v.address("address", Some(&Value::String(address)), "Invalid account address");
    v.finish()?;

    if !state.accounts.is_deployed(address).await? {
        return Ok(Json(AccountInfoResponse {
            address,
            is_deployed: false,
            balance: None,
            balance_formatted: None,
            message: Some("Account not yet deployed".to_string()),
        }));
    }

    let balance = state.accounts.balance(address).await?;
    Ok(Json(AccountInfoResponse {
        address,
        is_deployed: true,
        balance: Some(balance.to_string()),
        balance_formatted: Some(format_balance(balance)),
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use ethers::types::Bytes;
    use serde_json::json;

    use crate::account::AddressSource;
    use crate::api::test_utils::{app, get, post};
    use crate::chain::MockChainClient;
    use crate::error::ChainError;

    use super::*;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";
    const FACTORY: &str = "0x9406Cc6185a346906296840746125a0E44976454";
    const ACCOUNT: &str = "0x2222222222222222222222222222222222222222";

    fn factory() -> AddressSource {
        AddressSource::OnChainFactory(FACTORY.parse().unwrap())
    }

    #[tokio::test]
    async fn demo_address_for_reference_owner() {
        let app = app(MockChainClient::new(), AddressSource::DeterministicFallback);
        let (status, body) = get(app, &format!("/api/account/address/{OWNER}/0")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], "0xB84032Dc53A9d87cA283aE10a1DACFBb648E83Ef");
        assert_eq!(body["demoMode"], true);
        assert_eq!(body["isDeployed"], false);
        assert_eq!(body["salt"], "0");
    }

    #[tokio::test]
    async fn factory_address_is_returned_verbatim() {
        let mut chain = MockChainClient::new();
        chain
            .expect_factory_address()
            .times(1)
            .returning(|_, _, _| Ok(ACCOUNT.parse().unwrap()));
        chain.expect_get_code().returning(|_| Ok(Bytes::default()));

        let (status, body) = get(app(chain, factory()), &format!("/api/account/address/{OWNER}/5")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], ACCOUNT);
        assert!(body.get("demoMode").is_none());
        assert_eq!(body["isDeployed"], false);
    }

    #[tokio::test]
    async fn bad_path_params_are_reported_per_field() {
        let app = app(MockChainClient::new(), AddressSource::DeterministicFallback);
        let (status, body) = get(app, "/api/account/address/0x1234/abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "owner");
        assert_eq!(body["errors"][0]["message"], "Invalid owner address");
        assert_eq!(body["errors"][1]["field"], "salt");
    }

    #[tokio::test]
    async fn factory_outage_is_upstream_error() {
        let mut chain = MockChainClient::new();
        chain
            .expect_factory_address()
            .returning(|_, _, _| Err(ChainError::Provider("connection refused".into())));

        let (status, body) = post(app(chain, factory()), "/api/account/create", json!({ "owner": OWNER })).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Upstream RPC unavailable");
    }

    #[tokio::test]
    async fn create_in_demo_mode() {
        let app = app(MockChainClient::new(), AddressSource::DeterministicFallback);
        let (status, body) = post(app, "/api/account/create", json!({ "owner": OWNER })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["factoryAddress"], "DEMO_MODE");
        assert_eq!(body["demoMode"], true);
        assert_eq!(body["salt"], "0");
        assert_eq!(body["address"], "0xB84032Dc53A9d87cA283aE10a1DACFBb648E83Ef");
    }

    #[tokio::test]
    async fn create_with_deployed_account() {
        let mut chain = MockChainClient::new();
        chain
            .expect_factory_address()
            .returning(|_, _, _| Ok(ACCOUNT.parse().unwrap()));
        chain
            .expect_get_code()
            .returning(|_| Ok(Bytes::from(vec![0x60, 0x80])));

        let (status, body) = post(
            app(chain, factory()),
            "/api/account/create",
            json!({ "owner": OWNER, "salt": "3" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isDeployed"], true);
        assert_eq!(body["factoryAddress"], FACTORY);
        assert_eq!(body["message"], "Account already exists");
        assert_eq!(body["salt"], "3");
    }

    #[tokio::test]
    async fn undeployed_account_omits_balance() {
        let mut chain = MockChainClient::new();
        chain.expect_get_code().returning(|_| Ok(Bytes::default()));
        chain.expect_get_balance().never();

        let (status, body) = get(app(chain, factory()), &format!("/api/account/{ACCOUNT}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isDeployed"], false);
        assert!(body.get("balance").is_none());
        assert!(body.get("balanceFormatted").is_none());
    }

    #[tokio::test]
    async fn deployed_account_reports_balance() {
        let mut chain = MockChainClient::new();
        chain
            .expect_get_code()
            .returning(|_| Ok(Bytes::from(vec![0x60, 0x80])));
        chain
            .expect_get_balance()
            .returning(|_| Ok(U256::exp10(18) * 2));

        let (status, body) = get(app(chain, factory()), &format!("/api/account/{ACCOUNT}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isDeployed"], true);
        assert_eq!(body["balance"], "2000000000000000000");
        assert_eq!(body["balanceFormatted"], "2.000000 ETH");
    }
}
