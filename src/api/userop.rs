// src/api/userop.rs
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{ApiJson, AppState};
use crate::error::{ApiError, FieldError};
use crate::gas::GasEstimate;
use crate::types::{as_checksum_addr, as_decimal};
use crate::userop::{OperationReceipt, SubmissionReceipt};
use crate::validate::{UserOpFields, Validator};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    #[serde(serialize_with = "as_checksum_addr")]
    sender: Address,
    #[serde(serialize_with = "as_decimal")]
    nonce: U256,
    gas_estimate: GasEstimate,
    #[serde(serialize_with = "as_decimal")]
    estimated_total_gas: U256,
}

/// POST /api/userop/estimate
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let mut v = Validator::default();
    let sender = v.address("sender", body.get("sender"), "Invalid sender address");
    v.hex("callData", body.get("callData"), "Invalid callData");
    let nonce = v
        .optional_uint("nonce", body.get("nonce"), "Nonce must be numeric")
        .unwrap_or_default();
    v.finish()?;

    let gas_estimate = state.gas.estimate().await?;
    info!("Gas estimation for sender {:?}", sender);

    Ok(Json(EstimateResponse {
        sender,
        nonce,
        estimated_total_gas: gas_estimate.total_gas(),
        gas_estimate,
    }))
}

/// POST /api/userop/send
pub async fn send(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let mut v = Validator::default();
    let user_op = v.user_operation(body.get("userOp"), UserOpFields::Submission);
    v.finish()?;

    Ok(Json(state.submitter.submit(&user_op)))
}

/// GET /api/userop/:hash
pub async fn receipt(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<OperationReceipt>, ApiError> {
    let hash = parse_hash(&hash)
        .ok_or_else(|| ApiError::Validation(vec![FieldError::new("hash", "Invalid hash")]))?;

    Ok(Json(state.submitter.receipt(hash).await?))
}

fn parse_hash(s: &str) -> Option<H256> {
    let digits = s.strip_prefix("0x")?;
    if digits.len() != 64 {
        return None;
    }
    digits.parse().ok()
}
