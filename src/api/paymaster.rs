// src/api/paymaster.rs
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use super::{ApiJson, AppState};
use crate::error::ApiError;
use crate::types::{PaymasterApproval, SponsorshipDecision};
use crate::validate::{UserOpFields, Validator};

/// POST /api/paymaster/sign
pub async fn sign(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<PaymasterApproval>, ApiError> {
    let mut v = Validator::default();
    let user_op = v.user_operation(body.get("userOp"), UserOpFields::Sponsorship);
    let valid_until = v.optional_u64("validUntil", body.get("validUntil"), "validUntil must be numeric");
    let valid_after = v.optional_u64("validAfter", body.get("validAfter"), "validAfter must be numeric");
    v.finish()?;

    let window = state.paymaster.window(valid_until, valid_after)?;
    let approval = state.paymaster.sign_user_operation(&user_op, window).await?;

    Ok(Json(approval))
}

/// POST /api/paymaster/sponsor
pub async fn sponsor(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<SponsorshipDecision>, ApiError> {
    let mut v = Validator::default();
    let user_op = v.user_operation(body.get("userOp"), UserOpFields::Sponsorship);
    v.finish()?;

    Ok(Json(state.paymaster.sponsorship(&user_op)))
}
