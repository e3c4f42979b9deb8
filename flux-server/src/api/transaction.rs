//! Money movement: transfers and deposits

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use flux_core::services::SessionInfo;

use super::{deserialize_amount, require_amount, success, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    sender_id: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    amount: Option<Decimal>,
    #[serde(default)]
    recipient_account: String,
    #[serde(default)]
    recipient_ifsc: String,
    #[serde(flatten)]
    session: SessionInfo,
}

pub async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let amount = require_amount(req.amount)?;

    let receipt = state
        .run(move |ctx| {
            ctx.transaction_service.transfer(
                &req.sender_id,
                amount,
                &req.recipient_account,
                &req.recipient_ifsc,
                &req.session,
            )
        })
        .await
        .map_err(ApiError::missing_as_bad_request)?;

    Ok(success(receipt))
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    #[serde(default)]
    account_id: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    amount: Option<Decimal>,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    session: SessionInfo,
}

pub async fn deposit(
    State(state): State<AppState>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let amount = require_amount(req.amount)?;

    let receipt = state
        .run(move |ctx| {
            ctx.transaction_service
                .deposit(&req.account_id, amount, req.source.as_deref(), &req.session)
        })
        .await
        .map_err(ApiError::missing_as_bad_request)?;

    Ok(success(receipt))
}
