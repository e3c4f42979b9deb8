//! Back-office views and KYC review

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use flux_core::services::DEFAULT_TRANSACTION_LIMIT;
use flux_core::{Error, KycRequestStatus};

use super::{ApiError, AppState};

pub async fn users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.run(|ctx| ctx.admin_service.users()).await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn alerts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let alerts = state.run(|ctx| ctx.admin_service.high_risk_alerts()).await?;
    Ok(Json(json!({ "alerts": alerts })))
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    limit: Option<usize>,
}

pub async fn transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT);
    let transactions = state
        .run(move |ctx| ctx.admin_service.transactions(limit))
        .await?;
    Ok(Json(json!({ "transactions": transactions })))
}

pub async fn audit_logs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let logs = state.run(|ctx| ctx.admin_service.audit_logs()).await?;
    Ok(Json(json!({ "logs": logs })))
}

pub async fn pending_kyc(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let requests = state.run(|ctx| ctx.admin_service.pending_kyc()).await?;
    Ok(Json(json!({ "requests": requests })))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    status: String,
}

pub async fn resolve_kyc(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let status: KycRequestStatus = req
        .status
        .parse()
        .map_err(|e: String| ApiError::from(Error::validation(e)))?;

    state
        .run(move |ctx| ctx.admin_service.resolve_kyc(&account_id, status))
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("KYC {}", status.as_str()),
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{create_funded_user, send, test_app};

    #[tokio::test]
    async fn test_high_value_transfer_raises_no_alert_at_75() {
        let app = test_app();
        let (alice, _, _) = create_funded_user(&app, "alice", 90000.0).await;
        let (_, bob_number, bob_ifsc) = create_funded_user(&app, "bob", 0.0).await;

        send(
            &app,
            "POST",
            "/api/transaction/transfer",
            Some(json!({
                "sender_id": alice,
                "amount": 60000,
                "recipient_account": bob_number,
                "recipient_ifsc": bob_ifsc
            })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/api/admin/alerts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["alerts"].as_array().unwrap().is_empty());

        let (_, body) = send(&app, "GET", "/api/admin/transactions?limit=2", None).await;
        assert_eq!(body["transactions"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, "GET", "/api/admin/users", None).await;
        assert_eq!(body["users"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_kyc_review_flow() {
        let app = test_app();
        let (alice, _, _) = create_funded_user(&app, "alice", 0.0).await;
        send(
            &app,
            "POST",
            "/api/user/kyc",
            Some(json!({"account_id": alice, "doc_type": "Passport", "doc_number": "P1"})),
        )
        .await;

        let (_, body) = send(&app, "GET", "/api/admin/kyc/pending", None).await;
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["name"], "alice Test");
        assert_eq!(requests[0]["docType"], "Passport");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/admin/kyc/{}", alice),
            Some(json!({"status": "Pending"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/admin/kyc/{}", alice),
            Some(json!({"status": "Verified"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "KYC Verified");

        let (_, body) = send(&app, "GET", &format!("/api/user/kyc-status/{}", alice), None).await;
        assert_eq!(body["kyc_status"], "Verified");

        let (_, body) = send(&app, "GET", "/api/admin/kyc/pending", None).await;
        assert!(body["requests"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_transaction_limit_is_a_json_error() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/admin/transactions?limit=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn test_resolve_unknown_account_is_not_found() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/admin/kyc/AC0404",
            Some(json!({"status": "Rejected"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
