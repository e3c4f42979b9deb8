//! Account holder views: dashboard, history, beneficiaries and KYC

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, AppState};

pub async fn dashboard(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Response, ApiError> {
    let result = state
        .run(move |ctx| ctx.account_service.dashboard(&account_id))
        .await;

    match result {
        Ok(dashboard) => Ok(Json(dashboard).into_response()),
        // The dashboard page expects a bare `error` key
        Err(err) if err.status() == StatusCode::NOT_FOUND => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response()),
        Err(err) => Err(err),
    }
}

pub async fn transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state
        .run(move |ctx| ctx.transaction_service.history(&account_id))
        .await?;
    Ok(Json(json!({ "transactions": transactions })))
}

#[derive(Debug, Deserialize)]
pub struct BeneficiaryRequest {
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    account_number: String,
    #[serde(default)]
    ifsc: String,
    #[serde(default)]
    nickname: Option<String>,
}

pub async fn add_beneficiary(
    State(state): State<AppState>,
    payload: Result<Json<BeneficiaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    state
        .run(move |ctx| {
            ctx.beneficiary_service.add(
                &req.account_id,
                &req.name,
                &req.account_number,
                &req.ifsc,
                req.nickname,
            )
        })
        .await?;

    Ok(Json(json!({ "status": "success", "message": "Beneficiary Added" })))
}

pub async fn beneficiaries(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let beneficiaries = state
        .run(move |ctx| ctx.beneficiary_service.list(&account_id))
        .await?;
    Ok(Json(json!({ "beneficiaries": beneficiaries })))
}

#[derive(Debug, Deserialize)]
pub struct KycRequestBody {
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    doc_type: String,
    #[serde(default)]
    doc_number: String,
}

pub async fn submit_kyc(
    State(state): State<AppState>,
    payload: Result<Json<KycRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    state
        .run(move |ctx| {
            ctx.kyc_service
                .submit(&req.account_id, &req.doc_type, &req.doc_number)
        })
        .await
        .map_err(ApiError::missing_as_bad_request)?;

    Ok(Json(json!({ "status": "success", "message": "KYC Submitted" })))
}

pub async fn kyc_status(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state
        .run(move |ctx| ctx.kyc_service.status(&account_id))
        .await?;
    let kyc_status = status.map(|s| s.as_str()).unwrap_or("Unknown");
    Ok(Json(json!({ "status": "success", "kyc_status": kyc_status })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{create_funded_user, send, test_app};

    #[tokio::test]
    async fn test_dashboard_shows_recent_activity() {
        let app = test_app();
        let (account_id, account_number, _) = create_funded_user(&app, "alice", 250.0).await;

        let (status, body) = send(&app, "GET", &format!("/api/user/dashboard/{}", account_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 250.0);
        assert_eq!(body["kyc_status"], "Not Started");
        assert_eq!(body["account_number"], account_number.as_str());
        assert_eq!(body["recent_activity"].as_array().unwrap().len(), 1);
        assert_eq!(body["recent_activity"][0]["Description"], "Deposit via Unknown");
    }

    #[tokio::test]
    async fn test_dashboard_unknown_account() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/user/dashboard/AC4242", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn test_beneficiary_flow() {
        let app = test_app();
        let (alice, _, _) = create_funded_user(&app, "alice", 0.0).await;
        let (_, bob_number, bob_ifsc) = create_funded_user(&app, "bob", 0.0).await;

        let request = json!({
            "account_id": alice,
            "name": "Bob",
            "account_number": bob_number,
            "ifsc": bob_ifsc,
            "nickname": "B"
        });
        let (status, body) = send(&app, "POST", "/api/user/beneficiaries", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Beneficiary Added");

        let (status, body) = send(&app, "POST", "/api/user/beneficiaries", Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Beneficiary already exists");

        let (status, body) = send(&app, "GET", &format!("/api/user/beneficiaries/{}", alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["beneficiaries"].as_array().unwrap().len(), 1);
        assert_eq!(body["beneficiaries"][0]["Nickname"], "B");
    }

    #[tokio::test]
    async fn test_beneficiary_must_be_a_flux_account() {
        let app = test_app();
        let (alice, _, _) = create_funded_user(&app, "alice", 0.0).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/beneficiaries",
            Some(json!({"account_id": alice, "name": "X", "account_number": "1", "ifsc": "FLUX0000001"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Invalid Account Number or IFSC Code. Receiver not found."
        );
    }

    #[tokio::test]
    async fn test_kyc_submit_and_status() {
        let app = test_app();
        let (alice, _, _) = create_funded_user(&app, "alice", 0.0).await;
        let submit = json!({"account_id": alice, "doc_type": "Passport", "doc_number": "P123"});

        let (status, body) = send(&app, "POST", "/api/user/kyc", Some(submit.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "KYC Submitted");

        let (status, body) = send(&app, "POST", "/api/user/kyc", Some(submit)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "KYC Verification already in progress");

        let (_, body) = send(&app, "GET", &format!("/api/user/kyc-status/{}", alice), None).await;
        assert_eq!(body["kyc_status"], "Pending");

        let (_, body) = send(&app, "GET", "/api/user/kyc-status/AC0000", None).await;
        assert_eq!(body["kyc_status"], "Unknown");

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/kyc",
            Some(json!({"account_id": "AC0000", "doc_type": "Passport", "doc_number": "P9"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User not found");
    }
}
