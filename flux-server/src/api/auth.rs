//! Signup, login and password changes

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use flux_core::NewUser;

use super::{success, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "fullName", alias = "full_name")]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new_user = NewUser {
        username: req.username,
        password: req.password,
        full_name: req.full_name,
        email: req.email,
        phone: req.phone,
    };

    let user = state.run(move |ctx| ctx.account_service.signup(new_user)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "user": user })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let session = state
        .run(move |ctx| ctx.account_service.login(&req.username, &req.password))
        .await?;

    Ok(success(session))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    state
        .run(move |ctx| {
            ctx.account_service
                .change_password(&req.account_id, &req.old_password, &req.new_password)
        })
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Password updated successfully",
    })))
}
