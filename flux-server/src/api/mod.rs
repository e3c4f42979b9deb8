//! HTTP API and static frontend
//!
//! Handlers are thin: they decode the JSON body, run the matching
//! `FluxContext` service on the blocking pool (every store call is
//! synchronous file or HTTP I/O) and wrap the result in the JSON envelope
//! the frontend expects.

mod admin;
mod auth;
mod error;
mod transaction;
mod user;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use flux_core::domain::format;
use flux_core::FluxContext;

pub use error::ApiError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    ctx: Arc<FluxContext>,
}

impl AppState {
    pub fn new(ctx: FluxContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Run a service call on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&FluxContext) -> flux_core::domain::result::Result<T> + Send + 'static,
    {
        let ctx = Arc::clone(&self.ctx);
        tokio::task::spawn_blocking(move || f(&ctx))
            .await
            .map_err(ApiError::internal)?
            .map_err(ApiError::from)
    }
}

/// Build the application router
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let api = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/change-password", post(auth::change_password))
        .route("/user/dashboard/:account_id", get(user::dashboard))
        .route("/user/transactions/:account_id", get(user::transactions))
        .route("/user/beneficiaries", post(user::add_beneficiary))
        .route("/user/beneficiaries/:account_id", get(user::beneficiaries))
        .route("/user/kyc", post(user::submit_kyc))
        .route("/user/kyc-status/:account_id", get(user::kyc_status))
        .route("/transaction/transfer", post(transaction::transfer))
        .route("/transaction/deposit", post(transaction::deposit))
        .route("/admin/users", get(admin::users))
        .route("/admin/alerts", get(admin::alerts))
        .route("/admin/transactions", get(admin::transactions))
        .route("/admin/audit-logs", get(admin::audit_logs))
        .route("/admin/kyc/pending", get(admin::pending_kyc))
        .route("/admin/kyc/:account_id", post(admin::resolve_kyc))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/user", ServeDir::new(static_dir.join("user")))
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped
pub async fn serve(ctx: FluxContext, addr: SocketAddr, static_dir: &Path) -> Result<()> {
    let app = router(AppState::new(ctx), static_dir);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Flux Financial listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    if status.is_server_error() {
        log::error!("{} {} -> {} ({:?})", method, path, status.as_u16(), start.elapsed());
    } else {
        log::info!("{} {} -> {} ({:?})", method, path, status.as_u16(), start.elapsed());
    }
    response
}

/// Amount field that accepts `1500`, `1500.5` or `"1500.50"`
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    let text = match raw {
        None => return Ok(None),
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Text(s)) => s,
    };
    format::parse_decimal(&text)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {}", text)))
}

/// `{"status": "success", ...body}`
#[derive(Serialize)]
struct Success<T: Serialize> {
    status: &'static str,
    #[serde(flatten)]
    body: T,
}

fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        body,
    })
}

fn require_amount(amount: Option<Decimal>) -> Result<Decimal, ApiError> {
    amount.ok_or_else(|| ApiError::bad_request("Amount is required"))
}
