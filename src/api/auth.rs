use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::resolve_client_ip;
use crate::api::state::AppState;
use crate::auth::AuthService;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub username: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let ip_address = resolve_client_ip(&headers, Some(addr.ip()));

    let user = AuthService::register(
        &state.db,
        &req.username,
        &req.email,
        &req.password,
        &ip_address,
    )
    .await?;

    Ok(Json(RegisterResponse {
        user_id: user.id,
        username: user.username,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let ip_address = resolve_client_ip(&headers, Some(addr.ip()));

    let user = AuthService::login(&state.db, &req.email, &req.password, &ip_address).await?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
    }))
}
