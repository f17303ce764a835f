// handlers/public/auth/login.rs - POST /auth/login handler

use std::collections::HashMap;

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/**
 * POST /auth/login - exchange a username/password pair for a bearer token
 *
 * Input:  `{"username": "admin", "password": "adminpassword"}`
 * Output: `{"message": "Login successful", "token": "eyJhbGciOiJIUzI1NiI..."}`
 *
 * Missing fields are a 400; an unknown user and a wrong password are the
 * same 401.
 */
pub async fn login_post(State(state): State<AppState>, JsonBody(body): JsonBody<LoginRequest>) -> ApiResult<Value> {
    let mut field_errors = HashMap::new();
    for (key, value) in [("username", &body.username), ("password", &body.password)] {
        if value.trim().is_empty() {
            field_errors.insert(key.to_string(), "This field is required".to_string());
        }
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Username and password are required", Some(field_errors)));
    }

    let identity = match state.credentials.verify(&body.username, &body.password).await {
        Some(identity) => identity,
        None => {
            tracing::warn!("Failed login attempt for user '{}'", body.username);
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let token = state.tokens.issue(&identity)?;
    tracing::info!("User '{}' logged in with role '{}'", identity.username, identity.role);

    Ok(ApiResponse::success(json!({
        "message": "Login successful",
        "token": token
    })))
}
