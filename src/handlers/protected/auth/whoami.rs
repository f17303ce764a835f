use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /auth/whoami - echo the identity carried by the token
pub async fn whoami_get(user: AuthUser) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "identity": user.identity,
        "role": user.role
    })))
}
