use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::app::AppState;
use crate::auth::{AuthError, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from a bearer token; rejects with 401
/// when the header is missing or the token does not verify.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub identity: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { identity: claims.identity, role: claims.role }
    }
}

/// Optional authentication for read endpoints: `None` without an
/// Authorization header, 401 when a token is sent but is invalid or expired.
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_from_headers(&parts.headers)?.ok_or(AuthError::MissingToken)?;
        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            e
        })?;
        Ok(AuthUser::from(claims))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match extract_jwt_from_headers(&parts.headers)? {
            Some(token) => Ok(MaybeAuthUser(Some(AuthUser::from(state.tokens.verify(token)?)))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

/// Extract the JWT from the Authorization header; `Ok(None)` when no header was sent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn reads_bearer_tokens() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), Some("abc.def"));
        assert_eq!(extract_jwt_from_headers(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(extract_jwt_from_headers(&headers("Basic abc")), Err(AuthError::MalformedHeader)));
        assert!(matches!(extract_jwt_from_headers(&headers("Bearer ")), Err(AuthError::MalformedHeader)));
    }
}
