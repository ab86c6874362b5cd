use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::hash_api_token;
use crate::database::models::User;
use crate::error::ApiError;
use crate::server::AppState;

/// Query parameter and top-level JSON body key that may carry the token
pub const BODY_TOKEN_FIELD: &str = "api_token";

/// Authenticated user context resolved from the API token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Token authentication middleware that resolves the caller and injects `AuthUser`
///
/// Lookup order is the `Authorization` header, the query string, then a JSON body.
pub async fn require_user(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let login_url = &state.config.api.login_url;

    let mut token = extract_token_from_headers(request.headers()).or_else(|| {
        if state.config.security.allow_query_token {
            extract_token_from_query(request.uri().query())
        } else {
            None
        }
    });

    // The body is buffered and handed back so the handler can still extract it
    if token.is_none() && has_json_body(request.headers()) {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, state.config.api.max_request_size_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Failed to buffer request body: {}", e);
                return ApiError::payload_too_large("Request body is too large").into_response();
            }
        };
        token = extract_token_from_body(&bytes);
        request = Request::from_parts(parts, Body::from(bytes));
    }

    let Some(token) = token else {
        return unauthenticated(request.headers(), login_url, "Missing API token");
    };

    let user = match state.users.find_by_token_hash(&hash_api_token(&token)).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!("Rejected request with unknown API token");
            return unauthenticated(request.headers(), login_url, "Invalid API token");
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    tracing::debug!("Authenticated user {} ({})", user.email, user.id);

    request.extensions_mut().insert(AuthUser::from(user));
    next.run(request).await
}

/// JSON clients get a 401 body; everything else is redirected to the login page
fn unauthenticated(headers: &HeaderMap, login_url: &str, message: &str) -> Response {
    if expects_json(headers) {
        return ApiError::unauthorized(message).into_response();
    }
    (StatusCode::FOUND, [(header::LOCATION, login_url.to_string())]).into_response()
}

/// True for XHR requests or when the first media range in Accept is a JSON type
fn expects_json(headers: &HeaderMap) -> bool {
    let is_xhr = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

    is_xhr
        || headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .and_then(|accept| accept.split(',').next())
            .map(|first| {
                let media = first.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
                media.contains("/json") || media.ends_with("+json")
            })
            .unwrap_or(false)
}

fn has_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let media = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
            media == "application/json" || media.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth_str.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Extract the token from an `api_token` query parameter
fn extract_token_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == BODY_TOKEN_FIELD)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Extract a top-level `api_token` string from a JSON object body
fn extract_token_from_body(bytes: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    let token = body.get(BODY_TOKEN_FIELD)?.as_str()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
