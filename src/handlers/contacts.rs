// handlers/contacts.rs - /api/contacts resource
//
// Every handler takes the authenticated caller as an explicit `AuthUser`
// (injected by `require_user`). Owner-scoped operations look the row up,
// run the ownership policy, then validate and touch the store, in that order.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::api::ContactResource;
use crate::database::models::Contact;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, BODY_TOKEN_FIELD};
use crate::policy::{authorize, Ability};
use crate::server::AppState;
use crate::validation;

/// GET /api/contacts - Every contact the caller owns
pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<ContactResource>> {
    let contacts = state.contacts.list_by_owner(user.id).await?;
    Ok(ApiResponse::success(ContactResource::collection(&contacts, Utc::now())))
}

/// POST /api/contacts - Create a contact owned by the caller
pub async fn store(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<ContactResource> {
    let fields = validation::validate(&json_body(payload)?)?;

    let contact = state.contacts.create(user.id, fields).await?;
    tracing::info!("User {} created contact {}", user.id, contact.id);

    Ok(ApiResponse::created(ContactResource::present(&contact, Utc::now())))
}

/// GET /api/contacts/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ContactResource> {
    let contact = find_contact(&state, &id).await?;
    authorize(Ability::View, &user, &contact)?;

    Ok(ApiResponse::success(ContactResource::present(&contact, Utc::now())))
}

/// PATCH|PUT /api/contacts/:id - Replace the editable fields
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<ContactResource> {
    let contact = find_contact(&state, &id).await?;
    authorize(Ability::Update, &user, &contact)?;

    let fields = validation::validate(&json_body(payload)?)?;

    let updated = state
        .contacts
        .update(contact.id, fields)
        .await?
        .ok_or_else(contact_not_found)?;
    tracing::info!("User {} updated contact {}", user.id, updated.id);

    Ok(ApiResponse::success(ContactResource::present(&updated, Utc::now())))
}

/// DELETE /api/contacts/:id - Permanent removal
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let contact = find_contact(&state, &id).await?;
    authorize(Ability::Delete, &user, &contact)?;

    if !state.contacts.delete(contact.id).await? {
        return Err(contact_not_found());
    }
    tracing::info!("User {} deleted contact {}", user.id, contact.id);

    Ok(ApiResponse::no_content())
}

/// Ids that are not UUIDs cannot exist, so they are reported as missing
async fn find_contact(state: &AppState, id: &str) -> Result<Contact, ApiError> {
    let id = Uuid::parse_str(id).map_err(|_| contact_not_found())?;
    state
        .contacts
        .find_by_id(id)
        .await?
        .ok_or_else(contact_not_found)
}

fn contact_not_found() -> ApiError {
    ApiError::not_found("Contact not found")
}

/// Unwrap the JSON object, dropping a body-carried `api_token` (already consumed by `require_user`)
fn json_body(payload: Result<Json<Map<String, Value>>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(mut body)) => {
            body.remove(BODY_TOKEN_FIELD);
            Ok(body)
        }
        Err(rejection) => {
            tracing::debug!("Rejected contact payload: {}", rejection.body_text());
            Err(match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large("Request body is too large"),
                StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                    ApiError::unsupported_media_type("Expected request with `Content-Type: application/json`")
                }
                _ => ApiError::invalid_json(rejection.body_text()),
            })
        }
    }
}
