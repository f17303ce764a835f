use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::store::{CharacterUpdate, NewCharacter};

/// POST /characters - create a character
pub async fn character_create(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(new): JsonBody<NewCharacter>,
) -> ApiResult<Value> {
    let character = state.store.create(new).await?;
    tracing::info!("{} created character {} ({})", user.identity, character.id, character.name);

    Ok(ApiResponse::created(json!({
        "message": "Character created successfully",
        "character": character
    })))
}

/// PATCH /characters/:id - change only the fields present in the body
pub async fn character_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<CharacterUpdate>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let character = state.store.update(id, changes).await?;
    tracing::info!("{} updated character {}", user.identity, id);

    Ok(ApiResponse::success(json!({
        "message": "Character updated successfully",
        "character": character
    })))
}

/// DELETE /characters/:id
pub async fn character_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!("{} deleted character {}", user.identity, id);

    Ok(ApiResponse::success(json!({
        "message": format!("Character {} deleted successfully", id)
    })))
}
