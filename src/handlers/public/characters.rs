use axum::extract::{Path, State};

use crate::app::AppState;
use crate::filter::{Filter, QueryParams};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, MaybeAuthUser, QueryString};
use crate::store::Page;
use crate::types::Character;

/// GET /characters/list - filter, sort and paginate the catalog
pub async fn characters_list(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    QueryString(params): QueryString<QueryParams>,
) -> ApiResult<Page> {
    let filter = Filter::from_params(&params, &state.pagination)?;
    tracing::debug!(
        "Listing characters for {}: {:?}",
        user.as_ref().map_or("anonymous", |u| u.identity.as_str()),
        filter
    );

    let page = state.store.list(&filter).await?;
    Ok(ApiResponse::success(page))
}

/// GET /characters/:id - fetch one character
pub async fn character_get(
    State(state): State<AppState>,
    MaybeAuthUser(_user): MaybeAuthUser,
    Path(id): Path<String>,
) -> ApiResult<Character> {
    let id = parse_id(&id)?;
    let character = state.store.get(id).await?;
    Ok(ApiResponse::success(character))
}
