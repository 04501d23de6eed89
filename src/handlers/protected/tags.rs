use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;

use crate::database::models::Tag;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AttributeService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict to tags assigned to at least one recipe
    pub assigned_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// GET /api/tags - List the requester's tags, name descending
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Tag>> {
    let service = AttributeService::<Tag>::new().await?;
    let tags = service
        .list(auth_user.user_id, query.assigned_only.unwrap_or(false))
        .await?;
    Ok(ApiResponse::success(tags))
}

/// POST /api/tags - Create a tag owned by the requester
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateTagRequest>,
) -> ApiResult<Tag> {
    let service = AttributeService::<Tag>::new().await?;
    let tag = service.create(auth_user.user_id, &payload.name).await?;
    Ok(ApiResponse::created(tag))
}
