use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;

use crate::database::models::Ingredient;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AttributeService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict to ingredients assigned to at least one recipe
    pub assigned_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
}

/// GET /api/ingredients - List the requester's ingredients, name descending
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Ingredient>> {
    let service = AttributeService::<Ingredient>::new().await?;
    let ingredients = service
        .list(auth_user.user_id, query.assigned_only.unwrap_or(false))
        .await?;
    Ok(ApiResponse::success(ingredients))
}

/// POST /api/ingredients - Create an ingredient owned by the requester
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateIngredientRequest>,
) -> ApiResult<Ingredient> {
    let service = AttributeService::<Ingredient>::new().await?;
    let ingredient = service.create(auth_user.user_id, &payload.name).await?;
    Ok(ApiResponse::created(ingredient))
}
