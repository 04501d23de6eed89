use axum::{
    extract::{Extension, Path},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::database::models::{RecipeDetail, RecipeSummary};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::recipe_service::{NewRecipe, RecipeChanges};
use crate::services::RecipeService;

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    /// Absent leaves the link alone; an explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// GET /api/recipes - List the requester's recipes (summary shape)
pub async fn list(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<RecipeSummary>> {
    let service = RecipeService::new().await?;
    let recipes = service.list(auth_user.user_id).await?;
    Ok(ApiResponse::success(recipes))
}

/// POST /api/recipes - Create a recipe owned by the requester
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateRecipeRequest>,
) -> ApiResult<RecipeSummary> {
    let service = RecipeService::new().await?;
    let recipe = service
        .create(
            auth_user.user_id,
            NewRecipe {
                title: payload.title,
                time_minutes: payload.time_minutes,
                price: payload.price,
                link: payload.link,
                tags: payload.tags,
                ingredients: payload.ingredients,
            },
        )
        .await?;
    Ok(ApiResponse::created(recipe))
}

/// GET /api/recipes/:id - Single recipe with expanded tags and ingredients
pub async fn get(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<RecipeDetail> {
    let service = RecipeService::new().await?;
    let recipe = service.retrieve(auth_user.user_id, id).await?;
    Ok(ApiResponse::success(recipe))
}

/// PUT /api/recipes/:id - Replace a recipe's fields and associations
pub async fn put(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateRecipeRequest>,
) -> ApiResult<RecipeSummary> {
    let service = RecipeService::new().await?;
    let recipe = service
        .update(
            auth_user.user_id,
            id,
            RecipeChanges {
                title: Some(payload.title),
                time_minutes: Some(payload.time_minutes),
                price: Some(payload.price),
                link: Some(payload.link),
                tags: Some(payload.tags),
                ingredients: Some(payload.ingredients),
            },
        )
        .await?;
    Ok(ApiResponse::success(recipe))
}

/// PATCH /api/recipes/:id - Update only the provided fields
pub async fn patch(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> ApiResult<RecipeSummary> {
    let service = RecipeService::new().await?;
    let recipe = service
        .update(
            auth_user.user_id,
            id,
            RecipeChanges {
                title: payload.title,
                time_minutes: payload.time_minutes,
                price: payload.price,
                link: payload.link,
                tags: payload.tags,
                ingredients: payload.ingredients,
            },
        )
        .await?;
    Ok(ApiResponse::success(recipe))
}

/// DELETE /api/recipes/:id - Delete an owned recipe
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    let service = RecipeService::new().await?;
    service.delete(auth_user.user_id, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
