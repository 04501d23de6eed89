use axum::{extract::Extension, Json};
use serde::Deserialize;

use crate::database::models::Identity;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::IdentityService;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// GET /api/auth/whoami - Current identity profile
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Identity> {
    let service = IdentityService::new().await?;
    let identity = service.get(auth_user.user_id).await?;
    Ok(ApiResponse::success(identity))
}

/// PUT /api/auth/user - Update own display name and/or password
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Identity> {
    let service = IdentityService::new().await?;
    let identity = service
        .update_profile(
            auth_user.user_id,
            payload.name.as_deref(),
            payload.password.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success(identity))
}

/// DELETE /api/auth/user - Delete own account and everything it owns
pub async fn delete(Extension(auth_user): Extension<AuthUser>) -> ApiResult<()> {
    let service = IdentityService::new().await?;
    service.delete_identity(auth_user.user_id).await?;

    tracing::info!("Deleted identity {}", auth_user.user_id);
    Ok(ApiResponse::<()>::no_content())
}
