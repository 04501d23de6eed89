use axum::Json;
use serde::Deserialize;

use crate::database::models::Identity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::IdentityService;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// POST /auth/register - Create a new identity
///
/// Open endpoint; the created account immediately owns an empty catalog.
/// Duplicate email answers 409 regardless of who got there first.
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<Identity> {
    let service = IdentityService::new().await?;
    let identity = service
        .create_identity(&payload.email, &payload.password, &payload.name)
        .await?;

    tracing::info!("Registered identity {}", identity.id);
    Ok(ApiResponse::created(identity))
}
