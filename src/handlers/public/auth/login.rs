use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::IdentityService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - Authenticate credentials and receive a JWT
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let service = IdentityService::new().await?;
    let identity = service.authenticate(&payload.email, &payload.password).await?;

    let token = generate_jwt(Claims::new(identity.id, identity.email.clone())).map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": expires_in,
        "user": {
            "id": identity.id,
            "email": identity.email,
            "display_name": identity.display_name,
        }
    })))
}
