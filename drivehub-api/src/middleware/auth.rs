use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use drivehub_core::{Actor, CoreError};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

const ADMIN_ROLES: [&str; 2] = ["ADMIN", "SUPER_ADMIN"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

/// Turns a valid administrator bearer token into an [`Actor::Admin`] request extension.
/// Routes without this layer run as [`Actor::Customer`].
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token_data = decode::<AdminClaims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {e}")))?;

    if !ADMIN_ROLES.contains(&token_data.claims.role.as_str()) {
        tracing::warn!(subject = %token_data.claims.sub, role = %token_data.claims.role, "Non-admin token on admin route");
        return Err(CoreError::Forbidden(format!("role {} may not administer", token_data.claims.role)).into());
    }

    req.extensions_mut().insert(Actor::admin(token_data.claims.sub.clone()));
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
