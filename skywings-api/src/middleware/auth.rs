use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use skywings_core::{LoyaltyTier, Role, User};
use skywings_order::Requester;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub tier: LoyaltyTier,
    pub exp: usize,
}

impl Claims {
    pub fn for_user(user: &User, auth: &AuthConfig) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            tier: user.loyalty_tier,
            exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
        }
    }

    pub fn requester(&self) -> Requester {
        Requester::new(self.sub, self.role)
    }
}

pub fn issue_token(claims: &Claims, auth: &AuthConfig) -> Result<String, AppError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn unauthorized() -> AppError {
    AppError::AuthenticationError("Unauthorized".to_string())
}

fn claims_from(req: &Request, auth: &AuthConfig) -> Result<Claims, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(unauthorized)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| unauthorized())?;

    Ok(token_data.claims)
}

/// Any signed-in user.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = claims_from(&req, &state.auth)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Signed-in users with the ADMIN role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = claims_from(&req, &state.auth)?;
    if claims.role != Role::Admin {
        return Err(AppError::AuthorizationError("Access denied".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
