use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{decode_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = decode_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: UserRole, denied: &str) -> AppResult<()> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if claims.role != role {
        return Err(AppError::Forbidden(denied.to_string()));
    }

    Ok(())
}

pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, UserRole::Admin, "Admin access required")?;
    Ok(next.run(request).await)
}

pub async fn require_driver(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, UserRole::Driver, "Driver access required")?;
    Ok(next.run(request).await)
}

pub async fn require_customer(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, UserRole::Customer, "Customer access required")?;
    Ok(next.run(request).await)
}
