//! Middleware de autenticación JWT
//! 
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de roles.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::debug;

use crate::{
    models::auth::AuthenticatedUser,
    state::AppState,
    utils::{
        errors::{forbidden_error, AppError},
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt_config())?;
    let user = AuthenticatedUser::try_from(claims)?;

    debug!("🔐 {} autenticado como {}", user.username, user.role.as_str());

    // Inyectar usuario autenticado en las extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Middleware para rutas del personal (EMPLOYEE / ADMIN)
pub async fn staff_only_middleware(
    Extension(user): Extension<AuthenticatedUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_staff() {
        return Err(forbidden_error(
            &format!("{} {}", request.method(), request.uri().path()),
            "staff role required",
        ));
    }

    Ok(next.run(request).await)
}
