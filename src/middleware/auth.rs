//! Autenticación JWT
//!
//! Extractor de usuario autenticado: valida el header Bearer, decodifica
//! el JWT y comprueba que la cuenta siga existiendo. Los handlers públicos
//! simplemente no lo piden.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::repositories::user_repository::UserRepository;
use crate::services::jwt_service::JwtService;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Usuario autenticado inyectado en los handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Extraer token del header Authorization
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|auth_str| auth_str.to_str().ok())
            .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

        // Decodificar y validar JWT
        let jwt = JwtService::new(&state.config);
        let claims = jwt.validate_token(token)?;
        let user_id = JwtService::user_id_from_claims(&claims)?;

        // Verificar que el usuario existe en la base de datos
        let users = UserRepository::new(state.pool.clone());
        users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(AuthenticatedUser { user_id })
    }
}
