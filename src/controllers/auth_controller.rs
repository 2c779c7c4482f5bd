//! Controller de autenticación
//!
//! Registro con verificación por email, login con JWT y perfil.

use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserResponse,
    VerifyEmailRequest,
};
use crate::repositories::user_repository::UserRepository;
use crate::services::jwt_service::JwtService;
use crate::services::notification_service::NotificationClient;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct AuthController {
    users: UserRepository,
    jwt: JwtService,
    notifier: NotificationClient,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: UserRepository::new(state.pool.clone()),
            jwt: JwtService::new(&state.config),
            notifier: state.notifier.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.users.email_exists(&email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Hash(e.to_string()))?;

        let verification_token = generate_verification_token();

        let user = self
            .users
            .create(
                &request.full_name,
                &email,
                &password_hash,
                request.location.as_deref().unwrap_or("FME"),
                &verification_token,
            )
            .await?;

        // La entrega del email nunca bloquea el registro
        self.notifier.spawn_verification_email(
            user.email.clone(),
            user.full_name.clone(),
            verification_token,
        );

        Ok(UserResponse::from(user))
    }

    pub async fn verify_email(&self, request: VerifyEmailRequest) -> AppResult<UserResponse> {
        let user = self
            .users
            .find_by_verification_token(&request.token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid verification token".to_string()))?;

        let verified = self.users.mark_verified(user.id).await?;
        Ok(UserResponse::from(verified))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email = request.email.trim().to_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !user.is_verified {
            return Err(AppError::Unauthorized(
                "Please verify your email first".to_string(),
            ));
        }

        let password_valid = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(e.to_string()))?;
        if !password_valid {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.jwt.generate_token(user.id)?;

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user: UserResponse::from(user),
        })
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<UserResponse> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        request.validate()?;

        let user = self
            .users
            .update_profile(
                user_id,
                request.full_name.as_deref(),
                request.phone.as_deref(),
                request.location.as_deref(),
                request.profile_image.as_deref(),
            )
            .await?;

        Ok(UserResponse::from(user))
    }
}

/// Token de verificación: 32 bytes aleatorios en hex
fn generate_verification_token() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_token_shape() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Dos tokens consecutivos no colisionan
        assert_ne!(token, generate_verification_token());
    }
}
