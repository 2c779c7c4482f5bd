//! DTOs de autenticación y perfil

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;

// Request de registro
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,

    #[validate(email)]
    pub email: String,

    // bcrypt trunca en 72 bytes
    #[validate(length(min = 8, max = 72))]
    pub password: String,

    pub location: Option<String>,
}

// Request de verificación de email
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Request de actualización de perfil
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,

    #[validate(length(max = 50))]
    pub phone: Option<String>,

    pub location: Option<String>,
    pub profile_image: Option<String>,
}

// Response de usuario (sin password hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub reg_no: String,
    pub location: String,
    pub profile_image: Option<String>,
    pub rating: Decimal,
    pub reviews: i32,
    pub total_earnings: Decimal,
    pub debt: Decimal,
    pub is_approved: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            reg_no: user.reg_no,
            location: user.location,
            profile_image: user.profile_image,
            rating: user.rating,
            reviews: user.reviews,
            total_earnings: user.total_earnings,
            debt: user.debt,
            is_approved: user.is_approved,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}
