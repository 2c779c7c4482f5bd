//! Modelo de User
//!
//! Cuentas del marketplace: un usuario puede publicar vehículos como
//! propietario y reservar vehículos ajenos como arrendatario.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// User principal - mapea exactamente a la tabla users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
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
    pub verification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
