//! Controller de administración
//!
//! Dashboard y toggles de cuentas (deuda, aprobación).

use serde::Serialize;
use uuid::Uuid;

use crate::dto::auth_dto::UserResponse;
use crate::dto::vehicle_dto::VehicleResponse;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

/// Datos del dashboard de administración
#[derive(Debug, Serialize)]
pub struct AdminDataResponse {
    pub users: Vec<UserResponse>,
    pub vehicles: Vec<VehicleResponse>,
}

pub struct AdminController {
    users: UserRepository,
    vehicles: VehicleRepository,
}

impl AdminController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: UserRepository::new(state.pool.clone()),
            vehicles: VehicleRepository::new(state.pool.clone()),
        }
    }

    pub async fn data(&self) -> AppResult<AdminDataResponse> {
        let users = self.users.list_all().await?;
        let vehicles = self.vehicles.list_all().await?;

        Ok(AdminDataResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            vehicles: vehicles.into_iter().map(VehicleResponse::from).collect(),
        })
    }

    pub async fn clear_debt(&self, user_id: Uuid) -> AppResult<UserResponse> {
        let user = self
            .users
            .clear_debt(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    pub async fn approve(&self, user_id: Uuid) -> AppResult<UserResponse> {
        let user = self
            .users
            .approve(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }
}
