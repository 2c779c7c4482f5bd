//! Controller de Vehicles
//!
//! CRUD de vehículos y el cambio explícito de modo. El ledger de capacidad
//! no se toca por este camino salvo en el cambio de modo, que exige cero
//! reservas activas y reescribe el ledger con CAS.

use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    CreateVehicleRequest, SwitchModeRequest, UpdateVehicleRequest, VehicleFilters, VehicleResponse,
};
use crate::models::vehicle::{RentalMode, Vehicle, SEAT_CAPACITY};
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct VehicleController {
    vehicles: VehicleRepository,
    bookings: BookingRepository,
    users: UserRepository,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            vehicles: VehicleRepository::new(state.pool.clone()),
            bookings: BookingRepository::new(state.pool.clone()),
            users: UserRepository::new(state.pool.clone()),
        }
    }

    pub async fn list(&self, filters: VehicleFilters) -> AppResult<Vec<VehicleResponse>> {
        let vehicles = self.vehicles.list_available(&filters).await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn detail(&self, id: Uuid) -> AppResult<VehicleResponse> {
        let vehicle = self
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<VehicleResponse>> {
        let vehicles = self.vehicles.find_by_owner(owner_id).await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        request: CreateVehicleRequest,
    ) -> AppResult<VehicleResponse> {
        request.validate()?;

        let owner = self
            .users
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        let mode = build_mode(
            request.is_shared.unwrap_or(false),
            request.price_per_hour,
            request.price_per_seat,
        )?;

        let owner_phone = request
            .phone
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| owner.phone.clone());

        let vehicle = self
            .vehicles
            .create(
                owner_id,
                &request.name,
                &request.vehicle_type,
                &mode,
                request.max_duration.unwrap_or(24),
                &request.location,
                &request.image,
                request.features.as_deref().unwrap_or(&[]),
                &owner_phone,
                request.reg_no.as_deref().unwrap_or(""),
            )
            .await?;

        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        vehicle_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> AppResult<VehicleResponse> {
        request.validate()?;

        self.load_owned(owner_id, vehicle_id, "update").await?;

        let vehicle = self.vehicles.update_static(vehicle_id, &request).await?;
        Ok(VehicleResponse::from(vehicle))
    }

    /// Cambio explícito de modo: solo sin reservas activas
    pub async fn switch_mode(
        &self,
        owner_id: Uuid,
        vehicle_id: Uuid,
        request: SwitchModeRequest,
    ) -> AppResult<VehicleResponse> {
        for attempt in 0..2 {
            let vehicle = self.load_owned(owner_id, vehicle_id, "update").await?;

            let active = self.bookings.count_active_for_vehicle(vehicle_id).await?;
            if active > 0 {
                return Err(AppError::Conflict(format!(
                    "Cannot switch rental mode with {} active booking(s)",
                    active
                )));
            }

            let new_mode = build_mode(
                request.is_shared,
                request.price_per_hour,
                request.price_per_seat,
            )?;

            if self
                .vehicles
                .switch_mode(vehicle_id, vehicle.version, &new_mode)
                .await?
            {
                return self.detail(vehicle_id).await;
            }

            if attempt == 0 {
                debug!("Lost mode-switch race on vehicle {}, retrying once", vehicle_id);
            }
        }

        Err(AppError::Conflict(
            "Vehicle state changed concurrently, please try again".to_string(),
        ))
    }

    /// Borrado: prohibido mientras existan reservas activas
    pub async fn delete(&self, owner_id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        self.load_owned(owner_id, vehicle_id, "delete").await?;

        let active = self.bookings.count_active_for_vehicle(vehicle_id).await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete vehicle with {} active booking(s)",
                active
            )));
        }

        self.vehicles.delete(vehicle_id).await
    }

    async fn load_owned(
        &self,
        owner_id: Uuid,
        vehicle_id: Uuid,
        action: &str,
    ) -> AppResult<Vehicle> {
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.owner_id != owner_id {
            return Err(AppError::Forbidden(format!(
                "Not authorized to {} this vehicle",
                action
            )));
        }

        Ok(vehicle)
    }
}

/// Construir el modo a partir de los campos del request; la base de precio
/// del modo activo es obligatoria y excluyente.
fn build_mode(
    is_shared: bool,
    price_per_hour: Option<rust_decimal::Decimal>,
    price_per_seat: Option<rust_decimal::Decimal>,
) -> AppResult<RentalMode> {
    if is_shared {
        let price = price_per_seat.ok_or_else(|| {
            AppError::BadRequest("price_per_seat is required for seat-shared vehicles".to_string())
        })?;
        Ok(RentalMode::SeatShared {
            seats_available: SEAT_CAPACITY,
            seat_capacity: SEAT_CAPACITY,
            price_per_seat: price,
        })
    } else {
        let price = price_per_hour.ok_or_else(|| {
            AppError::BadRequest("price_per_hour is required for full-rental vehicles".to_string())
        })?;
        Ok(RentalMode::FullRental {
            available: true,
            price_per_hour: price,
        })
    }
}
