//! DTOs de Vehicles

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::{RentalMode, Vehicle};

// Request para publicar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(length(min = 2, max = 50))]
    pub vehicle_type: String,

    /// true = modo por asiento; por defecto alquiler completo
    pub is_shared: Option<bool>,

    pub price_per_hour: Option<Decimal>,
    pub price_per_seat: Option<Decimal>,

    #[validate(range(min = 1, max = 168))]
    pub max_duration: Option<i32>,

    #[validate(length(min = 1, max = 50))]
    pub location: String,

    #[validate(length(min = 1))]
    pub image: String,

    pub features: Option<Vec<String>>,
    pub phone: Option<String>,
    pub reg_no: Option<String>,
}

// Request para actualizar campos estáticos
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 2, max = 50))]
    pub vehicle_type: Option<String>,

    pub price_per_hour: Option<Decimal>,
    pub price_per_seat: Option<Decimal>,

    #[validate(range(min = 1, max = 168))]
    pub max_duration: Option<i32>,

    pub location: Option<String>,
    pub image: Option<String>,
    pub features: Option<Vec<String>>,
    pub phone: Option<String>,
    pub reg_no: Option<String>,
}

// Request para el cambio explícito de modo
#[derive(Debug, Deserialize)]
pub struct SwitchModeRequest {
    pub is_shared: bool,
    pub price_per_hour: Option<Decimal>,
    pub price_per_seat: Option<Decimal>,
}

// Filtros del listado público
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFilters {
    pub vehicle_type: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub vehicle_type: String,
    pub is_shared: bool,
    pub fully_available: bool,
    pub seats_available: Option<i32>,
    pub seat_capacity: Option<i32>,
    pub price_per_hour: Option<Decimal>,
    pub price_per_seat: Option<Decimal>,
    pub max_duration: i32,
    pub location: String,
    pub image: String,
    pub features: Vec<String>,
    pub rating: Decimal,
    pub rating_count: i32,
    pub total_bookings: i32,
    pub owner_phone: String,
    pub owner_reg_no: String,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        let fully_available = vehicle.mode.has_capacity();
        let (is_shared, seats_available, seat_capacity, price_per_hour, price_per_seat) =
            match &vehicle.mode {
                RentalMode::FullRental { price_per_hour, .. } => {
                    (false, None, None, Some(*price_per_hour), None)
                }
                RentalMode::SeatShared {
                    seats_available,
                    seat_capacity,
                    price_per_seat,
                } => (
                    true,
                    Some(*seats_available),
                    Some(*seat_capacity),
                    None,
                    Some(*price_per_seat),
                ),
            };

        Self {
            id: vehicle.id,
            owner_id: vehicle.owner_id,
            name: vehicle.name,
            vehicle_type: vehicle.vehicle_type,
            is_shared,
            fully_available,
            seats_available,
            seat_capacity,
            price_per_hour,
            price_per_seat,
            max_duration: vehicle.max_duration,
            location: vehicle.location,
            image: vehicle.image,
            features: vehicle.features,
            rating: vehicle.rating,
            rating_count: vehicle.rating_count,
            total_bookings: vehicle.total_bookings,
            owner_phone: vehicle.owner_phone,
            owner_reg_no: vehicle.owner_reg_no,
            created_at: vehicle.created_at,
        }
    }
}
