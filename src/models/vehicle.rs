//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y el ledger de capacidad.
//! El modo de alquiler es una variante etiquetada: un vehículo se alquila
//! completo (`FullRental`) o por asiento (`SeatShared`), nunca ambos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Capacidad fija de asientos en modo compartido
pub const SEAT_CAPACITY: i32 = 4;

/// Ledger de capacidad por vehículo.
///
/// Invariante: en `SeatShared`, `0 <= seats_available <= seat_capacity`.
#[derive(Debug, Clone, PartialEq)]
pub enum RentalMode {
    FullRental {
        available: bool,
        price_per_hour: Decimal,
    },
    SeatShared {
        seats_available: i32,
        seat_capacity: i32,
        price_per_seat: Decimal,
    },
}

impl RentalMode {
    /// Queda alguna capacidad reservable
    pub fn has_capacity(&self) -> bool {
        match self {
            RentalMode::FullRental { available, .. } => *available,
            RentalMode::SeatShared { seats_available, .. } => *seats_available > 0,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, RentalMode::SeatShared { .. })
    }

    /// Columnas planas para persistencia. Los campos del modo ausente
    /// conservan sus defaults de schema.
    pub fn columns(&self) -> CapacityColumns {
        match self {
            RentalMode::FullRental {
                available,
                price_per_hour,
            } => CapacityColumns {
                is_shared: false,
                fully_available: *available,
                seats_available: SEAT_CAPACITY,
                seat_capacity: SEAT_CAPACITY,
                price_per_hour: *price_per_hour,
                price_per_seat: Decimal::ZERO,
            },
            RentalMode::SeatShared {
                seats_available,
                seat_capacity,
                price_per_seat,
            } => CapacityColumns {
                is_shared: true,
                fully_available: *seats_available > 0,
                seats_available: *seats_available,
                seat_capacity: *seat_capacity,
                price_per_hour: Decimal::ZERO,
                price_per_seat: *price_per_seat,
            },
        }
    }
}

/// Representación plana del ledger tal como se persiste
#[derive(Debug, Clone, Copy)]
pub struct CapacityColumns {
    pub is_shared: bool,
    pub fully_available: bool,
    pub seats_available: i32,
    pub seat_capacity: i32,
    pub price_per_hour: Decimal,
    pub price_per_seat: Decimal,
}

/// Fila de la tabla vehicles
#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub vehicle_type: String,
    pub owner_phone: String,
    pub owner_reg_no: String,
    pub is_shared: bool,
    pub fully_available: bool,
    pub seats_available: i32,
    pub seat_capacity: i32,
    pub price_per_hour: Decimal,
    pub price_per_seat: Decimal,
    pub max_duration: i32,
    pub location: String,
    pub image: String,
    pub features: Vec<String>,
    pub rating: Decimal,
    pub rating_sum: Decimal,
    pub rating_count: i32,
    pub total_bookings: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vehicle de dominio con el ledger ya etiquetado
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub vehicle_type: String,
    pub owner_phone: String,
    pub owner_reg_no: String,
    pub mode: RentalMode,
    pub max_duration: i32,
    pub location: String,
    pub image: String,
    pub features: Vec<String>,
    pub rating: Decimal,
    pub rating_sum: Decimal,
    pub rating_count: i32,
    pub total_bookings: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        let mode = if row.is_shared {
            RentalMode::SeatShared {
                seats_available: row.seats_available,
                seat_capacity: row.seat_capacity,
                price_per_seat: row.price_per_seat,
            }
        } else {
            RentalMode::FullRental {
                available: row.fully_available,
                price_per_hour: row.price_per_hour,
            }
        };

        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            vehicle_type: row.vehicle_type,
            owner_phone: row.owner_phone,
            owner_reg_no: row.owner_reg_no,
            mode,
            max_duration: row.max_duration,
            location: row.location,
            image: row.image,
            features: row.features,
            rating: row.rating,
            rating_sum: row.rating_sum,
            rating_count: row.rating_count,
            total_bookings: row.total_bookings,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_rental_capacity() {
        let mode = RentalMode::FullRental {
            available: true,
            price_per_hour: Decimal::from(10),
        };
        assert!(mode.has_capacity());
        assert!(!mode.is_shared());

        let booked = RentalMode::FullRental {
            available: false,
            price_per_hour: Decimal::from(10),
        };
        assert!(!booked.has_capacity());
    }

    #[test]
    fn test_seat_shared_columns_derive_availability() {
        let mode = RentalMode::SeatShared {
            seats_available: 0,
            seat_capacity: SEAT_CAPACITY,
            price_per_seat: Decimal::from(5),
        };
        assert!(!mode.has_capacity());
        let cols = mode.columns();
        assert!(cols.is_shared);
        assert!(!cols.fully_available);

        let open = RentalMode::SeatShared {
            seats_available: 2,
            seat_capacity: SEAT_CAPACITY,
            price_per_seat: Decimal::from(5),
        };
        assert!(open.columns().fully_available);
    }
}
