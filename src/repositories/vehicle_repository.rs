//! Repositorio de Vehicles
//!
//! Las columnas de capacidad solo se mutan vía CAS sobre `version`; los
//! caminos de reserva viven en el repositorio de bookings para que el
//! claim y el insert compartan transacción.

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::vehicle_dto::{UpdateVehicleRequest, VehicleFilters};
use crate::models::vehicle::{RentalMode, Vehicle, VehicleRow};
use crate::utils::errors::AppResult;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        vehicle_type: &str,
        mode: &RentalMode,
        max_duration: i32,
        location: &str,
        image: &str,
        features: &[String],
        owner_phone: &str,
        owner_reg_no: &str,
    ) -> AppResult<Vehicle> {
        let cols = mode.columns();

        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (
                owner_id, name, vehicle_type, owner_phone, owner_reg_no,
                is_shared, fully_available, seats_available, seat_capacity,
                price_per_hour, price_per_seat, max_duration, location, image, features
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(vehicle_type)
        .bind(owner_phone)
        .bind(owner_reg_no)
        .bind(cols.is_shared)
        .bind(cols.fully_available)
        .bind(cols.seats_available)
        .bind(cols.seat_capacity)
        .bind(cols.price_per_hour)
        .bind(cols.price_per_seat)
        .bind(max_duration)
        .bind(location)
        .bind(image)
        .bind(features)
        .fetch_one(&self.pool)
        .await?;

        Ok(Vehicle::from(row))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Vehicle::from))
    }

    /// Listado público: por defecto solo vehículos con capacidad restante.
    /// El filtro de precio aplica sobre la base de precio del modo activo.
    pub async fn list_available(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT * FROM vehicles
            WHERE fully_available = TRUE
              AND ($1::text IS NULL OR vehicle_type = $1)
              AND ($2::text IS NULL OR location = $2)
              AND ($3::numeric IS NULL OR
                   (CASE WHEN is_shared THEN price_per_seat ELSE price_per_hour END) >= $3)
              AND ($4::numeric IS NULL OR
                   (CASE WHEN is_shared THEN price_per_seat ELSE price_per_hour END) <= $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.vehicle_type.as_deref())
        .bind(filters.location.as_deref())
        .bind(filters.min_price)
        .bind(filters.max_price)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    /// Listado completo para el dashboard de administración
    pub async fn list_all(&self) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    pub async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    /// Actualización de campos estáticos (sin tocar el ledger de capacidad)
    pub async fn update_static(
        &self,
        id: Uuid,
        request: &UpdateVehicleRequest,
    ) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            UPDATE vehicles
            SET name = COALESCE($2, name),
                vehicle_type = COALESCE($3, vehicle_type),
                price_per_hour = COALESCE($4, price_per_hour),
                price_per_seat = COALESCE($5, price_per_seat),
                max_duration = COALESCE($6, max_duration),
                location = COALESCE($7, location),
                image = COALESCE($8, image),
                features = COALESCE($9, features),
                owner_phone = COALESCE($10, owner_phone),
                owner_reg_no = COALESCE($11, owner_reg_no),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.vehicle_type.as_deref())
        .bind(request.price_per_hour)
        .bind(request.price_per_seat)
        .bind(request.max_duration)
        .bind(request.location.as_deref())
        .bind(request.image.as_deref())
        .bind(request.features.as_deref())
        .bind(request.phone.as_deref())
        .bind(request.reg_no.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Vehicle::from(row))
    }

    /// Cambio de modo explícito: reescribe el ledger entero con CAS.
    /// Devuelve false si la versión esperada ya no está vigente.
    pub async fn switch_mode(
        &self,
        id: Uuid,
        expected_version: i64,
        new_mode: &RentalMode,
    ) -> AppResult<bool> {
        let cols = new_mode.columns();

        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET is_shared = $2,
                fully_available = $3,
                seats_available = $4,
                seat_capacity = $5,
                price_per_hour = $6,
                price_per_seat = $7,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $8
            "#,
        )
        .bind(id)
        .bind(cols.is_shared)
        .bind(cols.fully_available)
        .bind(cols.seats_available)
        .bind(cols.seat_capacity)
        .bind(cols.price_per_hour)
        .bind(cols.price_per_seat)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
