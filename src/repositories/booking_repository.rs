//! Repositorio de Bookings
//!
//! El claim de capacidad y el insert de la reserva (o la restauración y el
//! settlement) comparten una transacción: o se aplican juntos o no se
//! aplica nada. El CAS sobre `vehicles.version` convierte el
//! check-then-write en un paso indivisible por vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::vehicle::{CapacityColumns, Vehicle};
use crate::services::booking_lifecycle::TransitionPlan;
use crate::services::settlement;
use crate::utils::errors::AppResult;

/// Campos de una reserva nueva lista para persistir
#[derive(Debug, Clone)]
pub struct CreateBookingRecord {
    pub renter_id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_phone: String,
    pub renter_reg_no: String,
    pub pickup_location: String,
    pub duration_hours: i64,
    pub seats_booked: i32,
    pub total_cost: Decimal,
    pub booking_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Descontar capacidad e insertar la reserva en una sola transacción.
    ///
    /// Devuelve `None` cuando el CAS pierde la carrera (la versión del
    /// vehículo cambió entre la lectura y el write); el caller decide si
    /// reintenta desde un snapshot fresco.
    pub async fn create_with_claim(
        &self,
        vehicle_id: Uuid,
        expected_version: i64,
        claimed: CapacityColumns,
        record: &CreateBookingRecord,
    ) -> AppResult<Option<Booking>> {
        let mut tx = self.pool.begin().await?;

        let cas = sqlx::query(
            r#"
            UPDATE vehicles
            SET fully_available = $2,
                seats_available = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $4
            "#,
        )
        .bind(vehicle_id)
        .bind(claimed.fully_available)
        .bind(claimed.seats_available)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if cas.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                renter_id, vehicle_id, renter_phone, renter_reg_no, pickup_location,
                duration_hours, seats_booked, total_cost, booking_date, return_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(record.renter_id)
        .bind(record.vehicle_id)
        .bind(&record.renter_phone)
        .bind(&record.renter_reg_no)
        .bind(&record.pickup_location)
        .bind(record.duration_hours)
        .bind(record.seats_booked)
        .bind(record.total_cost)
        .bind(record.booking_date)
        .bind(record.return_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(booking))
    }

    /// Aplicar un plan de transición: reserva, ledger y settlement juntos.
    ///
    /// Devuelve `None` si el CAS del vehículo pierde la carrera. Cuando el
    /// plan no toca el ledger ni liquida, solo se actualiza la reserva.
    pub async fn apply_transition(
        &self,
        booking_id: Uuid,
        vehicle: &Vehicle,
        plan: &TransitionPlan,
    ) -> AppResult<Option<Booking>> {
        let mut tx = self.pool.begin().await?;

        if plan.updated_mode.is_some() || plan.settlement.is_some() {
            let mode = plan.updated_mode.as_ref().unwrap_or(&vehicle.mode);
            let cols = mode.columns();

            let aggregate = match plan.settlement.as_ref().and_then(|s| s.rating_push) {
                Some(rating) => {
                    settlement::push_rating(vehicle.rating_sum, vehicle.rating_count, rating)
                }
                None => settlement::RatingAggregate {
                    rating_sum: vehicle.rating_sum,
                    rating_count: vehicle.rating_count,
                    rating: vehicle.rating,
                },
            };
            let bookings_increment: i32 = if plan.settlement.is_some() { 1 } else { 0 };

            let cas = sqlx::query(
                r#"
                UPDATE vehicles
                SET fully_available = $2,
                    seats_available = $3,
                    rating_sum = $4,
                    rating_count = $5,
                    rating = $6,
                    total_bookings = total_bookings + $7,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $1 AND version = $8
                "#,
            )
            .bind(vehicle.id)
            .bind(cols.fully_available)
            .bind(cols.seats_available)
            .bind(aggregate.rating_sum)
            .bind(aggregate.rating_count)
            .bind(aggregate.rating)
            .bind(bookings_increment)
            .bind(vehicle.version)
            .execute(&mut *tx)
            .await?;

            if cas.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(None);
            }

            if let Some(settlement_action) = &plan.settlement {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET total_earnings = total_earnings + $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(vehicle.owner_id)
                .bind(settlement_action.earnings_credit)
                .execute(&mut *tx)
                .await?;
            }
        }

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2,
                payment_status = $3,
                feedback_rating = COALESCE($4, feedback_rating),
                feedback_comment = COALESCE($5, feedback_comment),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(plan.status)
        .bind(plan.payment_status)
        .bind(plan.feedback.as_ref().and_then(|f| f.rating))
        .bind(plan.feedback.as_ref().and_then(|f| f.comment.as_deref()))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(booking))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    pub async fn list_for_renter(&self, renter_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE renter_id = $1 ORDER BY booking_date DESC",
        )
        .bind(renter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Reservas sobre los vehículos de un propietario
    pub async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.* FROM bookings b
            JOIN vehicles v ON v.id = b.vehicle_id
            WHERE v.owner_id = $1
            ORDER BY b.booking_date DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Reservas que retienen capacidad del vehículo
    pub async fn count_active_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE vehicle_id = $1
              AND status = ANY(ARRAY['pending', 'confirmed', 'in-progress']::booking_status[])
            "#,
        )
        .bind(vehicle_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
