//! Controller de Bookings
//!
//! Orquesta el motor de ciclo de vida contra los repositorios. Cada
//! operación que toca el ledger relee el vehículo, planifica en puro y
//! aplica con CAS; si pierde la carrera reintenta una única vez desde un
//! snapshot fresco antes de devolver el error al caller.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{
    BookingListQuery, BookingResponse, CreateBookingRequest, UpdateBookingRequest,
};
use crate::models::booking::{Booking, BookingStatus};
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::repositories::booking_repository::{BookingRepository, CreateBookingRecord};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::access_guard::{booking_access, ensure_not_self_rental, ensure_participant};
use crate::services::booking_lifecycle::{
    claim_capacity, plan_cancellation, plan_update, return_date, BookingUpdate,
};
use crate::services::notification_service::NotificationClient;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct BookingController {
    bookings: BookingRepository,
    vehicles: VehicleRepository,
    users: UserRepository,
    notifier: NotificationClient,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            bookings: BookingRepository::new(state.pool.clone()),
            vehicles: VehicleRepository::new(state.pool.clone()),
            users: UserRepository::new(state.pool.clone()),
            notifier: state.notifier.clone(),
        }
    }

    pub async fn create(
        &self,
        renter_id: Uuid,
        request: CreateBookingRequest,
    ) -> AppResult<BookingResponse> {
        request.validate()?;

        let renter = self
            .users
            .find_by_id(renter_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        for attempt in 0..2 {
            let vehicle = self
                .vehicles
                .find_by_id(request.vehicle_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

            ensure_not_self_rental(vehicle.owner_id, renter_id)?;

            if request.duration > i64::from(vehicle.max_duration) {
                return Err(AppError::BadRequest(format!(
                    "Rental duration exceeds the {} hour limit for this vehicle",
                    vehicle.max_duration
                )));
            }

            let claim = claim_capacity(&vehicle.mode, request.duration, request.seats_requested)?;

            let booking_date = request.start_time.unwrap_or_else(Utc::now);
            let record = CreateBookingRecord {
                renter_id,
                vehicle_id: vehicle.id,
                renter_phone: request
                    .phone
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| renter.phone.clone()),
                renter_reg_no: request.reg_no.clone().unwrap_or_default(),
                pickup_location: request.pickup_location.clone(),
                duration_hours: request.duration,
                seats_booked: claim.seats_booked,
                total_cost: claim.total_cost,
                booking_date,
                return_date: return_date(booking_date, request.duration),
            };

            let created = self
                .bookings
                .create_with_claim(
                    vehicle.id,
                    vehicle.version,
                    claim.updated_mode.columns(),
                    &record,
                )
                .await?;

            if let Some(booking) = created {
                self.notify_owner(&vehicle, &renter, &booking).await;
                return Ok(BookingResponse::from(booking));
            }

            if attempt == 0 {
                debug!("Lost capacity race on vehicle {}, retrying once", vehicle.id);
            }
        }

        Err(AppError::CapacityExceeded(
            "Vehicle availability changed, please try again".to_string(),
        ))
    }

    pub async fn list(&self, actor_id: Uuid, query: BookingListQuery) -> AppResult<Vec<BookingResponse>> {
        let bookings = match query.role.as_deref() {
            Some("owner") => self.bookings.list_for_owner(actor_id).await?,
            Some("renter") | None => self.bookings.list_for_renter(actor_id).await?,
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "Unknown role filter '{}'",
                    other
                )))
            }
        };

        Ok(bookings.into_iter().map(BookingResponse::from).collect())
    }

    pub async fn detail(&self, actor_id: Uuid, booking_id: Uuid) -> AppResult<BookingResponse> {
        let (booking, vehicle) = self.load_booking_with_vehicle(booking_id).await?;

        let access = booking_access(actor_id, booking.renter_id, vehicle.owner_id);
        ensure_participant(&access, "view")?;

        Ok(BookingResponse::from(booking))
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        booking_id: Uuid,
        request: UpdateBookingRequest,
    ) -> AppResult<BookingResponse> {
        let update = BookingUpdate {
            status: request.status,
            payment_status: request.payment_status,
            feedback: request.feedback.clone().map(Into::into),
        };

        for attempt in 0..2 {
            let (booking, vehicle) = self.load_booking_with_vehicle(booking_id).await?;
            let access = booking_access(actor_id, booking.renter_id, vehicle.owner_id);

            let plan = plan_update(&booking, &vehicle.mode, &access, &update)?;

            let applied = self
                .bookings
                .apply_transition(booking.id, &vehicle, &plan)
                .await?;

            if let Some(updated) = applied {
                if updated.status != booking.status {
                    self.notify_status_change(&vehicle, &updated).await;
                }
                return Ok(BookingResponse::from(updated));
            }

            if attempt == 0 {
                debug!("Lost update race on vehicle {}, retrying once", vehicle.id);
            }
        }

        Err(AppError::Conflict(
            "Vehicle state changed concurrently, please try again".to_string(),
        ))
    }

    pub async fn cancel(&self, actor_id: Uuid, booking_id: Uuid) -> AppResult<BookingResponse> {
        for attempt in 0..2 {
            let (booking, vehicle) = self.load_booking_with_vehicle(booking_id).await?;
            let access = booking_access(actor_id, booking.renter_id, vehicle.owner_id);

            let plan = plan_cancellation(&booking, &vehicle.mode, &access)?;

            let applied = self
                .bookings
                .apply_transition(booking.id, &vehicle, &plan)
                .await?;

            if let Some(cancelled) = applied {
                self.notify_status_change(&vehicle, &cancelled).await;
                return Ok(BookingResponse::from(cancelled));
            }

            if attempt == 0 {
                debug!("Lost cancel race on vehicle {}, retrying once", vehicle.id);
            }
        }

        Err(AppError::Conflict(
            "Vehicle state changed concurrently, please try again".to_string(),
        ))
    }

    async fn load_booking_with_vehicle(&self, booking_id: Uuid) -> AppResult<(Booking, Vehicle)> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        let vehicle = self
            .vehicles
            .find_by_id(booking.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        Ok((booking, vehicle))
    }

    /// Aviso al propietario de una reserva nueva; nunca bloquea la respuesta
    async fn notify_owner(&self, vehicle: &Vehicle, renter: &User, booking: &Booking) {
        if let Ok(Some(owner)) = self.users.find_by_id(vehicle.owner_id).await {
            self.notifier.spawn_booking_event(
                owner.email,
                "New booking received".to_string(),
                format!(
                    "{} booked {} ({} seat(s)) starting {}",
                    renter.full_name, vehicle.name, booking.seats_booked, booking.booking_date
                ),
            );
        }
    }

    /// Aviso al arrendatario de un cambio de estado
    async fn notify_status_change(&self, vehicle: &Vehicle, booking: &Booking) {
        if let Ok(Some(renter)) = self.users.find_by_id(booking.renter_id).await {
            let subject = match booking.status {
                BookingStatus::Cancelled => "Booking cancelled",
                BookingStatus::Completed => "Booking completed",
                _ => "Booking updated",
            };
            self.notifier.spawn_booking_event(
                renter.email,
                subject.to_string(),
                format!(
                    "Your booking for {} is now '{}'",
                    vehicle.name,
                    booking.status.as_str()
                ),
            );
        }
    }
}
