//! Motor del ciclo de vida de reservas
//!
//! Este módulo concentra las decisiones del ciclo de vida: reclamo y
//! liberación de capacidad, máquina de estados y planificación de
//! transiciones. Las funciones son puras sobre snapshots ya cargados;
//! los repositorios aplican el resultado con un CAS sobre la columna
//! `version` del vehículo, así el check y el write son un solo paso
//! indivisible frente a reservas concurrentes.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::booking::{Booking, BookingStatus, Feedback, PaymentStatus};
use crate::models::vehicle::RentalMode;
use crate::services::access_guard::BookingAccess;
use crate::services::settlement::SettlementAction;
use crate::utils::errors::{AppError, AppResult};

/// Resultado de reclamar capacidad para una reserva nueva
#[derive(Debug, Clone)]
pub struct CapacityClaim {
    pub updated_mode: RentalMode,
    pub seats_booked: i32,
    pub total_cost: Decimal,
}

/// Campos de actualización de una reserva existente
#[derive(Debug, Clone)]
pub struct BookingUpdate {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub feedback: Option<Feedback>,
}

/// Plan de transición: qué escribir en la reserva, el ledger y el settlement.
/// Se aplica entero en una transacción o no se aplica.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub feedback: Option<Feedback>,
    pub updated_mode: Option<RentalMode>,
    pub settlement: Option<SettlementAction>,
}

/// Reclamar capacidad del vehículo para una reserva nueva.
///
/// FullRental consume toda la capacidad; SeatShared descuenta `n` asientos
/// y deja el vehículo no disponible al llegar a cero.
pub fn claim_capacity(
    mode: &RentalMode,
    duration_hours: i64,
    seats_requested: Option<i32>,
) -> AppResult<CapacityClaim> {
    match mode {
        RentalMode::FullRental {
            available,
            price_per_hour,
        } => {
            if !available {
                return Err(AppError::CapacityExceeded(
                    "Vehicle is already booked".to_string(),
                ));
            }
            Ok(CapacityClaim {
                updated_mode: RentalMode::FullRental {
                    available: false,
                    price_per_hour: *price_per_hour,
                },
                seats_booked: 1,
                total_cost: *price_per_hour * Decimal::from(duration_hours),
            })
        }
        RentalMode::SeatShared {
            seats_available,
            seat_capacity,
            price_per_seat,
        } => {
            let requested = seats_requested.unwrap_or(1);
            if requested < 1 {
                return Err(AppError::BadRequest(
                    "At least one seat must be requested".to_string(),
                ));
            }
            if requested > *seats_available {
                return Err(AppError::CapacityExceeded(format!(
                    "Only {} seats available",
                    seats_available
                )));
            }
            Ok(CapacityClaim {
                updated_mode: RentalMode::SeatShared {
                    seats_available: seats_available - requested,
                    seat_capacity: *seat_capacity,
                    price_per_seat: *price_per_seat,
                },
                seats_booked: requested,
                total_cost: *price_per_seat * Decimal::from(requested),
            })
        }
    }
}

/// Devolver capacidad al ledger al cancelar o completar una reserva.
/// En modo compartido el resultado se recorta a `seat_capacity`.
pub fn release_capacity(mode: &RentalMode, seats_booked: i32) -> RentalMode {
    match mode {
        RentalMode::FullRental { price_per_hour, .. } => RentalMode::FullRental {
            available: true,
            price_per_hour: *price_per_hour,
        },
        RentalMode::SeatShared {
            seats_available,
            seat_capacity,
            price_per_seat,
        } => RentalMode::SeatShared {
            seats_available: (*seats_available + seats_booked).min(*seat_capacity),
            seat_capacity: *seat_capacity,
            price_per_seat: *price_per_seat,
        },
    }
}

/// Fecha de devolución a partir del inicio y la duración en horas
pub fn return_date(booking_date: DateTime<Utc>, duration_hours: i64) -> DateTime<Utc> {
    booking_date + Duration::hours(duration_hours)
}

fn rank(status: BookingStatus) -> u8 {
    match status {
        BookingStatus::Pending => 0,
        BookingStatus::Confirmed => 1,
        BookingStatus::InProgress => 2,
        BookingStatus::Completed => 3,
        // Cancelled queda fuera del orden lineal
        BookingStatus::Cancelled => u8::MAX,
    }
}

/// Validar una transición de estado.
///
/// La máquina avanza `pending → confirmed → in-progress → completed`;
/// `cancelled` solo es alcanzable desde `pending` o `confirmed`. Las
/// transiciones al mismo estado son no-ops aceptadas, que es lo que hace
/// idempotente re-completar una reserva ya completada.
pub fn validate_transition(from: BookingStatus, to: BookingStatus) -> AppResult<()> {
    if from == to {
        return Ok(());
    }

    if to == BookingStatus::Cancelled {
        return match from {
            BookingStatus::Pending | BookingStatus::Confirmed => Ok(()),
            _ => Err(AppError::InvalidState(format!(
                "Cannot cancel a booking in status '{}'",
                from.as_str()
            ))),
        };
    }

    if from == BookingStatus::Cancelled || rank(to) <= rank(from) {
        return Err(AppError::InvalidState(format!(
            "Cannot transition booking from '{}' to '{}'",
            from.as_str(),
            to.as_str()
        )));
    }

    Ok(())
}

/// Planificar la actualización de una reserva (PUT genérico).
///
/// Completar una reserva dispara el settlement (una sola vez, el guard de
/// estado previo lo garantiza) y reabre la capacidad; cancelar solo
/// devuelve capacidad. El estado de pago se aplica sin condiciones una vez
/// pasada la autorización.
pub fn plan_update(
    booking: &Booking,
    vehicle_mode: &RentalMode,
    access: &BookingAccess,
    update: &BookingUpdate,
) -> AppResult<TransitionPlan> {
    if !access.is_participant() {
        return Err(AppError::Forbidden(
            "Not authorized to update this booking".to_string(),
        ));
    }

    if update.feedback.is_some() && !access.is_renter {
        return Err(AppError::Forbidden(
            "Only the renter may submit feedback".to_string(),
        ));
    }

    if let Some(feedback) = &update.feedback {
        if let Some(rating) = feedback.rating {
            if !(0..=5).contains(&rating) {
                return Err(AppError::BadRequest(
                    "Feedback rating must be between 0 and 5".to_string(),
                ));
            }
        }
    }

    let new_status = update.status.unwrap_or(booking.status);
    validate_transition(booking.status, new_status)?;

    let mut plan = TransitionPlan {
        status: new_status,
        payment_status: update.payment_status.unwrap_or(booking.payment_status),
        feedback: update.feedback.clone(),
        updated_mode: None,
        settlement: None,
    };

    let completing =
        new_status == BookingStatus::Completed && booking.status != BookingStatus::Completed;
    let cancelling =
        new_status == BookingStatus::Cancelled && booking.status != BookingStatus::Cancelled;

    if completing {
        plan.updated_mode = Some(release_capacity(vehicle_mode, booking.seats_booked));
        plan.settlement = Some(SettlementAction {
            earnings_credit: booking.total_cost,
            rating_push: plan.feedback.as_ref().and_then(|f| f.rating),
        });
    } else if cancelling {
        plan.updated_mode = Some(release_capacity(vehicle_mode, booking.seats_booked));
    }

    Ok(plan)
}

/// Planificar la cancelación explícita (DELETE): solo el arrendatario,
/// solo desde `pending` o `confirmed`.
pub fn plan_cancellation(
    booking: &Booking,
    vehicle_mode: &RentalMode,
    access: &BookingAccess,
) -> AppResult<TransitionPlan> {
    if !access.is_renter {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this booking".to_string(),
        ));
    }

    if !matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Confirmed
    ) {
        return Err(AppError::InvalidState(
            "Can only cancel pending or confirmed bookings".to_string(),
        ));
    }

    Ok(TransitionPlan {
        status: BookingStatus::Cancelled,
        payment_status: booking.payment_status,
        feedback: None,
        updated_mode: Some(release_capacity(vehicle_mode, booking.seats_booked)),
        settlement: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::SEAT_CAPACITY;
    use uuid::Uuid;

    fn full_rental(available: bool) -> RentalMode {
        RentalMode::FullRental {
            available,
            price_per_hour: Decimal::from(10),
        }
    }

    fn seat_shared(seats_available: i32) -> RentalMode {
        RentalMode::SeatShared {
            seats_available,
            seat_capacity: SEAT_CAPACITY,
            price_per_seat: Decimal::from(5),
        }
    }

    fn booking_with(status: BookingStatus, seats_booked: i32) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            renter_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            renter_phone: String::new(),
            renter_reg_no: String::new(),
            pickup_location: "FME".to_string(),
            duration_hours: 3,
            seats_booked,
            total_cost: Decimal::from(30),
            status,
            payment_status: PaymentStatus::Unpaid,
            booking_date: now,
            return_date: return_date(now, 3),
            feedback_rating: None,
            feedback_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn renter() -> BookingAccess {
        BookingAccess {
            is_renter: true,
            is_owner: false,
        }
    }

    fn owner() -> BookingAccess {
        BookingAccess {
            is_renter: false,
            is_owner: true,
        }
    }

    fn stranger() -> BookingAccess {
        BookingAccess {
            is_renter: false,
            is_owner: false,
        }
    }

    fn seats_of(mode: &RentalMode) -> i32 {
        match mode {
            RentalMode::SeatShared { seats_available, .. } => *seats_available,
            RentalMode::FullRental { .. } => panic!("not a shared vehicle"),
        }
    }

    #[test]
    fn test_full_rental_claim_computes_hourly_cost() {
        let claim = claim_capacity(&full_rental(true), 6, None).unwrap();
        assert_eq!(claim.seats_booked, 1);
        assert_eq!(claim.total_cost, Decimal::from(60));
        assert!(!claim.updated_mode.has_capacity());
    }

    #[test]
    fn test_full_rental_rejects_second_booking() {
        let claim = claim_capacity(&full_rental(true), 2, None).unwrap();
        let second = claim_capacity(&claim.updated_mode, 2, None);
        assert!(matches!(second, Err(AppError::CapacityExceeded(_))));
    }

    #[test]
    fn test_seat_shared_claim_defaults_to_one_seat() {
        let claim = claim_capacity(&seat_shared(4), 2, None).unwrap();
        assert_eq!(claim.seats_booked, 1);
        assert_eq!(claim.total_cost, Decimal::from(5));
        assert_eq!(seats_of(&claim.updated_mode), 3);
    }

    #[test]
    fn test_seat_shared_per_seat_cost() {
        let claim = claim_capacity(&seat_shared(4), 2, Some(3)).unwrap();
        assert_eq!(claim.seats_booked, 3);
        assert_eq!(claim.total_cost, Decimal::from(15));
        assert_eq!(seats_of(&claim.updated_mode), 1);
    }

    #[test]
    fn test_last_seat_closes_the_vehicle() {
        let claim = claim_capacity(&seat_shared(1), 2, Some(1)).unwrap();
        assert_eq!(seats_of(&claim.updated_mode), 0);
        assert!(!claim.updated_mode.has_capacity());
        assert!(!claim.updated_mode.columns().fully_available);
    }

    #[test]
    fn test_seat_shared_rejects_over_request() {
        let result = claim_capacity(&seat_shared(2), 2, Some(3));
        assert!(matches!(result, Err(AppError::CapacityExceeded(_))));
    }

    #[test]
    fn test_seat_shared_rejects_non_positive_request() {
        assert!(matches!(
            claim_capacity(&seat_shared(4), 2, Some(0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            claim_capacity(&seat_shared(4), 2, Some(-2)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_release_restores_seats_with_clamp() {
        // Reservar 2 de 4 y cancelar vuelve a 4, nunca por encima de la capacidad
        let claim = claim_capacity(&seat_shared(4), 2, Some(2)).unwrap();
        let restored = release_capacity(&claim.updated_mode, 2);
        assert_eq!(seats_of(&restored), 4);

        let over_released = release_capacity(&restored, 3);
        assert_eq!(seats_of(&over_released), SEAT_CAPACITY);
    }

    #[test]
    fn test_release_reopens_full_rental() {
        let restored = release_capacity(&full_rental(false), 1);
        assert!(restored.has_capacity());
    }

    #[test]
    fn test_seat_conservation_over_claim_release_sequence() {
        // seats_available == capacidad - asientos retenidos por reservas abiertas
        let mut mode = seat_shared(SEAT_CAPACITY);
        let mut held = 0;

        for seats in [1, 2, 1] {
            let claim = claim_capacity(&mode, 1, Some(seats)).unwrap();
            held += claim.seats_booked;
            mode = claim.updated_mode;
            assert_eq!(seats_of(&mode), SEAT_CAPACITY - held);
            assert!(seats_of(&mode) >= 0 && seats_of(&mode) <= SEAT_CAPACITY);
        }

        for seats in [1, 2, 1] {
            mode = release_capacity(&mode, seats);
            held -= seats;
            assert_eq!(seats_of(&mode), SEAT_CAPACITY - held);
        }
        assert_eq!(seats_of(&mode), SEAT_CAPACITY);
    }

    #[test]
    fn test_state_machine_forward_chain() {
        use BookingStatus::*;
        assert!(validate_transition(Pending, Confirmed).is_ok());
        assert!(validate_transition(Confirmed, InProgress).is_ok());
        assert!(validate_transition(InProgress, Completed).is_ok());
        assert!(validate_transition(Pending, Cancelled).is_ok());
        assert!(validate_transition(Confirmed, Cancelled).is_ok());
    }

    #[test]
    fn test_state_machine_rejects_backward_moves() {
        use BookingStatus::*;
        assert!(validate_transition(Confirmed, Pending).is_err());
        assert!(validate_transition(Completed, InProgress).is_err());
        assert!(validate_transition(Cancelled, Pending).is_err());
        assert!(validate_transition(Cancelled, Completed).is_err());
    }

    #[test]
    fn test_state_machine_rejects_late_cancellation() {
        use BookingStatus::*;
        assert!(matches!(
            validate_transition(InProgress, Cancelled),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            validate_transition(Completed, Cancelled),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_same_status_is_accepted_noop() {
        use BookingStatus::*;
        assert!(validate_transition(Completed, Completed).is_ok());
        assert!(validate_transition(Cancelled, Cancelled).is_ok());
        assert!(validate_transition(Pending, Pending).is_ok());
    }

    #[test]
    fn test_completion_settles_and_reopens_capacity() {
        let booking = booking_with(BookingStatus::InProgress, 2);
        let update = BookingUpdate {
            status: Some(BookingStatus::Completed),
            payment_status: Some(PaymentStatus::Paid),
            feedback: Some(Feedback {
                rating: Some(4),
                comment: Some("smooth ride".to_string()),
            }),
        };

        let plan = plan_update(&booking, &seat_shared(2), &renter(), &update).unwrap();
        assert_eq!(plan.status, BookingStatus::Completed);
        assert_eq!(plan.payment_status, PaymentStatus::Paid);

        let settlement = plan.settlement.expect("completion must settle");
        assert_eq!(settlement.earnings_credit, booking.total_cost);
        assert_eq!(settlement.rating_push, Some(4));

        // Los asientos de la reserva vuelven al ledger
        assert_eq!(seats_of(&plan.updated_mode.unwrap()), 4);
    }

    #[test]
    fn test_recompleting_does_not_settle_again() {
        let booking = booking_with(BookingStatus::Completed, 1);
        let update = BookingUpdate {
            status: Some(BookingStatus::Completed),
            payment_status: None,
            feedback: None,
        };

        let plan = plan_update(&booking, &seat_shared(4), &owner(), &update).unwrap();
        assert!(plan.settlement.is_none());
        assert!(plan.updated_mode.is_none());
    }

    #[test]
    fn test_completion_without_feedback_pushes_no_rating() {
        let booking = booking_with(BookingStatus::InProgress, 1);
        let update = BookingUpdate {
            status: Some(BookingStatus::Completed),
            payment_status: None,
            feedback: None,
        };

        let plan = plan_update(&booking, &full_rental(false), &owner(), &update).unwrap();
        let settlement = plan.settlement.unwrap();
        assert_eq!(settlement.rating_push, None);
        assert!(plan.updated_mode.unwrap().has_capacity());
    }

    #[test]
    fn test_feedback_from_non_renter_is_forbidden() {
        let booking = booking_with(BookingStatus::InProgress, 1);
        let update = BookingUpdate {
            status: Some(BookingStatus::Completed),
            payment_status: None,
            feedback: Some(Feedback {
                rating: Some(5),
                comment: None,
            }),
        };

        let result = plan_update(&booking, &full_rental(false), &owner(), &update);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_out_of_range_rating_rejected() {
        let booking = booking_with(BookingStatus::InProgress, 1);
        let update = BookingUpdate {
            status: Some(BookingStatus::Completed),
            payment_status: None,
            feedback: Some(Feedback {
                rating: Some(6),
                comment: None,
            }),
        };

        let result = plan_update(&booking, &full_rental(false), &renter(), &update);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_stranger_cannot_update() {
        let booking = booking_with(BookingStatus::Pending, 1);
        let update = BookingUpdate {
            status: Some(BookingStatus::Confirmed),
            payment_status: None,
            feedback: None,
        };

        let result = plan_update(&booking, &full_rental(false), &stranger(), &update);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_payment_status_applies_without_capacity_side_effects() {
        let booking = booking_with(BookingStatus::Confirmed, 1);
        let update = BookingUpdate {
            status: None,
            payment_status: Some(PaymentStatus::Paid),
            feedback: None,
        };

        let plan = plan_update(&booking, &full_rental(false), &owner(), &update).unwrap();
        assert_eq!(plan.status, BookingStatus::Confirmed);
        assert_eq!(plan.payment_status, PaymentStatus::Paid);
        assert!(plan.updated_mode.is_none());
        assert!(plan.settlement.is_none());
    }

    #[test]
    fn test_cancellation_restores_capacity() {
        let booking = booking_with(BookingStatus::Confirmed, 2);
        let plan = plan_cancellation(&booking, &seat_shared(2), &renter()).unwrap();
        assert_eq!(plan.status, BookingStatus::Cancelled);
        assert!(plan.settlement.is_none());
        assert_eq!(seats_of(&plan.updated_mode.unwrap()), 4);
    }

    #[test]
    fn test_cancellation_is_renter_only() {
        let booking = booking_with(BookingStatus::Pending, 1);
        assert!(matches!(
            plan_cancellation(&booking, &full_rental(false), &owner()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_cancellation_rejected_after_pickup() {
        for status in [BookingStatus::InProgress, BookingStatus::Completed] {
            let booking = booking_with(status, 1);
            assert!(matches!(
                plan_cancellation(&booking, &full_rental(false), &renter()),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_return_date_invariant() {
        let start = Utc::now();
        assert_eq!(return_date(start, 5), start + Duration::hours(5));
    }

    /// Ledger versionado que reproduce el protocolo CAS del repositorio:
    /// el write solo aplica si la versión leída sigue vigente.
    struct VersionedLedger {
        mode: RentalMode,
        version: i64,
    }

    impl VersionedLedger {
        fn compare_and_set(&mut self, expected_version: i64, mode: RentalMode) -> bool {
            if self.version != expected_version {
                return false;
            }
            self.mode = mode;
            self.version += 1;
            true
        }
    }

    #[test]
    fn test_concurrent_last_seat_has_exactly_one_winner() {
        let mut ledger = VersionedLedger {
            mode: seat_shared(1),
            version: 7,
        };

        // Dos requests leen el mismo snapshot con un asiento libre
        let snapshot_a = (ledger.mode.clone(), ledger.version);
        let snapshot_b = (ledger.mode.clone(), ledger.version);

        let claim_a = claim_capacity(&snapshot_a.0, 1, Some(1)).unwrap();
        let claim_b = claim_capacity(&snapshot_b.0, 1, Some(1)).unwrap();

        // Solo el primer CAS aplica; el segundo pierde la carrera
        assert!(ledger.compare_and_set(snapshot_a.1, claim_a.updated_mode));
        assert!(!ledger.compare_and_set(snapshot_b.1, claim_b.updated_mode));

        // El perdedor reintenta desde un snapshot fresco y recibe el error de capacidad
        let retry = claim_capacity(&ledger.mode, 1, Some(1));
        assert!(matches!(retry, Err(AppError::CapacityExceeded(_))));

        assert_eq!(seats_of(&ledger.mode), 0);
    }

    #[test]
    fn test_concurrent_full_rental_single_winner() {
        let mut ledger = VersionedLedger {
            mode: full_rental(true),
            version: 0,
        };

        let snapshot_a = (ledger.mode.clone(), ledger.version);
        let snapshot_b = (ledger.mode.clone(), ledger.version);

        let claim_a = claim_capacity(&snapshot_a.0, 4, None).unwrap();
        let claim_b = claim_capacity(&snapshot_b.0, 4, None).unwrap();

        assert!(ledger.compare_and_set(snapshot_a.1, claim_a.updated_mode));
        assert!(!ledger.compare_and_set(snapshot_b.1, claim_b.updated_mode));

        assert!(matches!(
            claim_capacity(&ledger.mode, 4, None),
            Err(AppError::CapacityExceeded(_))
        ));
    }

    #[test]
    fn test_concurrent_cancellations_each_restore_their_seats() {
        // Dos cancelaciones simultáneas sobre el mismo vehículo: la segunda
        // pierde el CAS, reintenta desde el estado fresco y ninguna
        // devolución se pierde.
        let mut ledger = VersionedLedger {
            mode: seat_shared(0),
            version: 3,
        };

        let snapshot_a = (ledger.mode.clone(), ledger.version);
        let snapshot_b = (ledger.mode.clone(), ledger.version);

        let restored_a = release_capacity(&snapshot_a.0, 1);
        let restored_b = release_capacity(&snapshot_b.0, 3);

        assert!(ledger.compare_and_set(snapshot_a.1, restored_a));
        assert!(!ledger.compare_and_set(snapshot_b.1, restored_b));

        // Reintento de B desde lectura fresca
        let fresh_version = ledger.version;
        let retried_b = release_capacity(&ledger.mode, 3);
        assert!(ledger.compare_and_set(fresh_version, retried_b));

        assert_eq!(seats_of(&ledger.mode), 4);
    }
}
