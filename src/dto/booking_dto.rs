//! DTOs de Bookings

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{Booking, BookingStatus, Feedback, PaymentStatus};

// Request de creación de reserva
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,

    /// Duración en horas
    #[validate(range(min = 1))]
    pub duration: i64,

    #[validate(length(min = 1, max = 50))]
    pub pickup_location: String,

    /// Inicio de la reserva; ahora si se omite
    pub start_time: Option<DateTime<Utc>>,

    /// Solo para vehículos en modo compartido
    #[validate(range(min = 1))]
    pub seats_requested: Option<i32>,

    pub phone: Option<String>,
    pub reg_no: Option<String>,
}

// Request de actualización (estado, pago, feedback)
#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub feedback: Option<FeedbackInput>,
}

// Feedback del arrendatario
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackInput {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl From<FeedbackInput> for Feedback {
    fn from(input: FeedbackInput) -> Self {
        Self {
            rating: input.rating,
            comment: input.comment,
        }
    }
}

// Query del listado: rol del actor sobre las reservas
#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub role: Option<String>,
}

// Response de reserva
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub renter_id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_phone: String,
    pub renter_reg_no: String,
    pub pickup_location: String,
    pub duration: i64,
    pub seats_booked: i32,
    pub total_cost: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub booking_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let feedback = if booking.feedback_rating.is_some() || booking.feedback_comment.is_some() {
            Some(Feedback {
                rating: booking.feedback_rating,
                comment: booking.feedback_comment.clone(),
            })
        } else {
            None
        };

        Self {
            id: booking.id,
            renter_id: booking.renter_id,
            vehicle_id: booking.vehicle_id,
            renter_phone: booking.renter_phone,
            renter_reg_no: booking.renter_reg_no,
            pickup_location: booking.pickup_location,
            duration: booking.duration_hours,
            seats_booked: booking.seats_booked,
            total_cost: booking.total_cost,
            status: booking.status,
            payment_status: booking.payment_status,
            booking_date: booking.booking_date,
            return_date: booking.return_date,
            feedback,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}
