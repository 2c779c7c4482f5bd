//! Settlement de reservas completadas
//!
//! Al completar una reserva se acredita el total al propietario y, si el
//! feedback trae rating, se recalcula el agregado del vehículo. El guard
//! "estado previo != completed" en el motor de ciclo de vida hace que el
//! settlement se aplique exactamente una vez por reserva.

use rust_decimal::Decimal;

/// Efectos de settlement de una transición a `completed`
#[derive(Debug, Clone)]
pub struct SettlementAction {
    pub earnings_credit: Decimal,
    pub rating_push: Option<i32>,
}

/// Agregado de rating de un vehículo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub rating_sum: Decimal,
    pub rating_count: i32,
    pub rating: Decimal,
}

/// Incorporar un rating nuevo al agregado: `rating = sum / count`
pub fn push_rating(rating_sum: Decimal, rating_count: i32, new_rating: i32) -> RatingAggregate {
    let rating_sum = rating_sum + Decimal::from(new_rating);
    let rating_count = rating_count + 1;
    let rating = (rating_sum / Decimal::from(rating_count)).round_dp(2);

    RatingAggregate {
        rating_sum,
        rating_count,
        rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_mean_recomputation() {
        // Vehículo con rating previo 5 y reviews [5]; llega un 4 → 4.5
        let aggregate = push_rating(Decimal::from(5), 1, 4);
        assert_eq!(aggregate.rating_sum, Decimal::from(9));
        assert_eq!(aggregate.rating_count, 2);
        assert_eq!(aggregate.rating, Decimal::new(45, 1));
    }

    #[test]
    fn test_first_rating_becomes_the_mean() {
        let aggregate = push_rating(Decimal::ZERO, 0, 3);
        assert_eq!(aggregate.rating_count, 1);
        assert_eq!(aggregate.rating, Decimal::from(3));
    }

    #[test]
    fn test_mean_is_rounded_to_two_decimals() {
        let aggregate = push_rating(Decimal::from(5), 2, 5);
        // 10 / 3 = 3.33
        assert_eq!(aggregate.rating, Decimal::new(333, 2));
    }
}
