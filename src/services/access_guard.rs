//! Guard de acceso sobre reservas
//!
//! Predicados puros sobre entidades ya cargadas: quién es arrendatario,
//! quién es propietario y qué puede mutar cada uno. Sin efectos.

use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Rol del actor frente a una reserva concreta
#[derive(Debug, Clone, Copy)]
pub struct BookingAccess {
    pub is_renter: bool,
    pub is_owner: bool,
}

impl BookingAccess {
    pub fn is_participant(&self) -> bool {
        self.is_renter || self.is_owner
    }
}

/// Calcular el rol del actor sobre una reserva
pub fn booking_access(actor_id: Uuid, renter_id: Uuid, vehicle_owner_id: Uuid) -> BookingAccess {
    BookingAccess {
        is_renter: actor_id == renter_id,
        is_owner: actor_id == vehicle_owner_id,
    }
}

/// Rechazar la creación cuando el arrendatario es el propietario del
/// vehículo, sin importar el estado de capacidad.
pub fn ensure_not_self_rental(vehicle_owner_id: Uuid, renter_id: Uuid) -> AppResult<()> {
    if vehicle_owner_id == renter_id {
        return Err(AppError::SelfRental(
            "You cannot rent your own vehicle".to_string(),
        ));
    }
    Ok(())
}

/// Solo arrendatario o propietario pueden ver/mutar la reserva
pub fn ensure_participant(access: &BookingAccess, action: &str) -> AppResult<()> {
    if !access.is_participant() {
        return Err(AppError::Forbidden(format!(
            "Not authorized to {} this booking",
            action
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_computed_from_ids() {
        let renter = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let as_renter = booking_access(renter, renter, owner);
        assert!(as_renter.is_renter && !as_renter.is_owner);
        assert!(as_renter.is_participant());

        let as_owner = booking_access(owner, renter, owner);
        assert!(as_owner.is_owner && !as_owner.is_renter);

        let as_stranger = booking_access(stranger, renter, owner);
        assert!(!as_stranger.is_participant());
        assert!(ensure_participant(&as_stranger, "view").is_err());
    }

    #[test]
    fn test_self_rental_always_rejected() {
        let user = Uuid::new_v4();
        assert!(matches!(
            ensure_not_self_rental(user, user),
            Err(AppError::SelfRental(_))
        ));
        assert!(ensure_not_self_rental(user, Uuid::new_v4()).is_ok());
    }
}
