pub mod access_guard;
pub mod booking_lifecycle;
pub mod jwt_service;
pub mod notification_service;
pub mod settlement;
