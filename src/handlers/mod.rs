pub mod bookings;
pub mod providers;
