pub mod points;
pub mod reservation;
pub mod time_slot;
