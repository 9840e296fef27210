pub mod points;
pub mod reservations;
pub mod slots;
