//! # CoachSlot Core
//!
//! Pure domain logic for the coaching-session booking engine: slot models and
//! their status machine, slot generation, interval overlap planning, the
//! cancellation policy, point arithmetic and the notifier interface.
//!
//! Nothing in this crate performs I/O. Persistence lives in `coachslot-db`,
//! which feeds rows into the planners defined here.

pub mod clock;
pub mod errors;
pub mod generator;
pub mod models;
pub mod notify;
pub mod overlap;
pub mod policy;
