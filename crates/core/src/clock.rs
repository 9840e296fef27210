//! Business clock. Every date/time in the system is a naive wall-clock value
//! in one configured timezone; "now" must come from the same zone.

use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::errors::{BookingError, BookingResult};

pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_name(name: &str) -> BookingResult<Self> {
        let tz = Tz::from_str(name).map_err(|e| {
            BookingError::Validation(format!("Unknown timezone '{}': {}", name, e))
        })?;
        Ok(Self::new(tz))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Paris)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
