//! # Booking Engine
//!
//! Transactional services built on the repositories:
//!
//! - [`overlap`]: the OverlapResolver, locking and flipping intersecting slots
//! - [`ledger`]: the PointLedger, debit/credit/adjust on user balances
//! - [`slots`]: slot generation, listing, availability and deletion
//! - [`manager`]: the ReservationManager, create and cancel orchestration
//!
//! Every decision that feeds a write is read inside the transaction that
//! performs the write. Nothing is cached between requests.

pub mod ledger;
pub mod manager;
pub mod overlap;
pub mod slots;

use std::{sync::Arc, time::Duration};

use chrono::NaiveDateTime;
use coachslot_core::{clock::Clock, errors::BookingResult};
use sqlx::PgPool;

use crate::transaction::{begin_bounded, Tx};

pub use ledger::PointLedger;
pub use manager::ReservationManager;
pub use slots::SlotService;

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(3);

/// What every engine service needs: the pool, the business clock and the
/// lock wait bound applied to each transaction.
#[derive(Clone)]
pub struct EngineContext {
    pub pool: PgPool,
    pub clock: Arc<dyn Clock>,
    pub lock_timeout: Duration,
}

impl EngineContext {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>, lock_timeout: Duration) -> Self {
        Self {
            pool,
            clock,
            lock_timeout,
        }
    }

    pub async fn begin(&self) -> BookingResult<Tx> {
        begin_bounded(&self.pool, self.lock_timeout).await
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}
