//! # Cancellation Policy
//!
//! Decides whether a reservation may be cancelled and what gets refunded.
//! Both decisions are pure so they can be evaluated inside the transaction
//! that performs the cancellation.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{BookingResult, PolicyRejection},
    models::{
        points::{PointType, SESSION_COST},
        reservation::{ActorRole, ReservationType},
        time_slot::SessionType,
    },
};

pub const DEFAULT_CUTOFF_HOURS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancellationDecision {
    pub allowed: bool,
    pub reason: Option<PolicyRejection>,
}

impl CancellationDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn reject(reason: PolicyRejection) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn into_result(self) -> BookingResult<()> {
        match self.reason {
            Some(reason) if !self.allowed => Err(reason.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub point_type: PointType,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    /// Minimum lead time a client needs to cancel on their own.
    pub cutoff: Duration,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            cutoff: Duration::hours(DEFAULT_CUTOFF_HOURS),
        }
    }
}

impl CancellationPolicy {
    pub fn with_cutoff_hours(hours: i64) -> Self {
        Self {
            cutoff: Duration::hours(hours),
        }
    }

    /// Sessions that already started can never be cancelled. Clients also need
    /// strictly more than the cutoff as lead time; admins and the system do
    /// not.
    pub fn can_cancel(
        &self,
        actor: ActorRole,
        session_at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> CancellationDecision {
        if session_at < now {
            return CancellationDecision::reject(PolicyRejection::PastSession);
        }
        if actor.is_admin() {
            return CancellationDecision::allow();
        }
        if session_at - now <= self.cutoff {
            return CancellationDecision::reject(PolicyRejection::WithinCutoffWindow);
        }
        CancellationDecision::allow()
    }

    /// Only paid sessions are refunded, in the currency they were paid with.
    pub fn refund_for(
        &self,
        session_type: SessionType,
        reservation_type: ReservationType,
    ) -> Option<Refund> {
        if session_type.is_free() {
            return None;
        }
        Some(Refund {
            point_type: reservation_type.point_type(),
            amount: SESSION_COST,
        })
    }
}
