use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult, ErrorKind},
    models::{
        points::{PointBalance, PointType, SESSION_COST},
        time_slot::SessionType,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(BookingError::Validation(format!(
                "Unknown reservation status '{}'",
                other
            ))),
        }
    }
}

/// Individual bookings spend solo points, group bookings spend team points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    Individual,
    Group,
}

impl ReservationType {
    pub fn point_type(&self) -> PointType {
        match self {
            ReservationType::Individual => PointType::Solo,
            ReservationType::Group => PointType::Team,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationType::Individual => "individual",
            ReservationType::Group => "group",
        }
    }
}

impl FromStr for ReservationType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(ReservationType::Individual),
            "group" => Ok(ReservationType::Group),
            other => Err(BookingError::Validation(format!(
                "Invalid reservation type '{}', expected 'individual' or 'group'",
                other
            ))),
        }
    }
}

/// Who acts on a reservation. Also recorded as `cancelled_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Client,
    Admin,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Client => "client",
            ActorRole::Admin => "admin",
            ActorRole::System => "system",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::System)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(ActorRole::Client),
            "admin" => Ok(ActorRole::Admin),
            "system" => Ok(ActorRole::System),
            other => Err(BookingError::Validation(format!(
                "Unknown actor role '{}'",
                other
            ))),
        }
    }
}

/// Caller identity as handed over by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub role: ActorRole,
}

impl Actor {
    pub fn client(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Client,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Admin,
        }
    }

    pub fn system() -> Self {
        Self {
            user_id: None,
            role: ActorRole::System,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub coach_id: i64,
    pub user_id: Option<i64>,
    pub guest: Option<GuestDetails>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: SessionType,
    pub reservation_type: ReservationType,
    pub status: ReservationStatus,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<ActorRole>,
}

impl Reservation {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}

/// Inbound booking request. Enumerations arrive as strings so that a bad
/// value surfaces as a validation error rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub coach_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: String,
    pub reservation_type: Option<String>,
    pub user_id: Option<i64>,
    pub guest: Option<GuestDetails>,
}

/// Who the reservation is for once the request has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Booker {
    Member(i64),
    Guest(GuestDetails),
}

impl Booker {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Booker::Member(id) => Some(*id),
            Booker::Guest(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub coach_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: SessionType,
    pub reservation_type: ReservationType,
    pub booker: Booker,
}

impl ValidatedBooking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Points to debit for this booking; `None` for free sessions.
    pub fn cost(&self) -> Option<(PointType, i32)> {
        if self.session_type.is_free() {
            None
        } else {
            Some((self.reservation_type.point_type(), SESSION_COST))
        }
    }
}

impl CreateReservationRequest {
    /// Checks everything that can be decided without touching storage.
    pub fn validate(&self, now: NaiveDateTime) -> BookingResult<ValidatedBooking> {
        if self.coach_id <= 0 {
            return Err(BookingError::Validation("coach_id is required".to_string()));
        }
        let session_type: SessionType = self.session_type.parse()?;
        let reservation_type = match &self.reservation_type {
            Some(value) => value.parse()?,
            None => ReservationType::Individual,
        };

        if self.date.and_time(self.time) < now {
            return Err(BookingError::Validation(format!(
                "Cannot book a session in the past ({} {})",
                self.date, self.time
            )));
        }

        let booker = match (self.user_id, &self.guest) {
            (Some(_), Some(_)) => {
                return Err(BookingError::Validation(
                    "Provide either user_id or guest details, not both".to_string(),
                ));
            }
            (Some(user_id), None) if user_id > 0 => Booker::Member(user_id),
            (Some(_), None) => {
                return Err(BookingError::Validation("user_id is invalid".to_string()));
            }
            (None, Some(guest)) => {
                validate_guest(guest)?;
                if !session_type.is_free() {
                    return Err(BookingError::Validation(
                        "Guests can only book free sessions".to_string(),
                    ));
                }
                Booker::Guest(guest.clone())
            }
            (None, None) => {
                return Err(BookingError::Validation(
                    "Either user_id or guest details are required".to_string(),
                ));
            }
        };

        Ok(ValidatedBooking {
            coach_id: self.coach_id,
            date: self.date,
            time: self.time,
            session_type,
            reservation_type,
            booker,
        })
    }
}

fn validate_guest(guest: &GuestDetails) -> BookingResult<()> {
    if guest.name.trim().is_empty() {
        return Err(BookingError::Validation("Guest name is required".to_string()));
    }
    let email = guest.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(BookingError::Validation(
            "Guest email is missing or invalid".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationReceipt {
    pub reservation_id: Uuid,
    pub coach_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: SessionType,
    pub slots_blocked: u64,
    pub remaining_points: Option<i32>,
    pub remaining_solo_points: Option<i32>,
    pub remaining_team_points: Option<i32>,
}

impl ReservationReceipt {
    pub fn with_balance(mut self, balance: Option<PointBalance>) -> Self {
        self.remaining_points = balance.map(|b| b.points);
        self.remaining_solo_points = balance.map(|b| b.solo_points);
        self.remaining_team_points = balance.map(|b| b.team_points);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub reservation_id: Uuid,
    pub refunded: bool,
    pub refunded_point_type: Option<PointType>,
    pub slots_freed: u64,
    pub balance: Option<PointBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReservationItem {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReservationRequest {
    pub coach_id: i64,
    pub user_id: i64,
    pub reservation_type: Option<String>,
    pub items: Vec<BulkReservationItem>,
}

impl BulkReservationRequest {
    pub fn requests(&self) -> impl Iterator<Item = CreateReservationRequest> + '_ {
        self.items.iter().map(|item| CreateReservationRequest {
            coach_id: self.coach_id,
            date: item.date,
            time: item.time,
            session_type: item.session_type.clone(),
            reservation_type: self.reservation_type.clone(),
            user_id: Some(self.user_id),
            guest: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBooking {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: String,
    pub code: ErrorKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReservationReport {
    pub created: Vec<ReservationReceipt>,
    pub skipped: Vec<SkippedBooking>,
    /// Set when the client ran out of points and the remaining items were
    /// not attempted.
    pub stopped_early: bool,
}

/// Progress of a create/cancel request through the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Requested,
    Validated,
    Committed,
    Rejected,
    Failed,
}

impl RequestState {
    pub fn from_error(err: &BookingError) -> Self {
        match err.kind() {
            ErrorKind::StorageFailure | ErrorKind::Internal => RequestState::Failed,
            _ => RequestState::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Requested => "requested",
            RequestState::Validated => "validated",
            RequestState::Committed => "committed",
            RequestState::Rejected => "rejected",
            RequestState::Failed => "failed",
        }
    }
}
