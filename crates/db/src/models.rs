use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use coachslot_core::{
    errors::BookingError,
    models::{
        points::PointBalance,
        reservation::{GuestDetails, Reservation},
        time_slot::{SessionType, TimeSlot},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeSlot {
    pub id: Uuid,
    pub coach_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub session_type: String,
    pub duration_minutes: i32,
    pub status: String,
    pub is_free: bool,
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A slot together with the start and type of the reservation holding it.
#[derive(Debug, Clone, FromRow)]
pub struct DbSlotListing {
    #[sqlx(flatten)]
    pub slot: DbTimeSlot,
    pub holder_time: Option<NaiveTime>,
    pub holder_session_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReservation {
    pub id: Uuid,
    pub coach_id: i64,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub session_type: String,
    pub reservation_type: String,
    pub status: String,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUserPoints {
    pub id: i64,
    pub solo_points: i32,
    pub team_points: i32,
    pub points: i32,
}

impl TryFrom<DbTimeSlot> for TimeSlot {
    type Error = BookingError;

    fn try_from(row: DbTimeSlot) -> Result<Self, Self::Error> {
        Ok(TimeSlot {
            id: row.id,
            coach_id: row.coach_id,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            session_type: row.session_type.parse()?,
            duration_minutes: row.duration_minutes,
            status: row.status.parse()?,
            is_free: row.is_free,
            reservation_id: row.reservation_id,
            created_at: row.created_at,
        })
    }
}

impl DbSlotListing {
    pub fn holder(&self) -> Result<Option<(NaiveTime, SessionType)>, BookingError> {
        match (self.holder_time, &self.holder_session_type) {
            (Some(time), Some(session_type)) => Ok(Some((time, session_type.parse()?))),
            _ => Ok(None),
        }
    }
}

impl TryFrom<DbReservation> for Reservation {
    type Error = BookingError;

    fn try_from(row: DbReservation) -> Result<Self, Self::Error> {
        let guest = match (row.guest_name, row.guest_email) {
            (Some(name), Some(email)) => Some(GuestDetails {
                name,
                email,
                phone: row.guest_phone,
            }),
            _ => None,
        };

        Ok(Reservation {
            id: row.id,
            coach_id: row.coach_id,
            user_id: row.user_id,
            guest,
            date: row.date,
            time: row.time,
            session_type: row.session_type.parse()?,
            reservation_type: row.reservation_type.parse()?,
            status: row.status.parse()?,
            is_free: row.is_free,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
            cancelled_by: row.cancelled_by.as_deref().map(str::parse).transpose()?,
        })
    }
}

impl From<DbUserPoints> for PointBalance {
    fn from(row: DbUserPoints) -> Self {
        PointBalance {
            solo_points: row.solo_points,
            team_points: row.team_points,
            points: row.points,
        }
    }
}
