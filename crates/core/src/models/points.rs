use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

/// Number of points a paid session costs, and the amount refunded on a
/// successful cancellation.
pub const SESSION_COST: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    Solo,
    Team,
}

impl PointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointType::Solo => "solo",
            PointType::Team => "team",
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point balances of one user. `points` mirrors `solo_points + team_points`
/// for older clients that only read the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointBalance {
    pub solo_points: i32,
    pub team_points: i32,
    pub points: i32,
}

impl PointBalance {
    pub fn new(solo_points: i32, team_points: i32) -> Self {
        Self {
            solo_points,
            team_points,
            points: solo_points + team_points,
        }
    }

    pub fn get(&self, point_type: PointType) -> i32 {
        match point_type {
            PointType::Solo => self.solo_points,
            PointType::Team => self.team_points,
        }
    }

    fn with(self, point_type: PointType, value: i32) -> Self {
        match point_type {
            PointType::Solo => Self::new(value, self.team_points),
            PointType::Team => Self::new(self.solo_points, value),
        }
    }

    /// Removes `amount` points of one type, failing closed when the balance
    /// would go negative.
    pub fn debit(self, point_type: PointType, amount: i32) -> BookingResult<Self> {
        if amount < 0 {
            return Err(BookingError::Validation(
                "Debit amount must not be negative".to_string(),
            ));
        }
        let balance = self.get(point_type);
        if balance < amount {
            return Err(BookingError::InsufficientPoints {
                point_type,
                balance,
                required: amount,
            });
        }
        Ok(self.with(point_type, balance - amount))
    }

    pub fn credit(self, point_type: PointType, amount: i32) -> BookingResult<Self> {
        if amount < 0 {
            return Err(BookingError::Validation(
                "Credit amount must not be negative".to_string(),
            ));
        }
        let value = self
            .get(point_type)
            .checked_add(amount)
            .filter(|v| v.checked_add(self.get(other(point_type))).is_some())
            .ok_or_else(|| BookingError::Validation("Point balance overflow".to_string()))?;
        Ok(self.with(point_type, value))
    }

    /// Applies an administrative patch. Fails when the resulting total no
    /// longer fits the stored column.
    pub fn apply(self, patch: &PointsPatch) -> BookingResult<Self> {
        let solo = patch
            .solo
            .map_or(self.solo_points, |adj| adj.apply(self.solo_points));
        let team = patch
            .team
            .map_or(self.team_points, |adj| adj.apply(self.team_points));
        solo.checked_add(team)
            .map(|points| Self {
                solo_points: solo,
                team_points: team,
                points,
            })
            .ok_or_else(|| BookingError::Validation("Point balance overflow".to_string()))
    }

    pub fn is_consistent(&self) -> bool {
        self.solo_points >= 0
            && self.team_points >= 0
            && self.points == self.solo_points + self.team_points
    }
}

fn other(point_type: PointType) -> PointType {
    match point_type {
        PointType::Solo => PointType::Team,
        PointType::Team => PointType::Solo,
    }
}

/// Administrative change to one balance. Never drives a balance below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Add(i32),
    Remove(i32),
    Set(i32),
}

impl Adjustment {
    pub fn apply(&self, current: i32) -> i32 {
        match *self {
            Adjustment::Add(n) => current.saturating_add(n).max(0),
            Adjustment::Remove(n) => current.saturating_sub(n).max(0),
            Adjustment::Set(n) => n.max(0),
        }
    }

    fn amount(&self) -> i32 {
        match *self {
            Adjustment::Add(n) | Adjustment::Remove(n) | Adjustment::Set(n) => n,
        }
    }
}

/// Explicit set of balance changes an admin can request in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsPatch {
    pub solo: Option<Adjustment>,
    pub team: Option<Adjustment>,
}

impl PointsPatch {
    pub fn validate(&self) -> BookingResult<()> {
        if self.solo.is_none() && self.team.is_none() {
            return Err(BookingError::Validation(
                "Points patch must change at least one balance".to_string(),
            ));
        }
        if [self.solo, self.team]
            .iter()
            .flatten()
            .any(|adj| adj.amount() < 0)
        {
            return Err(BookingError::Validation(
                "Point adjustments must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
