use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::catalog::NewFilm;

/// A star rating from 0.5 to 5.0 in half-star steps, stored as half-steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "f64")]
pub struct Rating(u8);

#[derive(Debug, Error, PartialEq)]
#[error("rating must be between 0.5 and 5.0 in steps of 0.5, got {0}")]
pub struct RatingError(pub f64);

impl Rating {
    pub fn half_steps(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 {
            return Err(RatingError(value));
        }
        if !(1.0..=10.0).contains(&doubled) {
            return Err(RatingError(value));
        }
        Ok(Rating(doubled as u8))
    }
}

impl From<Rating> for f64 {
    fn from(r: Rating) -> Self {
        r.as_f64()
    }
}

/// A validated review, ready to be stored.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub film: NewFilm,
    pub rating: Rating,
    pub content: Option<String>,
    pub watched_date: Option<Date>,
    pub has_spoilers: bool,
    pub is_rewatch: bool,
}

/// Review joined with its author's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub rating: f64,
    pub content: Option<String>,
    pub watched_date: Option<Date>,
    pub has_spoilers: bool,
    pub is_rewatch: bool,
    pub created_at: OffsetDateTime,
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}
