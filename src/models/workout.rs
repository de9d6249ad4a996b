use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::fields::{normalize_text, nullable};
use super::{FromSqliteRow, PageParams, WorkoutSet};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the workout is in progress.
    pub ended_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    pub fn is_in_progress(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        match self.ended_at {
            Some(ended_at) if ended_at < self.started_at => Err(AppError::Validation(
                "endedAt must not be before startedAt".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            started_at: row.get("started_at")?,
            ended_at: row.get("ended_at")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A workout together with its sets in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: Workout,
    pub sets: Vec<WorkoutSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkout {
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<Option<String>>,
}

impl UpdateWorkout {
    pub fn apply(self, workout: &mut Workout) {
        if let Some(started_at) = self.started_at {
            workout.started_at = started_at;
        }
        if let Some(ended_at) = self.ended_at {
            workout.ended_at = ended_at;
        }
        if let Some(note) = self.note {
            workout.note = normalize_text(note);
        }
    }
}

/// Body of `PATCH /api/workouts/{id}/end`; a missing `endedAt` means now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndWorkout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// `from`/`to` range on a timestamp column, `from` inclusive, `to` exclusive.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn validate(&self) -> Result<()> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(AppError::BadRequest("'from' must be <= 'to'".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Query string of the time-series list endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl RangeQuery {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            from: self.from,
            to: self.to,
        }
    }

    pub fn page(&self) -> PageParams {
        PageParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
