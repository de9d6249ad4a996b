use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::fields::{normalize_text, nullable};
use super::FromSqliteRow;
use crate::error::{AppError, Result};

pub const MAX_NAME_CHARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Strength,
    Cardio,
    Other,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Strength => "strength",
            ExerciseType::Cardio => "cardio",
            ExerciseType::Other => "other",
        }
    }
}

impl FromStr for ExerciseType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strength" => Ok(ExerciseType::Strength),
            "cardio" => Ok(ExerciseType::Cardio),
            "other" => Ok(ExerciseType::Other),
            _ => Err(AppError::Validation(format!("unknown exercise type: {}", s))),
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    /// `None` for shared catalog entries.
    pub owner_user_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub primary_muscle: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exercise {
    pub fn is_shared(&self) -> bool {
        self.owner_user_id.is_none()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id.as_deref() == Some(user_id)
    }

    /// Shared entries and the caller's own entries are visible.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_shared() || self.is_owned_by(user_id)
    }
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let type_str: String = row.get("type")?;
        let exercise_type = type_str.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("invalid exercise type {}", type_str).into(),
            )
        })?;
        Ok(Self {
            id: row.get("id")?,
            owner_user_id: row.get("owner_user_id")?,
            name: row.get("name")?,
            exercise_type,
            primary_muscle: row.get("primary_muscle")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExercise {
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_muscle: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExercise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub exercise_type: Option<ExerciseType>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_muscle: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateExercise {
    pub fn apply(self, exercise: &mut Exercise) {
        if let Some(name) = self.name {
            exercise.name = name;
        }
        if let Some(exercise_type) = self.exercise_type {
            exercise.exercise_type = exercise_type;
        }
        if let Some(primary_muscle) = self.primary_muscle {
            exercise.primary_muscle = primary_muscle;
        }
        if let Some(is_active) = self.is_active {
            exercise.is_active = is_active;
        }
    }
}

/// Query string of `GET /api/exercises`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub exercise_type: Option<ExerciseType>,
    #[serde(default)]
    pub only_mine: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// Normalize name and muscle in place and check the catalog constraints.
pub fn normalize_exercise(exercise: &mut Exercise) -> Result<()> {
    let name = exercise.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation("name too long".to_string()));
    }
    exercise.name = name.to_string();

    exercise.primary_muscle = normalize_text(exercise.primary_muscle.take());
    if let Some(muscle) = &exercise.primary_muscle {
        if muscle.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::Validation("primaryMuscle too long".to_string()));
        }
    }
    Ok(())
}
