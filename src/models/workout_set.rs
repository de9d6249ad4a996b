use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::fields::{normalize_text, nullable};
use super::FromSqliteRow;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: String,
    pub workout_id: String,
    pub exercise_id: String,
    /// Ordering key within the workout, starting at 1.
    pub set_index: i64,
    pub reps: Option<i64>,
    pub weight_kg: Option<f64>,
    pub rpe: Option<f64>,
    pub rest_sec: Option<i64>,
    pub duration_sec: Option<i64>,
    pub distance_m: Option<f64>,
    pub note: Option<String>,
    pub is_warmup: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutSet {
    /// Check the numeric ranges; every measurement is independently optional.
    pub fn validate(&self) -> Result<()> {
        if self.set_index < 1 {
            return Err(AppError::Validation("setIndex must be >= 1".to_string()));
        }
        non_negative_int("reps", self.reps)?;
        non_negative_int("restSec", self.rest_sec)?;
        non_negative_int("durationSec", self.duration_sec)?;
        non_negative_float("weightKg", self.weight_kg)?;
        non_negative_float("distanceM", self.distance_m)?;
        if let Some(rpe) = self.rpe {
            if !(0.0..=10.0).contains(&rpe) {
                return Err(AppError::Validation(
                    "rpe must be between 0 and 10".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn non_negative_int(field: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(v) if v < 0 => Err(AppError::Validation(format!("{} must be >= 0", field))),
        _ => Ok(()),
    }
}

fn non_negative_float(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(AppError::Validation(format!("{} must be >= 0", field)))
        }
        _ => Ok(()),
    }
}

impl FromSqliteRow for WorkoutSet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            exercise_id: row.get("exercise_id")?,
            set_index: row.get("set_index")?,
            reps: row.get("reps")?,
            weight_kg: row.get("weight_kg")?,
            rpe: row.get("rpe")?,
            rest_sec: row.get("rest_sec")?,
            duration_sec: row.get("duration_sec")?,
            distance_m: row.get("distance_m")?,
            note: row.get("note")?,
            is_warmup: row.get("is_warmup")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkoutSet {
    pub exercise_id: String,
    /// Missing or 0 appends after the last set of the workout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_sec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub is_warmup: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkoutSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_index: Option<i64>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub reps: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub rpe: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub rest_sec: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_warmup: Option<bool>,
}

impl UpdateWorkoutSet {
    pub fn apply(self, set: &mut WorkoutSet) {
        if let Some(exercise_id) = self.exercise_id {
            set.exercise_id = exercise_id;
        }
        if let Some(set_index) = self.set_index {
            set.set_index = set_index;
        }
        if let Some(reps) = self.reps {
            set.reps = reps;
        }
        if let Some(weight_kg) = self.weight_kg {
            set.weight_kg = weight_kg;
        }
        if let Some(rpe) = self.rpe {
            set.rpe = rpe;
        }
        if let Some(rest_sec) = self.rest_sec {
            set.rest_sec = rest_sec;
        }
        if let Some(duration_sec) = self.duration_sec {
            set.duration_sec = duration_sec;
        }
        if let Some(distance_m) = self.distance_m {
            set.distance_m = distance_m;
        }
        if let Some(note) = self.note {
            set.note = normalize_text(note);
        }
        if let Some(is_warmup) = self.is_warmup {
            set.is_warmup = is_warmup;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkoutSet {
        let now = Utc::now();
        WorkoutSet {
            id: "s1".to_string(),
            workout_id: "w1".to_string(),
            exercise_id: "ex1".to_string(),
            set_index: 1,
            reps: Some(5),
            weight_kg: Some(100.0),
            rpe: Some(8.5),
            rest_sec: Some(180),
            duration_sec: None,
            distance_m: None,
            note: None,
            is_warmup: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_ranges() {
        assert!(sample().validate().is_ok());

        let mut set = sample();
        set.rpe = Some(10.5);
        assert!(set.validate().is_err());

        let mut set = sample();
        set.reps = Some(-1);
        assert!(set.validate().is_err());

        let mut set = sample();
        set.distance_m = Some(f64::NAN);
        assert!(set.validate().is_err());

        let mut set = sample();
        set.set_index = 0;
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_cardio_set_needs_no_strength_fields() {
        let mut set = sample();
        set.reps = None;
        set.weight_kg = None;
        set.rpe = None;
        set.duration_sec = Some(1800);
        set.distance_m = Some(5000.0);

        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_patch_leaves_absent_fields_and_clears_null() {
        let mut set = sample();
        let patch: UpdateWorkoutSet =
            serde_json::from_str(r#"{"reps":null,"isWarmup":true,"durationSec":45}"#).unwrap();

        patch.apply(&mut set);

        assert_eq!(set.reps, None);
        assert!(set.is_warmup);
        assert_eq!(set.duration_sec, Some(45));
        assert_eq!(set.weight_kg, Some(100.0));
        assert_eq!(set.rest_sec, Some(180));
    }
}
