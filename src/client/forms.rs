//! Form input as typed by a user, converted into request payloads.
//!
//! Blank optional fields become `None`. Anything that does not parse is a
//! [`ClientError::Validation`] and never reaches the network.

use chrono::{DateTime, Utc};

use super::{ClientError, ClientResult};
use crate::models::fields::normalize_text;
use crate::models::todo::MAX_CONTENT_CHARS;
use crate::models::{
    CreateBodyMetric, CreateExercise, CreateWorkout, CreateWorkoutSet, ExerciseType, TodoInput,
    UpdateWorkoutSet,
};

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::Validation(message.into())
}

fn optional_i64(field: &str, raw: &str) -> ClientResult<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: i64 = raw
        .parse()
        .map_err(|_| invalid(format!("{} must be a whole number", field)))?;
    if value < 0 {
        return Err(invalid(format!("{} must be >= 0", field)));
    }
    Ok(Some(value))
}

fn optional_f64(field: &str, raw: &str) -> ClientResult<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        Ok(_) => Err(invalid(format!("{} must be >= 0", field))),
        Err(_) => Err(invalid(format!("{} must be a number", field))),
    }
}

/// Blank means "now".
fn timestamp_or_now(field: &str, raw: &str) -> ClientResult<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Utc::now());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(format!("{} must be an RFC 3339 timestamp", field)))
}

#[derive(Debug, Clone, Default)]
pub struct TodoForm {
    pub content: String,
}

impl TodoForm {
    pub fn to_input(&self) -> ClientResult<TodoInput> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(invalid("content is required"));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(invalid("content too long"));
        }
        Ok(TodoInput {
            content: content.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutForm {
    /// RFC 3339; blank starts the workout now.
    pub started_at: String,
    pub note: String,
}

impl WorkoutForm {
    pub fn to_input(&self) -> ClientResult<CreateWorkout> {
        Ok(CreateWorkout {
            started_at: Some(timestamp_or_now("startedAt", &self.started_at)?),
            note: normalize_text(Some(self.note.clone())),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SetForm {
    pub exercise_id: String,
    /// Blank appends after the last set.
    pub set_index: String,
    pub reps: String,
    pub weight_kg: String,
    pub rpe: String,
    pub rest_sec: String,
    pub duration_sec: String,
    pub distance_m: String,
    pub note: String,
    pub is_warmup: bool,
}

/// Parsed numeric fields of a [`SetForm`].
struct SetValues {
    set_index: Option<i64>,
    reps: Option<i64>,
    weight_kg: Option<f64>,
    rpe: Option<f64>,
    rest_sec: Option<i64>,
    duration_sec: Option<i64>,
    distance_m: Option<f64>,
}

impl SetForm {
    fn parse(&self) -> ClientResult<SetValues> {
        let rpe = optional_f64("rpe", &self.rpe)?;
        if rpe.is_some_and(|rpe| rpe > 10.0) {
            return Err(invalid("rpe must be between 0 and 10"));
        }
        Ok(SetValues {
            set_index: optional_i64("setIndex", &self.set_index)?,
            reps: optional_i64("reps", &self.reps)?,
            weight_kg: optional_f64("weightKg", &self.weight_kg)?,
            rpe,
            rest_sec: optional_i64("restSec", &self.rest_sec)?,
            duration_sec: optional_i64("durationSec", &self.duration_sec)?,
            distance_m: optional_f64("distanceM", &self.distance_m)?,
        })
    }

    pub fn to_input(&self) -> ClientResult<CreateWorkoutSet> {
        let exercise_id = self.exercise_id.trim();
        if exercise_id.is_empty() {
            return Err(invalid("exercise is required"));
        }
        let values = self.parse()?;
        Ok(CreateWorkoutSet {
            exercise_id: exercise_id.to_string(),
            set_index: values.set_index,
            reps: values.reps,
            weight_kg: values.weight_kg,
            rpe: values.rpe,
            rest_sec: values.rest_sec,
            duration_sec: values.duration_sec,
            distance_m: values.distance_m,
            note: normalize_text(Some(self.note.clone())),
            is_warmup: self.is_warmup,
        })
    }

    /// A full replacement of the set's editable fields; blank inputs clear.
    pub fn to_patch(&self) -> ClientResult<UpdateWorkoutSet> {
        let values = self.parse()?;
        let exercise_id = self.exercise_id.trim();
        Ok(UpdateWorkoutSet {
            exercise_id: (!exercise_id.is_empty()).then(|| exercise_id.to_string()),
            set_index: values.set_index,
            reps: Some(values.reps),
            weight_kg: Some(values.weight_kg),
            rpe: Some(values.rpe),
            rest_sec: Some(values.rest_sec),
            duration_sec: Some(values.duration_sec),
            distance_m: Some(values.distance_m),
            note: Some(normalize_text(Some(self.note.clone()))),
            is_warmup: Some(self.is_warmup),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseForm {
    pub name: String,
    /// `strength`, `cardio` or `other`.
    pub exercise_type: String,
    pub primary_muscle: String,
}

impl ExerciseForm {
    pub fn to_input(&self) -> ClientResult<CreateExercise> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("name is required"));
        }
        let exercise_type: ExerciseType = self
            .exercise_type
            .trim()
            .parse()
            .map_err(|_| invalid("type must be strength, cardio or other"))?;
        Ok(CreateExercise {
            name: name.to_string(),
            exercise_type,
            primary_muscle: normalize_text(Some(self.primary_muscle.clone())),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BodyMetricForm {
    /// RFC 3339; blank records the measurement now.
    pub measured_at: String,
    pub weight_kg: String,
    pub body_fat_pct: String,
    pub note: String,
}

impl BodyMetricForm {
    pub fn to_input(&self) -> ClientResult<CreateBodyMetric> {
        let weight_kg = optional_f64("weightKg", &self.weight_kg)?
            .ok_or_else(|| invalid("weightKg is required"))?;
        if weight_kg <= 0.0 {
            return Err(invalid("weightKg must be > 0"));
        }
        let body_fat_pct = optional_f64("bodyFatPct", &self.body_fat_pct)?;
        if body_fat_pct.is_some_and(|pct| pct > 100.0) {
            return Err(invalid("bodyFatPct must be between 0 and 100"));
        }
        Ok(CreateBodyMetric {
            measured_at: timestamp_or_now("measuredAt", &self.measured_at)?,
            weight_kg,
            body_fat_pct,
            note: normalize_text(Some(self.note.clone())),
        })
    }
}
