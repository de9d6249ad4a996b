use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::fields::{normalize_text, nullable};
use super::FromSqliteRow;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetric {
    pub id: String,
    pub user_id: String,
    pub measured_at: DateTime<Utc>,
    pub weight_kg: f64,
    pub body_fat_pct: Option<f64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BodyMetric {
    pub fn validate(&self) -> Result<()> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(AppError::Validation("weightKg must be > 0".to_string()));
        }
        if let Some(pct) = self.body_fat_pct {
            if !(0.0..=100.0).contains(&pct) {
                return Err(AppError::Validation(
                    "bodyFatPct must be between 0 and 100".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl FromSqliteRow for BodyMetric {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            measured_at: row.get("measured_at")?,
            weight_kg: row.get("weight_kg")?,
            body_fat_pct: row.get("body_fat_pct")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBodyMetric {
    pub measured_at: DateTime<Utc>,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBodyMetric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
}

impl UpdateBodyMetric {
    pub fn apply(self, metric: &mut BodyMetric) {
        if let Some(measured_at) = self.measured_at {
            metric.measured_at = measured_at;
        }
        if let Some(weight_kg) = self.weight_kg {
            metric.weight_kg = weight_kg;
        }
        if let Some(body_fat_pct) = self.body_fat_pct {
            metric.body_fat_pct = body_fat_pct;
        }
        if let Some(note) = self.note {
            metric.note = normalize_text(note);
        }
    }
}
