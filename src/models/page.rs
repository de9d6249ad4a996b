use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 200;

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// `limit`/`offset` query parameters before defaults and bounds are applied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl PageParams {
    /// Resolve to `(limit, offset)`, rejecting out-of-range values.
    pub fn resolve(&self) -> Result<(i64, i64)> {
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(v) if (1..=MAX_LIMIT).contains(&v) => v,
            Some(_) => return Err(AppError::BadRequest("invalid 'limit'".to_string())),
        };
        let offset = match self.offset {
            None => 0,
            Some(v) if v >= 0 => v,
            Some(_) => return Err(AppError::BadRequest("invalid 'offset'".to_string())),
        };
        Ok((limit, offset))
    }
}
