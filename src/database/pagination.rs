use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::database::manager::DatabaseError;

/// Raw `?offset=&limit=` query parameters
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Resolve query parameters against configured defaults. Limits above the
    /// maximum are clamped; negative offsets and non-positive limits are rejected.
    pub fn from_query(query: &PageQuery, api: &ApiConfig) -> Result<Self, DatabaseError> {
        let offset = query.offset.unwrap_or(0);
        if offset < 0 {
            return Err(DatabaseError::Invalid("offset must not be negative".to_string()));
        }

        let limit = query.limit.unwrap_or(api.default_page_size);
        if limit <= 0 {
            return Err(DatabaseError::Invalid("limit must be positive".to_string()));
        }

        Ok(Self { offset, limit: limit.min(api.max_page_size) })
    }
}

/// One page of results plus the size of the whole matching set
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
