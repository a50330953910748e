use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Offset/limit window applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 100;

    /// Validate a requested window. `limit` must be within
    /// `1..=MAX_LIMIT`.
    pub fn new(offset: u64, limit: u64) -> Result<Self> {
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(DomainError::InvalidInput(format!(
                "limit must be between 1 and {}, got {limit}",
                Self::MAX_LIMIT
            )));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset_usize(&self) -> usize {
        usize::try_from(self.offset).unwrap_or(usize::MAX)
    }

    pub fn limit_usize(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(usize::MAX)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
