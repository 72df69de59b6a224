use crate::domain::fine::FinePolicy;
use crate::error::{LibraryError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Engine configuration, validated once at construction.
///
/// Replaces ambient configuration lookups with an explicit object so that a
/// misconfigured engine fails at startup rather than mid-operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of simultaneously open orders per user.
    pub loan_cap: u32,
    /// Fine accrual parameters.
    pub fines: FinePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loan_cap: 3,
            fines: FinePolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.loan_cap == 0 {
            return Err(LibraryError::Config(
                "loan cap must be at least 1".to_string(),
            ));
        }
        if self.fines.grace_days < 0 {
            return Err(LibraryError::Config(
                "grace period cannot be negative".to_string(),
            ));
        }
        if self.fines.daily_fine <= Decimal::ZERO {
            return Err(LibraryError::Config(
                "daily fine must be positive".to_string(),
            ));
        }
        if self.fines.block_threshold < self.fines.daily_fine {
            return Err(LibraryError::Config(
                "block threshold must be at least one daily fine".to_string(),
            ));
        }
        Ok(())
    }
}
