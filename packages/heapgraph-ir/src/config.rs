//! Work-unit configuration
//!
//! The context length is an explicit value on each work unit rather than
//! process-global state; summary analysis requires it to stay at zero.

use crate::errors::{HeapgraphError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wall-clock budget of one method's fixpoint
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnitConfig {
    /// Wall-clock budget for the reaching-facts fixpoint. On expiry the
    /// last stable fact set is kept and the summary is flagged incomplete.
    pub timeout: Duration,

    /// Call-string length; summary analysis flattens contexts to 0
    pub context_length: usize,
}

impl Default for WorkUnitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            context_length: 0,
        }
    }
}

impl WorkUnitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.context_length != 0 {
            return Err(HeapgraphError::config(format!(
                "summary analysis requires context length 0, got {}",
                self.context_length
            )));
        }
        if self.timeout.is_zero() {
            return Err(HeapgraphError::config("timeout must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(WorkUnitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_nonzero_context_rejected() {
        let cfg = WorkUnitConfig {
            context_length: 1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
