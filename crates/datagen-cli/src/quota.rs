use thiserror::Error;

use crate::workspace::WorkspaceSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("requested {requested} rows but the limit per request is {limit}")]
pub struct QuotaExceeded {
    pub requested: u64,
    pub limit: u64,
}

/// Per-request row budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowQuota {
    max_rows: Option<u64>,
    unlimited: bool,
}

impl RowQuota {
    pub fn new(max_rows: Option<u64>, unlimited: bool) -> Self {
        Self { max_rows, unlimited }
    }

    pub fn from_settings(settings: &WorkspaceSettings) -> Self {
        Self::new(settings.max_rows_per_request, settings.unlimited_generation)
    }

    pub fn check(&self, num_rows: u64) -> Result<(), QuotaExceeded> {
        match self.max_rows {
            Some(limit) if !self.unlimited && num_rows > limit => Err(QuotaExceeded {
                requested: num_rows,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_inclusive() {
        let quota = RowQuota::new(Some(100), false);
        assert!(quota.check(100).is_ok());
        assert_eq!(
            quota.check(101),
            Err(QuotaExceeded {
                requested: 101,
                limit: 100
            })
        );
    }

    #[test]
    fn unlimited_bypasses_the_limit() {
        assert!(RowQuota::new(Some(10), true).check(1_000_000).is_ok());
        assert!(RowQuota::default().check(u64::MAX).is_ok());
    }
}
