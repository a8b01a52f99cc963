//! The integrity-check contract consumed by the navigator.

use std::collections::BTreeSet;
use std::convert::Infallible;

use serde::Serialize;

/// Source of truth for which blocks are corrupted.
///
/// Implementations evaluate on every call. The underlying check may be
/// re-run with different settings at any time, so callers must not hold on
/// to a previous answer.
pub trait IntegrityOracle {
    type Error: std::error::Error + 'static;

    /// Corrupted block numbers in ascending order.
    fn corrupted_blocks(&self) -> Result<Vec<u32>, Self::Error>;

    fn is_corrupted(&self, block: u32) -> Result<bool, Self::Error>;

    fn corrupted_count(&self) -> Result<usize, Self::Error> {
        Ok(self.corrupted_blocks()?.len())
    }
}

/// A fixed corrupted-block set, e.g. one loaded from a previous report.
impl IntegrityOracle for BTreeSet<u32> {
    type Error = Infallible;

    fn corrupted_blocks(&self) -> Result<Vec<u32>, Infallible> {
        Ok(self.iter().copied().collect())
    }

    fn is_corrupted(&self, block: u32) -> Result<bool, Infallible> {
        Ok(self.contains(&block))
    }

    fn corrupted_count(&self) -> Result<usize, Infallible> {
        Ok(self.len())
    }
}

/// Summary of a whole-volume check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub corrupted_blocks: usize,
    pub first_error_block: Option<u32>,
    pub last_error_block: Option<u32>,
    /// Blocks whose allocation bit contradicts their content.
    pub bitmap_errors: usize,
}

impl ErrorReport {
    /// Build a report from an ascending block list, with no bitmap errors.
    pub fn from_blocks(blocks: &[u32]) -> Self {
        Self {
            corrupted_blocks: blocks.len(),
            first_error_block: blocks.first().copied(),
            last_error_block: blocks.last().copied(),
            bitmap_errors: 0,
        }
    }

    /// No corrupted blocks and a consistent allocation bitmap.
    pub fn is_clean(&self) -> bool {
        self.corrupted_blocks == 0 && self.bitmap_errors == 0
    }
}
