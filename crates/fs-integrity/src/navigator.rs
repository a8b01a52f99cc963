//! Stepping through corrupted blocks.
//!
//! Both directions wrap: stepping past the last corrupted block returns to
//! the first one, so "next error" is always productive while errors exist.
//! The navigator keeps no state between calls; every query asks the oracle
//! afresh.

use thiserror::Error;

use crate::IntegrityOracle;

#[derive(Debug, Error)]
pub enum NavigateError<E: std::error::Error + 'static> {
    #[error("no corrupted blocks")]
    NoCorruption,
    #[error("integrity check failed: {0}")]
    Oracle(#[source] E),
}

pub struct CorruptionNavigator<'a, O: ?Sized> {
    oracle: &'a O,
}

impl<'a, O: IntegrityOracle + ?Sized> CorruptionNavigator<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    fn corrupted(&self) -> Result<Vec<u32>, NavigateError<O::Error>> {
        let blocks = self
            .oracle
            .corrupted_blocks()
            .map_err(NavigateError::Oracle)?;
        if blocks.is_empty() {
            Err(NavigateError::NoCorruption)
        } else {
            Ok(blocks)
        }
    }

    /// Smallest corrupted block after `current`, wrapping to the first.
    pub fn next(&self, current: u32) -> Result<u32, NavigateError<O::Error>> {
        let blocks = self.corrupted()?;
        let i = blocks.partition_point(|&b| b <= current);
        blocks
            .get(i)
            .or_else(|| blocks.first())
            .copied()
            .ok_or(NavigateError::NoCorruption)
    }

    /// Largest corrupted block before `current`, wrapping to the last.
    pub fn prev(&self, current: u32) -> Result<u32, NavigateError<O::Error>> {
        let blocks = self.corrupted()?;
        let i = blocks.partition_point(|&b| b < current);
        let found = match i {
            0 => blocks.last(),
            _ => blocks.get(i - 1),
        };
        found.copied().ok_or(NavigateError::NoCorruption)
    }

    /// 1-based position of `block` among the corrupted blocks.
    pub fn ordinal(&self, block: u32) -> Result<Option<usize>, O::Error> {
        let blocks = self.oracle.corrupted_blocks()?;
        Ok(blocks.binary_search(&block).ok().map(|i| i + 1))
    }

    /// The `n`-th corrupted block, counting from 1.
    pub fn seek(&self, n: usize) -> Result<Option<u32>, O::Error> {
        if n == 0 {
            return Ok(None);
        }
        Ok(self.oracle.corrupted_blocks()?.get(n - 1).copied())
    }
}
