//! AmigaDOS volume integrity checking and corrupted-block navigation.
//!
//! [`IntegrityOracle`] is the contract between whatever decides a block is
//! corrupted and [`CorruptionNavigator`], which steps an inspection cursor
//! from one corrupted block to the next. [`AmigaDosChecker`] is the oracle
//! for OFS/FFS volumes on raw sector images.

pub mod block;
mod checker;
mod fault;
mod format;
mod navigator;
mod oracle;

pub use block::BlockKind;
pub use checker::{AmigaDosChecker, CheckError};
pub use fault::{Fault, FaultKind};
pub use format::{DosType, format_volume};
pub use navigator::{CorruptionNavigator, NavigateError};
pub use oracle::{ErrorReport, IntegrityOracle};
