use thiserror::Error;

use crate::{Axis, DiskGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A coordinate lies outside `0..upper` for its axis.
    #[error("{axis} {value} out of range (expected 0..{upper})")]
    OutOfRange { axis: Axis, value: u32, upper: u32 },
    /// The geometry has no heads, no cylinders or no sectors per track.
    #[error("degenerate disk geometry: no addressable blocks")]
    DegenerateGeometry,
    /// The geometry has more blocks than a `u32` block number can address.
    #[error("disk geometry too large: {0}")]
    TooManyBlocks(DiskGeometry),
}
