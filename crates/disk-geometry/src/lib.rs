//! Disk geometry addressing.
//!
//! A floppy disk position can be named five ways: cylinder, head, track,
//! sector and absolute block. [`DiskGeometry`] converts between them and
//! [`BlockCursor`] keeps all five in step while any one is being edited.
//!
//! ```text
//! track = cylinder * heads + head
//! block = track * sectors_per_track + sector
//! ```

mod cursor;
mod error;
mod geometry;

pub use cursor::{BlockCursor, ObserverId};
pub use error::GeometryError;
pub use geometry::{Axis, BlockAddress, DiskGeometry};
