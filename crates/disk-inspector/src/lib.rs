//! Block-level inspection of floppy disk images.
//!
//! A [`Session`] owns one image and one cursor. Front ends drive it through
//! plain method calls and observe cursor moves through
//! [`BlockCursor::subscribe`](disk_geometry::BlockCursor::subscribe).

mod config;
mod history;
mod session;

pub use config::{ConfigError, InspectorConfig};
pub use history::ManagedArray;
pub use session::{HexCell, HexRow, Session, SessionError, SessionSummary};
