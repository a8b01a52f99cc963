use std::fmt;

use serde::Serialize;

/// Why a byte failed the structural check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    /// The field holds a fixed value and this byte differs from it.
    ExpectedValue,
    /// The field must point back at the block holding it.
    ExpectedSelfRef,
    BadChecksum,
    BadDosSignature,
    /// A reference that must be present is zero.
    ExpectedRef,
    /// A reference that must be absent is set.
    ExpectedNoRef,
    ExpectedDataBlockRef,
    ExpectedHashRef,
    ExpectedParentRef,
    ExpectedFileListRef,
    ExpectedBitmapRef,
    ExpectedFileHeaderRef,
    /// A size or count field exceeds its limit.
    ValueTooLarge,
}

/// A failed byte, with the value the checker expected where one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub expected: Option<u8>,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExpectedValue => "Unexpected value",
            Self::ExpectedSelfRef => "Expected a self reference",
            Self::BadChecksum => "Checksum error",
            Self::BadDosSignature => "Invalid DOS signature",
            Self::ExpectedRef => "Expected a block reference",
            Self::ExpectedNoRef => "Did not expect a block reference",
            Self::ExpectedDataBlockRef => "Expected a reference to a data block",
            Self::ExpectedHashRef => "Expected a reference to a header block",
            Self::ExpectedParentRef => "Expected a reference to a directory block",
            Self::ExpectedFileListRef => "Expected a reference to an extension block",
            Self::ExpectedBitmapRef => "Expected a reference to a bitmap block",
            Self::ExpectedFileHeaderRef => "Expected a reference to a file header block",
            Self::ValueTooLarge => "Value out of range",
        })
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected {
            Some(byte) => write!(f, "{} (expected ${byte:02X})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
