//! One inspection session: a disk image, a cursor into it and the
//! integrity state the cursor is navigated against.

use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::path::Path;

use disk_geometry::{Axis, BlockAddress, BlockCursor, GeometryError};
use format_adf::{DiskImage, ExportFormat, ImageError, SECTOR_SIZE, SectorImage};
use fs_integrity::{
    AmigaDosChecker, BlockKind, CorruptionNavigator, ErrorReport, Fault, NavigateError, block,
};
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::{InspectorConfig, ManagedArray};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("cannot read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("no compatible file system")]
    NoFileSystem,
    #[error("no corrupted blocks")]
    NoCorruption,
}

impl From<NavigateError<Infallible>> for SessionError {
    fn from(err: NavigateError<Infallible>) -> Self {
        match err {
            NavigateError::NoCorruption => Self::NoCorruption,
            NavigateError::Oracle(never) => match never {},
        }
    }
}

/// One byte of the hex view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HexCell {
    pub value: u8,
    pub fault: Option<Fault>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HexRow {
    pub offset: usize,
    pub cells: Vec<HexCell>,
}

/// `0040: 00 00 12! 34 ...` with faulty bytes marked `!` and the
/// selected byte marked `<`.
impl fmt::Display for HexRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:", self.offset)?;
        for cell in &self.cells {
            let mark = if cell.selected {
                '<'
            } else if cell.fault.is_some() {
                '!'
            } else {
                ' '
            };
            write!(f, " {:02X}{mark}", cell.value)?;
        }
        Ok(())
    }
}

/// Everything a front end shows about the session, in one value.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub layout: String,
    pub volume: String,
    pub strict: bool,
    pub position: BlockAddress,
    pub block_kind: Option<BlockKind>,
    pub report: Option<ErrorReport>,
    pub corruption: Option<String>,
    pub info: String,
}

pub struct Session {
    image: DiskImage,
    cursor: BlockCursor,
    strict: bool,
    bytes_per_row: usize,
    history: ManagedArray<u32>,
    report: Option<ErrorReport>,
    selection: Option<usize>,
}

impl Session {
    /// Start inspecting an image. If the volume has corrupted blocks the
    /// cursor starts on the first one.
    pub fn open(image: DiskImage, config: &InspectorConfig) -> Result<Self, SessionError> {
        let cursor = BlockCursor::new(image.geometry())?;
        let mut session = Self {
            image,
            cursor,
            strict: config.strict,
            bytes_per_row: config.bytes_per_row.max(1),
            history: ManagedArray::new(config.history_capacity),
            report: None,
            selection: None,
        };
        session.report = session.run_check();
        if session.report.is_some_and(|r| !r.is_clean()) {
            if let Some(first) = session.seek_corrupted(1) {
                session.cursor.set_block(i64::from(first));
            }
        }
        Ok(session)
    }

    pub fn open_path(path: &Path, config: &InspectorConfig) -> Result<Self, SessionError> {
        let data = fs::read(path)?;
        let image = DiskImage::from_bytes(data)?;
        info!("opened {}: {}", path.display(), image.layout_info());
        Self::open(image, config)
    }

    pub fn address(&self) -> BlockAddress {
        self.cursor.address()
    }

    pub fn block(&self) -> u32 {
        self.cursor.block()
    }

    /// Direct cursor access, e.g. to register observers.
    pub fn cursor_mut(&mut self) -> &mut BlockCursor {
        &mut self.cursor
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Result of the most recent whole-volume check; `None` without a
    /// file system.
    pub fn report(&self) -> Option<ErrorReport> {
        self.report
    }

    pub fn history(&self) -> &ManagedArray<u32> {
        &self.history
    }

    /// A checker for the current strictness, if the image holds AmigaDOS.
    pub fn checker(&self) -> Option<AmigaDosChecker<'_, DiskImage>> {
        AmigaDosChecker::new(&self.image, self.strict).ok()
    }

    fn run_check(&self) -> Option<ErrorReport> {
        self.checker().map(|checker| checker.check())
    }

    fn seek_corrupted(&self, n: usize) -> Option<u32> {
        let checker = self.checker()?;
        match CorruptionNavigator::new(&checker).seek(n) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Switch strictness and repeat the check.
    pub fn set_strict(&mut self, strict: bool) -> Option<ErrorReport> {
        self.strict = strict;
        self.report = self.run_check();
        self.report
    }

    /// Edit one coordinate. Out-of-range input saturates.
    pub fn goto(&mut self, axis: Axis, value: i64) -> BlockAddress {
        let from = self.cursor.block();
        if self.cursor.set(axis, value) {
            self.history.push(from);
            self.selection = None;
        }
        self.cursor.address()
    }

    pub fn jump_next_corrupted(&mut self) -> Result<u32, SessionError> {
        let target = {
            let checker = self.checker().ok_or(SessionError::NoFileSystem)?;
            CorruptionNavigator::new(&checker).next(self.cursor.block())?
        };
        self.goto(Axis::Block, i64::from(target));
        Ok(target)
    }

    pub fn jump_prev_corrupted(&mut self) -> Result<u32, SessionError> {
        let target = {
            let checker = self.checker().ok_or(SessionError::NoFileSystem)?;
            CorruptionNavigator::new(&checker).prev(self.cursor.block())?
        };
        self.goto(Axis::Block, i64::from(target));
        Ok(target)
    }

    /// Return to the previously visited block.
    pub fn back(&mut self) -> Option<u32> {
        let block = self.history.pop_last()?;
        self.cursor.set_block(i64::from(block));
        self.selection = None;
        Some(block)
    }

    /// Select a byte of the current block; selecting it again clears it.
    pub fn toggle_selection(&mut self, offset: usize) -> Option<usize> {
        if offset >= SECTOR_SIZE {
            warn!("byte offset {offset} outside block");
            return self.selection;
        }
        self.selection = if self.selection == Some(offset) {
            None
        } else {
            Some(offset)
        };
        self.selection
    }

    /// "Corrupted block k out of n" on a corrupted block, "n corrupted
    /// blocks" elsewhere, `None` on a clean or non-DOS volume.
    pub fn corruption_summary(&self) -> Option<String> {
        let total = self.report?.corrupted_blocks;
        if total == 0 {
            return None;
        }
        let checker = self.checker()?;
        let ordinal = match CorruptionNavigator::new(&checker).ordinal(self.block()) {
            Ok(ordinal) => ordinal,
            Err(never) => match never {},
        };
        Some(match ordinal {
            Some(k) => format!("Corrupted block {k} out of {total}"),
            None if total == 1 => "1 corrupted block".to_string(),
            None => format!("{total} corrupted blocks"),
        })
    }

    pub fn volume_info(&self) -> String {
        let Some(checker) = self.checker() else {
            return "No compatible file system".to_string();
        };
        let mut text = checker.description();
        if let Some(errors) = self.report.map(|r| r.corrupted_blocks).filter(|&n| n > 0) {
            let blocks = if errors == 1 { "block" } else { "blocks" };
            text += &format!(" with {errors} corrupted {blocks}");
        }
        text
    }

    /// Block type, or the selected byte's meaning and fault.
    pub fn block_info(&self) -> String {
        let Some(checker) = self.checker() else {
            return String::new();
        };
        let kind = checker.block_kind(self.block());
        match self.selection {
            None => kind.to_string(),
            Some(pos) => {
                let field = block::field_name(kind, pos);
                match checker.check_byte(self.block(), pos) {
                    Some(fault) => format!("{field}: {fault}"),
                    None => field.to_string(),
                }
            }
        }
    }

    pub fn hex_rows(&self) -> Vec<HexRow> {
        let Some(data) = self.image.read_block(self.block()) else {
            return Vec::new();
        };
        let checker = self.checker();
        data.chunks(self.bytes_per_row)
            .enumerate()
            .map(|(row, bytes)| {
                let offset = row * self.bytes_per_row;
                let cells = bytes
                    .iter()
                    .enumerate()
                    .map(|(i, &value)| HexCell {
                        value,
                        fault: checker
                            .as_ref()
                            .and_then(|c| c.check_byte(self.block(), offset + i)),
                        selected: self.selection == Some(offset + i),
                    })
                    .collect();
                HexRow { offset, cells }
            })
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            layout: self.image.layout_info(),
            volume: self.volume_info(),
            strict: self.strict,
            position: self.address(),
            block_kind: self.checker().map(|c| c.block_kind(self.block())),
            report: self.report,
            corruption: self.corruption_summary(),
            info: self.block_info(),
        }
    }

    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<(), SessionError> {
        self.image.export_to_path(format, path)?;
        Ok(())
    }
}
