//! Structural checks for AmigaDOS (OFS/FFS) volumes.
//!
//! Checks are made per byte so a hex view can highlight exactly which bytes
//! are wrong. A block is corrupted when any of its bytes fails. Lenient mode
//! skips checks that many real-world disks fail harmlessly (hash chains,
//! parent links, bitmap flag, boot checksum).

use std::convert::Infallible;

use format_adf::{SECTOR_SIZE, SectorImage};
use log::{debug, info};
use thiserror::Error;

use crate::block::{
    self, BM_PAGES, BM_PAGES_OFFSET, BlockKind, HASH_TABLE_SIZE, NAME_OFFSET, OFS_DATA_SIZE,
    ST_FILE, ST_ROOT, ST_USERDIR, T_DATA, T_HEADER, T_LIST, Word,
};
use crate::{ErrorReport, Fault, FaultKind, IntegrityOracle};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("no AmigaDOS file system found (boot signature {0:02X?})")]
    NotDosVolume([u8; 4]),
}

/// Outcome of checking one longword.
enum Verdict {
    /// Each byte must match this value.
    Expect(u32, FaultKind),
    /// The whole longword is wrong.
    Bad(FaultKind),
}

fn expect(value: u32, want: u32, kind: FaultKind) -> Option<Verdict> {
    (value != want).then_some(Verdict::Expect(want, kind))
}

fn bad_if(cond: bool, kind: FaultKind) -> Option<Verdict> {
    cond.then_some(Verdict::Bad(kind))
}

pub struct AmigaDosChecker<'a, I: ?Sized> {
    image: &'a I,
    strict: bool,
    ffs: bool,
    root: u32,
    bitmaps: Vec<u32>,
}

impl<'a, I: SectorImage + ?Sized> AmigaDosChecker<'a, I> {
    pub fn new(image: &'a I, strict: bool) -> Result<Self, CheckError> {
        let signature = image
            .read_block(0)
            .and_then(|boot| boot.get(..4))
            .map_or([0; 4], |s| [s[0], s[1], s[2], s[3]]);
        if &signature[..3] != b"DOS" {
            return Err(CheckError::NotDosVolume(signature));
        }

        let root = image.num_blocks() / 2;
        let bitmaps = image
            .read_block(root)
            .map(|data| {
                (0..BM_PAGES)
                    .map(|i| block::get32(data, block::word_of(BM_PAGES_OFFSET + 4 * i)))
                    .filter(|&nr| nr > 1 && nr != root && nr < image.num_blocks())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            image,
            strict,
            ffs: signature[3] & 1 != 0,
            root,
            bitmaps,
        })
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// "OFS" or "FFS" with the volume name, e.g. `FFS "Workbench"`.
    pub fn description(&self) -> String {
        let fs = if self.ffs { "FFS" } else { "OFS" };
        format!("{fs} \"{}\"", self.volume_name())
    }

    pub fn volume_name(&self) -> String {
        let Some(root) = self.image.read_block(self.root) else {
            return String::new();
        };
        let len = usize::from(root[NAME_OFFSET]).min(30);
        root[NAME_OFFSET + 1..=NAME_OFFSET + len]
            .iter()
            .map(|&b| char::from(b))
            .collect()
    }

    pub fn block_kind(&self, nr: u32) -> BlockKind {
        if nr < 2 {
            return BlockKind::Boot;
        }
        if nr == self.root {
            return BlockKind::Root;
        }
        if self.bitmaps.contains(&nr) {
            return BlockKind::Bitmap;
        }
        let Some(data) = self.image.read_block(nr) else {
            return BlockKind::Unknown;
        };
        match (block::get32(data, 0), block::get32(data, -1)) {
            (T_HEADER, ST_USERDIR) => BlockKind::UserDir,
            (T_HEADER, ST_FILE) => BlockKind::FileHeader,
            (T_LIST, ST_FILE) => BlockKind::FileList,
            (T_DATA, _) if !self.ffs => BlockKind::DataOfs,
            _ if data.iter().all(|&b| b == 0) => BlockKind::Empty,
            _ if self.ffs => BlockKind::DataFfs,
            _ => BlockKind::Unknown,
        }
    }

    /// Check the whole volume: the allocation bitmap first, then every block.
    pub fn check(&self) -> ErrorReport {
        let bitmap_errors = self.bitmap_errors();
        let corrupted = self.corrupted();
        let report = ErrorReport {
            bitmap_errors,
            ..ErrorReport::from_blocks(&corrupted)
        };
        info!(
            "{} check ({}): {} corrupted block(s), {} bitmap error(s)",
            self.description(),
            if self.strict { "strict" } else { "lenient" },
            report.corrupted_blocks,
            report.bitmap_errors
        );
        report
    }

    /// Whether the allocation bitmap marks a block as free. Blocks 0 and 1
    /// and blocks without a bitmap page are always in use.
    pub fn is_free(&self, nr: u32) -> bool {
        let Some((page, byte, mask)) = block::allocation_bit(nr) else {
            return false;
        };
        self.bitmaps
            .get(page)
            .and_then(|&bm| self.image.read_byte(bm, byte))
            .is_some_and(|b| b & mask != 0)
    }

    /// Blocks whose allocation bit disagrees with their content: empty
    /// blocks marked in use, and used blocks marked free.
    pub fn bitmap_errors(&self) -> usize {
        (0..self.image.num_blocks())
            .filter(|&nr| {
                let empty = self.block_kind(nr) == BlockKind::Empty;
                let free = self.is_free(nr);
                if empty != free {
                    if empty {
                        debug!("empty block {nr} is marked as allocated");
                    } else {
                        debug!("used block {nr} is marked as free");
                    }
                }
                empty != free
            })
            .count()
    }

    /// Number of faulty bytes in a block.
    pub fn check_block(&self, nr: u32) -> usize {
        let Some(data) = self.image.read_block(nr) else {
            return 0;
        };
        let kind = self.block_kind(nr);
        if !kind.is_structured() {
            return 0;
        }
        (0..SECTOR_SIZE)
            .filter(|&pos| self.fault_at(nr, kind, data, pos).is_some())
            .count()
    }

    /// Check a single byte of a block.
    pub fn check_byte(&self, nr: u32, pos: usize) -> Option<Fault> {
        let data = self.image.read_block(nr)?;
        if pos >= SECTOR_SIZE {
            return None;
        }
        self.fault_at(nr, self.block_kind(nr), data, pos)
    }

    fn corrupted(&self) -> Vec<u32> {
        (0..self.image.num_blocks())
            .filter(|&nr| {
                let faults = self.check_block(nr);
                if faults > 0 {
                    debug!("block {nr} ({}): {faults} faulty byte(s)", self.block_kind(nr));
                }
                faults > 0
            })
            .collect()
    }

    fn fault_at(&self, nr: u32, kind: BlockKind, data: &[u8], pos: usize) -> Option<Fault> {
        if kind == BlockKind::Boot {
            return self.boot_fault(nr, data, pos);
        }
        let word = block::word_of(pos);
        let verdict = match kind {
            BlockKind::Root => self.check_root(data, word),
            BlockKind::UserDir => self.check_user_dir(nr, data, word),
            BlockKind::FileHeader => self.check_file_header(nr, data, word),
            BlockKind::FileList => self.check_file_list(nr, data, word),
            BlockKind::DataOfs => self.check_ofs_data(data, word),
            BlockKind::Bitmap if word == 0 => expect(
                block::get32(data, 0),
                block::header_checksum(data, 0),
                FaultKind::BadChecksum,
            ),
            _ => None,
        }?;
        match verdict {
            Verdict::Expect(want, fault) => {
                let expected = want.to_be_bytes()[pos % 4];
                (data[pos] != expected).then_some(Fault {
                    kind: fault,
                    expected: Some(expected),
                })
            }
            Verdict::Bad(fault) => Some(Fault {
                kind: fault,
                expected: None,
            }),
        }
    }

    fn boot_fault(&self, nr: u32, data: &[u8], pos: usize) -> Option<Fault> {
        if nr != 0 {
            return None;
        }
        let byte = data[pos];
        match pos {
            0..=2 => {
                let want = b"DOS"[pos];
                (byte != want).then_some(Fault {
                    kind: FaultKind::BadDosSignature,
                    expected: Some(want),
                })
            }
            3 => (byte > 7).then_some(Fault {
                kind: FaultKind::ValueTooLarge,
                expected: None,
            }),
            // Only installed disks carry a checksum and root pointer
            4..=11 if self.strict && self.is_bootable() => {
                let want = if pos < 8 {
                    block::boot_checksum(&self.boot_area())
                } else {
                    self.root
                };
                let expected = want.to_be_bytes()[pos % 4];
                let kind = if pos < 8 {
                    FaultKind::BadChecksum
                } else {
                    FaultKind::ExpectedValue
                };
                (byte != expected).then_some(Fault {
                    kind,
                    expected: Some(expected),
                })
            }
            _ => None,
        }
    }

    fn boot_area(&self) -> Vec<u8> {
        let mut area = Vec::with_capacity(2 * SECTOR_SIZE);
        for nr in 0..2 {
            if let Some(data) = self.image.read_block(nr) {
                area.extend_from_slice(data);
            }
        }
        area
    }

    fn is_bootable(&self) -> bool {
        self.boot_area().iter().skip(12).any(|&b| b != 0)
    }

    fn check_root(&self, data: &[u8], word: Word) -> Option<Verdict> {
        let value = block::get32(data, word);
        match word {
            0 => expect(value, T_HEADER, FaultKind::ExpectedValue),
            1 | 2 | 4 | -4 | -3 => expect(value, 0, FaultKind::ExpectedValue),
            3 => expect(value, HASH_TABLE_SIZE, FaultKind::ExpectedValue),
            5 => expect(value, block::header_checksum(data, 5), FaultKind::BadChecksum),
            -122..=-51 => bad_if(
                value != 0 && !self.is_hash_target(value),
                FaultKind::ExpectedHashRef,
            ),
            -50 if self.strict => expect(value, u32::MAX, FaultKind::ExpectedValue),
            -49 if value == 0 => Some(Verdict::Bad(FaultKind::ExpectedRef)),
            -49..=-25 => bad_if(
                value != 0 && !self.bitmaps.contains(&value),
                FaultKind::ExpectedBitmapRef,
            ),
            -24 => bad_if(value != 0, FaultKind::ExpectedNoRef),
            -1 => expect(value, ST_ROOT, FaultKind::ExpectedValue),
            _ => None,
        }
    }

    fn check_user_dir(&self, nr: u32, data: &[u8], word: Word) -> Option<Verdict> {
        let value = block::get32(data, word);
        match word {
            0 => expect(value, T_HEADER, FaultKind::ExpectedValue),
            1 => expect(value, nr, FaultKind::ExpectedSelfRef),
            2..=4 => expect(value, 0, FaultKind::ExpectedValue),
            5 => expect(value, block::header_checksum(data, 5), FaultKind::BadChecksum),
            -122..=-51 => bad_if(
                value != 0 && !self.is_hash_target(value),
                FaultKind::ExpectedHashRef,
            ),
            -4 if self.strict => bad_if(
                value != 0 && !self.is_hash_target(value),
                FaultKind::ExpectedHashRef,
            ),
            -3 if self.strict => bad_if(!self.is_parent(value), FaultKind::ExpectedParentRef),
            -1 => expect(value, ST_USERDIR, FaultKind::ExpectedValue),
            _ => None,
        }
    }

    fn check_file_header(&self, nr: u32, data: &[u8], word: Word) -> Option<Verdict> {
        let value = block::get32(data, word);
        match word {
            0 => expect(value, T_HEADER, FaultKind::ExpectedValue),
            1 => expect(value, nr, FaultKind::ExpectedSelfRef),
            3 => expect(value, 0, FaultKind::ExpectedValue),
            4 => bad_if(
                value != 0 && !self.is_data_ref(value),
                FaultKind::ExpectedDataBlockRef,
            ),
            5 => expect(value, block::header_checksum(data, 5), FaultKind::BadChecksum),
            -122..=-51 => self.check_data_ref_table(data, word, value),
            -50 => expect(value, 0, FaultKind::ExpectedValue),
            -4 if self.strict => bad_if(
                value != 0 && !self.is_hash_target(value),
                FaultKind::ExpectedHashRef,
            ),
            -3 if self.strict => bad_if(!self.is_parent(value), FaultKind::ExpectedParentRef),
            -2 => bad_if(
                value != 0 && self.block_kind(value) != BlockKind::FileList,
                FaultKind::ExpectedFileListRef,
            ),
            -1 => expect(value, ST_FILE, FaultKind::ExpectedValue),
            _ => None,
        }
    }

    fn check_file_list(&self, nr: u32, data: &[u8], word: Word) -> Option<Verdict> {
        let value = block::get32(data, word);
        match word {
            0 => expect(value, T_LIST, FaultKind::ExpectedValue),
            1 => expect(value, nr, FaultKind::ExpectedSelfRef),
            3 | 4 => expect(value, 0, FaultKind::ExpectedValue),
            5 => expect(value, block::header_checksum(data, 5), FaultKind::BadChecksum),
            -122..=-51 => self.check_data_ref_table(data, word, value),
            -3 if self.strict => bad_if(
                self.block_kind(value) != BlockKind::FileHeader,
                FaultKind::ExpectedFileHeaderRef,
            ),
            -2 => bad_if(
                value != 0 && self.block_kind(value) != BlockKind::FileList,
                FaultKind::ExpectedFileListRef,
            ),
            -1 => expect(value, ST_FILE, FaultKind::ExpectedValue),
            _ => None,
        }
    }

    /// Data block pointers, stored from long -51 backwards. Long 2 holds
    /// how many are in use.
    fn check_data_ref_table(&self, data: &[u8], word: Word, value: u32) -> Option<Verdict> {
        let count = block::get32(data, 2);
        if word == -51 {
            if value == 0 && count > 0 {
                return Some(Verdict::Bad(FaultKind::ExpectedRef));
            }
            if value != 0 && count == 0 {
                return Some(Verdict::Bad(FaultKind::ExpectedNoRef));
            }
        }
        bad_if(
            value != 0 && !self.is_data_ref(value),
            FaultKind::ExpectedDataBlockRef,
        )
    }

    fn check_ofs_data(&self, data: &[u8], word: Word) -> Option<Verdict> {
        let value = block::get32(data, word);
        match word {
            0 => expect(value, T_DATA, FaultKind::ExpectedValue),
            1 => bad_if(
                self.block_kind(value) != BlockKind::FileHeader,
                FaultKind::ExpectedFileHeaderRef,
            ),
            3 => bad_if(value > OFS_DATA_SIZE, FaultKind::ValueTooLarge),
            4 => bad_if(
                value != 0 && !self.is_data_ref(value),
                FaultKind::ExpectedDataBlockRef,
            ),
            5 => expect(value, block::header_checksum(data, 5), FaultKind::BadChecksum),
            _ => None,
        }
    }

    fn in_volume(&self, nr: u32) -> bool {
        nr > 1 && nr < self.image.num_blocks()
    }

    fn is_hash_target(&self, nr: u32) -> bool {
        self.in_volume(nr)
            && matches!(self.block_kind(nr), BlockKind::UserDir | BlockKind::FileHeader)
    }

    fn is_parent(&self, nr: u32) -> bool {
        self.in_volume(nr) && matches!(self.block_kind(nr), BlockKind::Root | BlockKind::UserDir)
    }

    fn is_data_ref(&self, nr: u32) -> bool {
        if !self.in_volume(nr) {
            return false;
        }
        match self.block_kind(nr) {
            BlockKind::DataOfs => !self.ffs,
            BlockKind::DataFfs | BlockKind::Empty => self.ffs,
            _ => false,
        }
    }
}

impl<I: SectorImage + ?Sized> IntegrityOracle for AmigaDosChecker<'_, I> {
    type Error = Infallible;

    fn corrupted_blocks(&self) -> Result<Vec<u32>, Infallible> {
        Ok(self.corrupted())
    }

    fn is_corrupted(&self, block: u32) -> Result<bool, Infallible> {
        Ok(self.check_block(block) > 0)
    }
}
