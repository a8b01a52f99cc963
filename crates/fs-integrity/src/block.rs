//! AmigaDOS block layout.
//!
//! Every block is 128 big-endian longwords. Header-style blocks keep their
//! type in long 0, a checksum in long 5 and a secondary type in long 127.
//! Fields near the end of a block are usually described by negative long
//! indices (`-1` = long 127), which is how [`Word`] addresses them.

use std::fmt;

use format_adf::SECTOR_SIZE;
use serde::Serialize;

pub const LONGS: usize = SECTOR_SIZE / 4;

pub const T_HEADER: u32 = 2;
pub const T_DATA: u32 = 8;
pub const T_LIST: u32 = 16;
pub const ST_ROOT: u32 = 1;
pub const ST_USERDIR: u32 = 2;
pub const ST_FILE: u32 = (-3i32) as u32;

/// Root directory hash table size for 512-byte blocks.
pub const HASH_TABLE_SIZE: u32 = 72;
/// Byte offset of the root block's bitmap-valid flag.
pub const BM_FLAG_OFFSET: usize = SECTOR_SIZE - 200;
/// Byte offset of the root block's 25 bitmap block pointers.
pub const BM_PAGES_OFFSET: usize = SECTOR_SIZE - 196;
pub const BM_PAGES: usize = 25;
/// Byte offset of a volume or file name (BCPL string).
pub const NAME_OFFSET: usize = SECTOR_SIZE - 80;
/// Largest payload of an OFS data block.
pub const OFS_DATA_SIZE: u32 = 488;

/// Blocks tracked by one bitmap block (127 longs of 32 bits).
pub const BITS_PER_BITMAP: u32 = (LONGS as u32 - 1) * 32;

/// Where block `nr`'s allocation bit lives: bitmap page, byte offset within
/// that bitmap block, and bit mask. Blocks 0 and 1 are not in the map.
///
/// Bits count from the low end of each big-endian long after the checksum,
/// so the byte order inside a long is reversed. A set bit means free.
pub fn allocation_bit(nr: u32) -> Option<(usize, usize, u8)> {
    let bit = nr.checked_sub(2)?;
    let page = (bit / BITS_PER_BITMAP) as usize;
    let bit = bit % BITS_PER_BITMAP;
    let byte = 4 * (1 + (bit / 32) as usize) + 3 - (bit % 32 / 8) as usize;
    Some((page, byte, 1 << (bit % 8)))
}

/// Signed longword index: negative values count back from the block end.
pub type Word = i32;

pub fn word_of(byte: usize) -> Word {
    let word = (byte / 4) as Word;
    if word >= 6 { word - LONGS as Word } else { word }
}

fn index_of(word: Word) -> usize {
    if word < 0 {
        (LONGS as Word + word) as usize
    } else {
        word as usize
    }
}

pub fn get32(block: &[u8], word: Word) -> u32 {
    let i = index_of(word) * 4;
    u32::from_be_bytes([block[i], block[i + 1], block[i + 2], block[i + 3]])
}

pub fn set32(block: &mut [u8], word: Word, value: u32) {
    let i = index_of(word) * 4;
    block[i..i + 4].copy_from_slice(&value.to_be_bytes());
}

/// Header checksum: the value that makes all longs sum to zero.
pub fn header_checksum(block: &[u8], checksum_word: Word) -> u32 {
    let skip = index_of(checksum_word);
    let sum = (0..LONGS)
        .filter(|&i| i != skip)
        .fold(0u32, |acc, i| acc.wrapping_add(get32(block, i as Word)));
    sum.wrapping_neg()
}

/// Boot block checksum over both boot sectors, with end-around carry.
pub fn boot_checksum(boot: &[u8]) -> u32 {
    let mut sum = 0u32;
    for (i, chunk) in boot.chunks_exact(4).enumerate() {
        if i == 1 {
            continue;
        }
        let long = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let (next, carry) = sum.overflowing_add(long);
        sum = if carry { next.wrapping_add(1) } else { next };
    }
    !sum
}

/// What a block is used for, as far as its content and position tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Boot,
    Root,
    Bitmap,
    UserDir,
    FileHeader,
    FileList,
    DataOfs,
    DataFfs,
    Empty,
    Unknown,
}

impl BlockKind {
    /// Whether the block has structure the checker can verify.
    pub fn is_structured(self) -> bool {
        !matches!(self, Self::DataFfs | Self::Empty | Self::Unknown)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boot => "Boot block",
            Self::Root => "Root block",
            Self::Bitmap => "Bitmap block",
            Self::UserDir => "User directory block",
            Self::FileHeader => "File header block",
            Self::FileList => "File extension block",
            Self::DataOfs => "Data block (OFS)",
            Self::DataFfs => "Data block (FFS)",
            Self::Empty => "Empty block",
            Self::Unknown => "Unknown block type",
        })
    }
}

/// Meaning of the byte at `byte` inside a block of the given kind.
pub fn field_name(kind: BlockKind, byte: usize) -> &'static str {
    let word = word_of(byte);
    match kind {
        BlockKind::Boot => match byte {
            0..=2 => "DOS signature",
            3 => "File system flags",
            4..=7 => "Boot block checksum",
            8..=11 => "Root block reference",
            _ => "Boot code",
        },
        BlockKind::Bitmap => match word {
            0 => "Bitmap checksum",
            _ => "Allocation bits",
        },
        BlockKind::DataOfs => match word {
            0 => "Type identifier",
            1 => "File header reference",
            2 => "Sequence number",
            3 => "Data byte count",
            4 => "Next data block reference",
            5 => "Checksum",
            _ => "Data bytes",
        },
        BlockKind::DataFfs => "Data bytes",
        BlockKind::Empty | BlockKind::Unknown => "Unused",
        BlockKind::Root | BlockKind::UserDir | BlockKind::FileHeader | BlockKind::FileList => {
            match word {
                0 => "Type identifier",
                1 => "Self reference",
                2 if kind == BlockKind::Root => "Unused",
                2 => "Block count",
                3 if kind == BlockKind::Root => "Hash table size",
                4 => "First data block reference",
                5 => "Checksum",
                -122..=-51 if kind == BlockKind::FileHeader || kind == BlockKind::FileList => {
                    "Data block reference"
                }
                -122..=-51 => "Hash table reference",
                -50 if kind == BlockKind::Root => "Bitmap validity flag",
                -49..=-25 if kind == BlockKind::Root => "Bitmap block reference",
                -20..=-5 => "Name",
                -4 => "Next hash reference",
                -3 => "Parent directory reference",
                -2 => "Extension block reference",
                -1 => "Subtype identifier",
                _ => "Metadata",
            }
        }
    }
}
