//! Writing an empty AmigaDOS file system onto an image.

use disk_geometry::GeometryError;
use format_adf::{SECTOR_SIZE, SectorImage};
use log::info;

use crate::block::{
    self, BITS_PER_BITMAP, BM_FLAG_OFFSET, BM_PAGES, BM_PAGES_OFFSET, HASH_TABLE_SIZE, NAME_OFFSET,
    ST_ROOT, T_HEADER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DosType {
    Ofs,
    Ffs,
}

impl DosType {
    fn flags(self) -> u8 {
        match self {
            Self::Ofs => 0,
            Self::Ffs => 1,
        }
    }
}

/// Format an image with an empty, non-bootable volume.
///
/// Layout: boot blocks 0-1, root block in the middle of the disk, bitmap
/// blocks right after the root. Names longer than 30 bytes are truncated.
pub fn format_volume<I: SectorImage + ?Sized>(
    image: &mut I,
    dos: DosType,
    name: &str,
) -> Result<(), GeometryError> {
    let blocks = image.num_blocks();
    if blocks < 4 {
        return Err(GeometryError::DegenerateGeometry);
    }
    image.data_mut().fill(0);

    let mut boot = [0u8; SECTOR_SIZE];
    boot[..3].copy_from_slice(b"DOS");
    boot[3] = dos.flags();
    image.write_block(0, &boot)?;

    let root = blocks / 2;
    let tracked = blocks - 2;
    let bitmap_count = tracked.div_ceil(BITS_PER_BITMAP).min(BM_PAGES as u32);
    let bitmaps: Vec<u32> = (root + 1..=root + bitmap_count).collect();

    let mut root_data = [0u8; SECTOR_SIZE];
    block::set32(&mut root_data, 0, T_HEADER);
    block::set32(&mut root_data, 3, HASH_TABLE_SIZE);
    block::set32(&mut root_data, block::word_of(BM_FLAG_OFFSET), u32::MAX);
    for (i, &nr) in bitmaps.iter().enumerate() {
        block::set32(&mut root_data, block::word_of(BM_PAGES_OFFSET + 4 * i), nr);
    }
    let name = &name.as_bytes()[..name.len().min(30)];
    root_data[NAME_OFFSET] = name.len() as u8;
    root_data[NAME_OFFSET + 1..=NAME_OFFSET + name.len()].copy_from_slice(name);
    block::set32(&mut root_data, -1, ST_ROOT);
    let sum = block::header_checksum(&root_data, 5);
    block::set32(&mut root_data, 5, sum);
    image.write_block(root, &root_data)?;

    let mut maps = vec![[0u8; SECTOR_SIZE]; bitmaps.len()];
    for nr in 2..blocks {
        if nr == root || bitmaps.contains(&nr) {
            continue;
        }
        if let Some((page, byte, mask)) = block::allocation_bit(nr) {
            if let Some(map) = maps.get_mut(page) {
                map[byte] |= mask;
            }
        }
    }
    for (map, &nr) in maps.iter_mut().zip(&bitmaps) {
        let sum = block::header_checksum(map, 0);
        block::set32(map, 0, sum);
        image.write_block(nr, map)?;
    }

    info!(
        "formatted {dos:?} volume \"{}\": root {root}, bitmap {bitmaps:?}",
        String::from_utf8_lossy(name)
    );
    Ok(())
}
