//! Whole-volume checks on freshly formatted and deliberately damaged disks.

use format_adf::{Adf, DiskImage, IMG_SIZE_DD, SECTOR_SIZE, SectorImage};
use fs_integrity::block::{self, ST_FILE, T_DATA, T_HEADER};
use fs_integrity::{
    AmigaDosChecker, BlockKind, CheckError, CorruptionNavigator, DosType, ErrorReport, FaultKind,
    IntegrityOracle, format_volume,
};

fn formatted(dos: DosType) -> Adf {
    let mut adf = Adf::blank_dd();
    format_volume(&mut adf, dos, "Test").expect("format");
    adf
}

fn patch(adf: &mut Adf, nr: u32, edit: impl FnOnce(&mut [u8; SECTOR_SIZE])) {
    let mut data = [0u8; SECTOR_SIZE];
    data.copy_from_slice(adf.read_block(nr).expect("in range"));
    edit(&mut data);
    adf.write_block(nr, &data).expect("in range");
}

fn seal(data: &mut [u8; SECTOR_SIZE]) {
    let sum = block::header_checksum(data, 5);
    block::set32(data, 5, sum);
}

/// Flip a block's allocation bit in the (single) bitmap block and reseal it.
fn toggle_allocation(adf: &mut Adf, nr: u32) {
    let (page, byte, mask) = block::allocation_bit(nr).expect("tracked block");
    assert_eq!(page, 0);
    patch(adf, 881, |m| {
        m[byte] ^= mask;
        let sum = block::header_checksum(m, 0);
        block::set32(m, 0, sum);
    });
}

/// Adds an OFS file "a" with one data block at 900 under the root, without
/// touching the bitmap.
fn add_unallocated_ofs_file(adf: &mut Adf) {
    patch(adf, 882, |h| {
        block::set32(h, 0, T_HEADER);
        block::set32(h, 1, 882);
        block::set32(h, 2, 1);
        block::set32(h, 4, 900);
        block::set32(h, -51, 900);
        block::set32(h, -3, 880);
        block::set32(h, -1, ST_FILE);
        seal(h);
    });
    patch(adf, 900, |d| {
        block::set32(d, 0, T_DATA);
        block::set32(d, 1, 882);
        block::set32(d, 2, 1);
        block::set32(d, 3, 5);
        d[24..29].copy_from_slice(b"hello");
        seal(d);
    });
    patch(adf, 880, |r| {
        block::set32(r, 6 + 10, 882);
        seal(r);
    });
}

/// As above, with both blocks marked in use.
fn add_ofs_file(adf: &mut Adf) {
    add_unallocated_ofs_file(adf);
    toggle_allocation(adf, 882);
    toggle_allocation(adf, 900);
}

#[test]
fn fresh_volume_is_clean_in_both_modes() {
    for dos in [DosType::Ofs, DosType::Ffs] {
        let adf = formatted(dos);
        for strict in [false, true] {
            let checker = AmigaDosChecker::new(&adf, strict).expect("dos volume");
            assert_eq!(checker.check(), ErrorReport::default(), "{dos:?} strict={strict}");
            assert_eq!(checker.corrupted_count(), Ok(0));
        }
    }
}

#[test]
fn classifies_blocks() {
    let mut adf = formatted(DosType::Ofs);
    add_ofs_file(&mut adf);
    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    assert_eq!(checker.block_kind(0), BlockKind::Boot);
    assert_eq!(checker.block_kind(880), BlockKind::Root);
    assert_eq!(checker.block_kind(881), BlockKind::Bitmap);
    assert_eq!(checker.block_kind(882), BlockKind::FileHeader);
    assert_eq!(checker.block_kind(900), BlockKind::DataOfs);
    assert_eq!(checker.block_kind(1000), BlockKind::Empty);
    assert_eq!(checker.description(), "OFS \"Test\"");
    assert_eq!(checker.check().corrupted_blocks, 0);
}

#[test]
fn broken_checksum_marks_only_that_block() {
    let mut adf = formatted(DosType::Ofs);
    add_ofs_file(&mut adf);
    patch(&mut adf, 900, |d| d[100] ^= 0xFF);

    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    let report = checker.check();
    assert_eq!(
        report,
        ErrorReport {
            corrupted_blocks: 1,
            first_error_block: Some(900),
            last_error_block: Some(900),
            bitmap_errors: 0,
        }
    );

    let fault = (20..24)
        .find_map(|pos| checker.check_byte(900, pos))
        .expect("checksum fault");
    assert_eq!(fault.kind, FaultKind::BadChecksum);
    assert!(fault.expected.is_some());
    assert!(checker.check_byte(900, 100).is_none());
}

#[test]
fn expected_byte_is_reported() {
    let mut adf = formatted(DosType::Ofs);
    patch(&mut adf, 880, |r| {
        block::set32(r, -1, 7);
        seal(r);
    });
    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    let fault = checker.check_byte(880, 511).expect("secondary type fault");
    assert_eq!(fault.kind, FaultKind::ExpectedValue);
    assert_eq!(fault.expected, Some(1));
    // Upper bytes of the long already match
    assert!(checker.check_byte(880, 508).is_none());
}

#[test]
fn strict_mode_checks_parent_links() {
    let mut adf = formatted(DosType::Ofs);
    add_ofs_file(&mut adf);
    // Point the file's parent at a data block
    patch(&mut adf, 882, |h| {
        block::set32(h, -3, 900);
        seal(h);
    });

    let lenient = AmigaDosChecker::new(&adf, false).expect("dos volume");
    assert!(lenient.check().is_clean());

    let strict = AmigaDosChecker::new(&adf, true).expect("dos volume");
    assert_eq!(strict.corrupted_blocks(), Ok(vec![882]));
    let fault = strict.check_byte(882, 500).expect("parent fault");
    assert_eq!(fault.kind, FaultKind::ExpectedParentRef);
}

#[test]
fn strict_mode_checks_installed_boot_block() {
    let mut adf = formatted(DosType::Ofs);
    // Boot code without a matching checksum
    patch(&mut adf, 0, |b| b[12] = 0x60);

    let lenient = AmigaDosChecker::new(&adf, false).expect("dos volume");
    assert_eq!(lenient.is_corrupted(0), Ok(false));

    let strict = AmigaDosChecker::new(&adf, true).expect("dos volume");
    assert_eq!(strict.is_corrupted(0), Ok(true));
    assert_eq!(
        strict.check_byte(0, 4).map(|f| f.kind),
        Some(FaultKind::BadChecksum)
    );
}

#[test]
fn navigator_walks_checker_results() {
    let mut adf = formatted(DosType::Ofs);
    add_ofs_file(&mut adf);
    patch(&mut adf, 882, |h| h[300] = 1);
    patch(&mut adf, 900, |d| d[300] = 1);
    patch(&mut adf, 881, |m| m[200] ^= 1);

    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    let nav = CorruptionNavigator::new(&checker);
    assert_eq!(nav.next(0).expect("corrupt"), 881);
    assert_eq!(nav.next(881).expect("corrupt"), 882);
    assert_eq!(nav.next(882).expect("corrupt"), 900);
    assert_eq!(nav.next(900).expect("corrupt"), 881);
    assert_eq!(nav.prev(881).expect("corrupt"), 900);
    assert_eq!(nav.ordinal(900), Ok(Some(3)));
}

#[test]
fn bitmap_disagreements_are_counted() {
    let mut adf = formatted(DosType::Ofs);
    toggle_allocation(&mut adf, 1000);

    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    assert!(!checker.is_free(1000));
    assert!(checker.is_free(1001));
    let report = checker.check();
    assert_eq!(report.bitmap_errors, 1);
    assert_eq!(report.corrupted_blocks, 0);
    assert!(!report.is_clean());

    // Restoring the bit makes the volume consistent again
    toggle_allocation(&mut adf, 1000);
    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    assert_eq!(checker.check(), ErrorReport::default());
}

#[test]
fn used_blocks_marked_free_are_counted() {
    let mut adf = formatted(DosType::Ofs);
    add_unallocated_ofs_file(&mut adf);
    let checker = AmigaDosChecker::new(&adf, false).expect("dos volume");
    assert!(checker.is_free(882));
    assert_eq!(checker.bitmap_errors(), 2);
    assert_eq!(checker.check().corrupted_blocks, 0);

    // Boot, root and bitmap blocks are never free
    for nr in [0, 1, 880, 881] {
        assert!(!checker.is_free(nr), "block {nr}");
    }
}

#[test]
fn non_dos_images_are_rejected() {
    let image = DiskImage::from_bytes(vec![0; IMG_SIZE_DD]).expect("img");
    assert!(matches!(
        AmigaDosChecker::new(&image, false),
        Err(CheckError::NotDosVolume([0, 0, 0, 0]))
    ));
}

#[test]
fn report_serializes() {
    let report = ErrorReport::from_blocks(&[3, 9]);
    let json = serde_json::to_value(report).expect("json");
    assert_eq!(json["corrupted_blocks"], 2);
    assert_eq!(json["first_error_block"], 3);
    assert_eq!(json["last_error_block"], 9);
    assert_eq!(json["bitmap_errors"], 0);
}
