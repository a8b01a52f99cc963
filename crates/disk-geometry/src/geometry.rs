//! Geometry model and coordinate conversions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// One of the five coordinate axes of a disk position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Cylinder,
    Head,
    Track,
    Sector,
    Block,
}

impl Axis {
    pub const ALL: [Axis; 5] = [
        Axis::Cylinder,
        Axis::Head,
        Axis::Track,
        Axis::Sector,
        Axis::Block,
    ];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Cylinder => "cylinder",
            Axis::Head => "head",
            Axis::Track => "track",
            Axis::Sector => "sector",
            Axis::Block => "block",
        };
        f.write_str(name)
    }
}

/// Physical layout of a disk. Immutable once a disk is opened.
///
/// Addressing requires the block count to fit in a `u32`; larger
/// geometries are rejected with [`GeometryError::TooManyBlocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiskGeometry {
    pub cylinders: u32,
    pub heads: u32,
    pub sectors_per_track: u32,
}

/// A disk position expressed in every addressing scheme at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockAddress {
    pub cylinder: u32,
    pub head: u32,
    pub track: u32,
    pub sector: u32,
    pub block: u32,
}

impl BlockAddress {
    /// Component value for one axis.
    pub fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Cylinder => self.cylinder,
            Axis::Head => self.head,
            Axis::Track => self.track,
            Axis::Sector => self.sector,
            Axis::Block => self.block,
        }
    }
}

impl fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} (cyl {}, head {}, track {}, sector {})",
            self.block, self.cylinder, self.head, self.track, self.sector
        )
    }
}

impl DiskGeometry {
    /// Amiga double-density floppy (880K ADF).
    pub const AMIGA_DD: Self = Self::new(80, 2, 11);
    /// Amiga high-density floppy (1760K ADF).
    pub const AMIGA_HD: Self = Self::new(80, 2, 22);
    /// PC 720K floppy.
    pub const PC_DD: Self = Self::new(80, 2, 9);
    /// PC 1.44M floppy.
    pub const PC_HD: Self = Self::new(80, 2, 18);

    pub const fn new(cylinders: u32, heads: u32, sectors_per_track: u32) -> Self {
        Self {
            cylinders,
            heads,
            sectors_per_track,
        }
    }

    /// Track count, or `None` if it does not fit in a `u32`.
    pub const fn checked_tracks(&self) -> Option<u32> {
        self.cylinders.checked_mul(self.heads)
    }

    /// Block count, or `None` if it does not fit in a `u32`.
    pub const fn checked_blocks(&self) -> Option<u32> {
        match self.checked_tracks() {
            Some(tracks) => tracks.checked_mul(self.sectors_per_track),
            None => None,
        }
    }

    /// Track count, saturating at `u32::MAX`.
    pub const fn tracks(&self) -> u32 {
        self.cylinders.saturating_mul(self.heads)
    }

    /// Block count, saturating at `u32::MAX`.
    pub const fn blocks(&self) -> u32 {
        self.tracks().saturating_mul(self.sectors_per_track)
    }

    /// True when at least one axis is empty and no block is addressable.
    pub fn is_degenerate(&self) -> bool {
        self.cylinders == 0 || self.heads == 0 || self.sectors_per_track == 0
    }

    /// Number of valid values on an axis. Valid values are `0..upper`.
    pub fn upper_bound(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Cylinder => self.cylinders,
            Axis::Head => self.heads,
            Axis::Track => self.tracks(),
            Axis::Sector => self.sectors_per_track,
            Axis::Block => self.blocks(),
        }
    }

    /// Saturate any input into `0..upper` for the axis. Never fails; an
    /// empty axis yields 0.
    pub fn clamp(&self, value: i64, axis: Axis) -> u32 {
        let upper = self.upper_bound(axis);
        if upper == 0 || value <= 0 {
            return 0;
        }
        let max = upper - 1;
        u32::try_from(value).map_or(max, |v| v.min(max))
    }

    /// Strict range check for one axis.
    pub fn validate(&self, value: u32, axis: Axis) -> Result<u32, GeometryError> {
        let upper = self.upper_bound(axis);
        if value < upper {
            Ok(value)
        } else {
            Err(GeometryError::OutOfRange { axis, value, upper })
        }
    }

    /// Fails for degenerate geometries and for geometries whose block count
    /// overflows. Every other method that converts coordinates relies on it.
    pub fn ensure_usable(&self) -> Result<(), GeometryError> {
        if self.is_degenerate() {
            return Err(GeometryError::DegenerateGeometry);
        }
        if self.checked_blocks().is_none() {
            return Err(GeometryError::TooManyBlocks(*self));
        }
        Ok(())
    }

    pub fn from_block(&self, block: u32) -> Result<BlockAddress, GeometryError> {
        self.ensure_usable()?;
        self.validate(block, Axis::Block)?;
        Ok(self.locate(block))
    }

    pub fn from_cylinder_head(
        &self,
        cylinder: u32,
        head: u32,
        sector: u32,
    ) -> Result<BlockAddress, GeometryError> {
        self.ensure_usable()?;
        self.validate(cylinder, Axis::Cylinder)?;
        self.validate(head, Axis::Head)?;
        self.validate(sector, Axis::Sector)?;
        let track = cylinder * self.heads + head;
        Ok(BlockAddress {
            cylinder,
            head,
            track,
            sector,
            block: track * self.sectors_per_track + sector,
        })
    }

    pub fn from_track_sector(
        &self,
        track: u32,
        sector: u32,
    ) -> Result<BlockAddress, GeometryError> {
        self.ensure_usable()?;
        self.validate(track, Axis::Track)?;
        self.validate(sector, Axis::Sector)?;
        Ok(self.locate(track * self.sectors_per_track + sector))
    }

    /// Byte offset of a block inside a raw sector dump.
    pub fn byte_offset(&self, block: u32, block_size: usize) -> Result<usize, GeometryError> {
        self.ensure_usable()?;
        self.validate(block, Axis::Block)?;
        Ok(block as usize * block_size)
    }

    /// Unchecked conversion. Callers guarantee a usable geometry and
    /// `block < blocks()`.
    pub(crate) fn locate(&self, block: u32) -> BlockAddress {
        let track = block / self.sectors_per_track;
        BlockAddress {
            cylinder: track / self.heads,
            head: track % self.heads,
            track,
            sector: block % self.sectors_per_track,
            block,
        }
    }
}

impl fmt::Display for DiskGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cylinders, {} heads, {} sectors ({} blocks)",
            self.cylinders,
            self.heads,
            self.sectors_per_track,
            self.blocks()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amiga_dd_counts() {
        let geo = DiskGeometry::AMIGA_DD;
        assert_eq!(geo.tracks(), 160);
        assert_eq!(geo.blocks(), 1760);
    }

    #[test]
    fn first_and_last_block() {
        let geo = DiskGeometry::AMIGA_DD;
        let first = geo.from_block(0).expect("valid");
        assert_eq!(first, BlockAddress::default());

        let last = geo.from_block(1759).expect("valid");
        assert_eq!(
            last,
            BlockAddress {
                cylinder: 79,
                head: 1,
                track: 159,
                sector: 10,
                block: 1759,
            }
        );
    }

    #[test]
    fn round_trip_every_block() {
        for geo in [
            DiskGeometry::AMIGA_DD,
            DiskGeometry::AMIGA_HD,
            DiskGeometry::PC_HD,
            DiskGeometry::new(3, 1, 5),
            DiskGeometry::new(1, 4, 1),
        ] {
            for block in 0..geo.blocks() {
                let a = geo.from_block(block).expect("in range");
                assert_eq!(a.track, a.cylinder * geo.heads + a.head);
                let back = geo
                    .from_cylinder_head(a.cylinder, a.head, a.sector)
                    .expect("in range");
                assert_eq!(back.block, block, "{geo}");
                assert_eq!(back, a);
                assert_eq!(geo.from_track_sector(a.track, a.sector), Ok(a));
            }
        }
    }

    #[test]
    fn block_past_end_is_out_of_range() {
        let geo = DiskGeometry::AMIGA_DD;
        assert_eq!(
            geo.from_block(1760),
            Err(GeometryError::OutOfRange {
                axis: Axis::Block,
                value: 1760,
                upper: 1760,
            })
        );
        assert!(matches!(
            geo.from_cylinder_head(0, 2, 0),
            Err(GeometryError::OutOfRange { axis: Axis::Head, .. })
        ));
        assert!(matches!(
            geo.from_cylinder_head(0, 0, 11),
            Err(GeometryError::OutOfRange { axis: Axis::Sector, .. })
        ));
    }

    #[test]
    fn degenerate_geometry_rejects_everything() {
        for geo in [
            DiskGeometry::new(0, 2, 11),
            DiskGeometry::new(80, 0, 11),
            DiskGeometry::new(80, 2, 0),
        ] {
            assert!(geo.is_degenerate());
            assert_eq!(geo.from_block(0), Err(GeometryError::DegenerateGeometry));
            assert_eq!(
                geo.from_cylinder_head(0, 0, 0),
                Err(GeometryError::DegenerateGeometry)
            );
            assert_eq!(geo.from_track_sector(0, 0), Err(GeometryError::DegenerateGeometry));
        }
    }

    #[test]
    fn clamp_saturates() {
        let geo = DiskGeometry::AMIGA_DD;
        let inputs = [i64::MIN, -1_000_000, -1, 0, 1, 10, 11, 79, 80, 1759, 1760, i64::MAX];
        for axis in Axis::ALL {
            let upper = geo.upper_bound(axis);
            for value in inputs {
                let c = geo.clamp(value, axis);
                assert!(c < upper, "{axis} {value} -> {c}");
            }
            assert_eq!(geo.clamp(-1, axis), 0);
            assert_eq!(geo.clamp(i64::MAX, axis), upper - 1);
        }
        assert_eq!(geo.clamp(5, Axis::Sector), 5);
        assert_eq!(geo.clamp(12, Axis::Sector), 10);
    }

    #[test]
    fn clamp_empty_axis_is_zero() {
        let geo = DiskGeometry::new(0, 2, 11);
        assert_eq!(geo.clamp(42, Axis::Cylinder), 0);
        assert_eq!(geo.clamp(42, Axis::Block), 0);
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        let geo = DiskGeometry::new(70_000, 70_000, 1);
        assert_eq!(geo.checked_tracks(), None);
        let err = Err(GeometryError::TooManyBlocks(geo));
        assert_eq!(geo.from_cylinder_head(69_999, 69_999, 0), err);
        assert_eq!(geo.from_track_sector(0, 0), err);
        assert_eq!(geo.from_block(0), err);
        assert_eq!(geo.byte_offset(0, 512), Err(GeometryError::TooManyBlocks(geo)));

        // Tracks fit, blocks do not
        let geo = DiskGeometry::new(65_536, 1, 65_536);
        assert_eq!(geo.checked_tracks(), Some(65_536));
        assert_eq!(geo.checked_blocks(), None);
        assert_eq!(
            geo.from_cylinder_head(65_535, 0, 65_535),
            Err(GeometryError::TooManyBlocks(geo))
        );
    }

    #[test]
    fn largest_geometry_still_converts() {
        // 65_535 * 65_537 = u32::MAX
        let geo = DiskGeometry::new(65_535, 1, 65_537);
        assert_eq!(geo.checked_blocks(), Some(u32::MAX));
        let last = geo
            .from_cylinder_head(65_534, 0, 65_536)
            .expect("in range");
        assert_eq!(last.block, u32::MAX - 1);
        assert_eq!(geo.from_block(u32::MAX - 1), Ok(last));
    }

    #[test]
    fn byte_offset_matches_sector_layout() {
        let geo = DiskGeometry::AMIGA_DD;
        // Cylinder 1, head 0, sector 3 is block 25
        assert_eq!(geo.byte_offset(25, 512), Ok(25 * 512));
        assert!(geo.byte_offset(1760, 512).is_err());
    }
}
