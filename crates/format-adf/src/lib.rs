//! Raw sector disk images.
//!
//! ADF is a raw sector dump: 80 cylinders x 2 heads x 11 sectors x 512 bytes
//! = 901,120 bytes for double-density disks. HD disks double the sector count.
//! PC IMG/IMA images use the same layout with 9 (DD) or 18 (HD) sectors.
//!
//! Sectors are stored track by track, so a block's byte offset is simply
//! `block * 512`.

mod export;
mod img;

use disk_geometry::{BlockAddress, DiskGeometry, GeometryError};
use serde::Serialize;
use thiserror::Error;

pub use export::ExportFormat;
pub use img::{IMG_SIZE_DD, IMG_SIZE_HD, Img};

pub const SECTOR_SIZE: usize = 512;
pub const SECTORS_PER_TRACK_DD: u32 = 11;
pub const SECTORS_PER_TRACK_HD: u32 = 22;
pub const ADF_SIZE_DD: usize = DiskGeometry::AMIGA_DD.blocks() as usize * SECTOR_SIZE;
pub const ADF_SIZE_HD: usize = DiskGeometry::AMIGA_HD.blocks() as usize * SECTOR_SIZE;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid {kind} size: {size} bytes (expected {dd} for DD or {hd} for HD)")]
    InvalidSize {
        kind: ImageKind,
        size: usize,
        dd: usize,
        hd: usize,
    },
    #[error("unrecognised disk image size: {0} bytes")]
    UnknownSize(usize),
    #[error("cannot export {kind} image as {format}")]
    IncompatibleFormat { kind: ImageKind, format: ExportFormat },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which family an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageKind {
    /// Amiga disk.
    Adf,
    /// PC disk.
    Img,
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ImageKind::Adf => "ADF",
            ImageKind::Img => "IMG",
        })
    }
}

/// Block-level access to a raw sector dump.
///
/// Implementors only expose geometry and storage; addressing is shared.
pub trait SectorImage {
    fn geometry(&self) -> DiskGeometry;
    fn data(&self) -> &[u8];
    fn data_mut(&mut self) -> &mut [u8];

    fn num_blocks(&self) -> u32 {
        self.geometry().blocks()
    }

    /// Contents of one block, or `None` past the end of the disk.
    fn read_block(&self, block: u32) -> Option<&[u8]> {
        let start = self.geometry().byte_offset(block, SECTOR_SIZE).ok()?;
        self.data().get(start..start + SECTOR_SIZE)
    }

    fn write_block(&mut self, block: u32, data: &[u8; SECTOR_SIZE]) -> Result<(), GeometryError> {
        let start = self.geometry().byte_offset(block, SECTOR_SIZE)?;
        self.data_mut()[start..start + SECTOR_SIZE].copy_from_slice(data);
        Ok(())
    }

    /// A single byte of a block, as shown in a hex view.
    fn read_byte(&self, block: u32, offset: usize) -> Option<u8> {
        self.read_block(block)?.get(offset).copied()
    }

    fn read_sector(&self, cyl: u32, head: u32, sector: u32) -> Result<&[u8], GeometryError> {
        let address = self.geometry().from_cylinder_head(cyl, head, sector)?;
        let start = address.block as usize * SECTOR_SIZE;
        Ok(&self.data()[start..start + SECTOR_SIZE])
    }

    fn read_track_sectors(&self, cyl: u32, head: u32) -> Result<&[u8], GeometryError> {
        let first: BlockAddress = self.geometry().from_cylinder_head(cyl, head, 0)?;
        let start = first.block as usize * SECTOR_SIZE;
        let len = self.geometry().sectors_per_track as usize * SECTOR_SIZE;
        Ok(&self.data()[start..start + len])
    }
}

pub struct Adf {
    data: Vec<u8>,
    geometry: DiskGeometry,
}

impl Adf {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ImageError> {
        let geometry = match data.len() {
            ADF_SIZE_DD => DiskGeometry::AMIGA_DD,
            ADF_SIZE_HD => DiskGeometry::AMIGA_HD,
            size => {
                return Err(ImageError::InvalidSize {
                    kind: ImageKind::Adf,
                    size,
                    dd: ADF_SIZE_DD,
                    hd: ADF_SIZE_HD,
                });
            }
        };
        Ok(Self { data, geometry })
    }

    /// A zero-filled double-density disk.
    pub fn blank_dd() -> Self {
        Self {
            data: vec![0; ADF_SIZE_DD],
            geometry: DiskGeometry::AMIGA_DD,
        }
    }

    pub fn sectors_per_track(&self) -> u32 {
        self.geometry.sectors_per_track
    }

    pub fn is_hd(&self) -> bool {
        self.geometry == DiskGeometry::AMIGA_HD
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl SectorImage for Adf {
    fn geometry(&self) -> DiskGeometry {
        self.geometry
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Any supported image, as opened from a file.
pub enum DiskImage {
    Adf(Adf),
    Img(Img),
}

impl DiskImage {
    /// Recognise an image by its size.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ImageError> {
        match data.len() {
            ADF_SIZE_DD | ADF_SIZE_HD => Adf::from_bytes(data).map(Self::Adf),
            IMG_SIZE_DD | IMG_SIZE_HD => Img::from_bytes(data).map(Self::Img),
            size => Err(ImageError::UnknownSize(size)),
        }
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Adf(_) => ImageKind::Adf,
            Self::Img(_) => ImageKind::Img,
        }
    }

    pub fn as_adf(&self) -> Option<&Adf> {
        match self {
            Self::Adf(adf) => Some(adf),
            Self::Img(_) => None,
        }
    }

    /// Human-readable layout line, e.g. "Amiga DD disk, 80 cylinders, ...".
    pub fn layout_info(&self) -> String {
        let family = match self {
            Self::Adf(adf) if adf.is_hd() => "Amiga HD disk",
            Self::Adf(_) => "Amiga DD disk",
            Self::Img(img) if img.is_hd() => "PC HD disk",
            Self::Img(_) => "PC DD disk",
        };
        format!("{family}, {}", self.geometry())
    }
}

impl SectorImage for DiskImage {
    fn geometry(&self) -> DiskGeometry {
        match self {
            Self::Adf(adf) => adf.geometry(),
            Self::Img(img) => img.geometry(),
        }
    }

    fn data(&self) -> &[u8] {
        match self {
            Self::Adf(adf) => adf.data(),
            Self::Img(img) => img.data(),
        }
    }

    fn data_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Adf(adf) => adf.data_mut(),
            Self::Img(img) => img.data_mut(),
        }
    }
}
