//! PC (MS-DOS) floppy images.

use disk_geometry::DiskGeometry;

use crate::{ImageError, ImageKind, SECTOR_SIZE, SectorImage};

pub const IMG_SIZE_DD: usize = DiskGeometry::PC_DD.blocks() as usize * SECTOR_SIZE;
pub const IMG_SIZE_HD: usize = DiskGeometry::PC_HD.blocks() as usize * SECTOR_SIZE;

pub struct Img {
    data: Vec<u8>,
    geometry: DiskGeometry,
}

impl Img {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ImageError> {
        let geometry = match data.len() {
            IMG_SIZE_DD => DiskGeometry::PC_DD,
            IMG_SIZE_HD => DiskGeometry::PC_HD,
            size => {
                return Err(ImageError::InvalidSize {
                    kind: ImageKind::Img,
                    size,
                    dd: IMG_SIZE_DD,
                    hd: IMG_SIZE_HD,
                });
            }
        };
        Ok(Self { data, geometry })
    }

    pub fn is_hd(&self) -> bool {
        self.geometry == DiskGeometry::PC_HD
    }
}

impl SectorImage for Img {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(IMG_SIZE_DD, 737_280);
        assert_eq!(IMG_SIZE_HD, 1_474_560);
    }

    #[test]
    fn accept_pc_sizes() {
        let dd = Img::from_bytes(vec![0; IMG_SIZE_DD]).expect("valid");
        assert_eq!(dd.geometry().sectors_per_track, 9);
        assert!(!dd.is_hd());
        let hd = Img::from_bytes(vec![0; IMG_SIZE_HD]).expect("valid");
        assert_eq!(hd.num_blocks(), 2880);
    }

    #[test]
    fn reject_adf_size() {
        assert!(matches!(
            Img::from_bytes(vec![0; crate::ADF_SIZE_DD]),
            Err(ImageError::InvalidSize {
                kind: ImageKind::Img,
                ..
            })
        ));
    }
}
