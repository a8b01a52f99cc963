//! Exporting images back to raw sector dumps.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use log::info;
use serde::Serialize;

use crate::{DiskImage, ImageError, ImageKind, SectorImage};

/// Output file formats. All of them are raw dumps; they differ only in
/// which disks they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportFormat {
    Adf,
    Img,
    Ima,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Adf, ExportFormat::Img, ExportFormat::Ima];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Adf => "adf",
            Self::Img => "img",
            Self::Ima => "ima",
        }
    }

    /// Case-insensitive lookup by file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    pub fn is_compatible(self, kind: ImageKind) -> bool {
        matches!(
            (self, kind),
            (Self::Adf, ImageKind::Adf) | (Self::Img | Self::Ima, ImageKind::Img)
        )
    }

    /// Formats an image of `kind` can be exported to, in menu order.
    pub fn compatible_with(kind: ImageKind) -> impl Iterator<Item = ExportFormat> {
        Self::ALL.into_iter().filter(move |f| f.is_compatible(kind))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adf => "ADF",
            Self::Img => "IMG",
            Self::Ima => "IMA",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| format!("unknown export format: {s}"))
    }
}

impl DiskImage {
    pub fn export<W: Write>(&self, format: ExportFormat, out: &mut W) -> Result<(), ImageError> {
        let kind = self.kind();
        if !format.is_compatible(kind) {
            return Err(ImageError::IncompatibleFormat { kind, format });
        }
        out.write_all(self.data())?;
        out.flush()?;
        Ok(())
    }

    pub fn export_to_path(&self, format: ExportFormat, path: &Path) -> Result<(), ImageError> {
        let kind = self.kind();
        if !format.is_compatible(kind) {
            return Err(ImageError::IncompatibleFormat { kind, format });
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.export(format, &mut out)?;
        info!("exported {kind} image as {format} to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ADF_SIZE_DD, IMG_SIZE_DD};

    #[test]
    fn extension_lookup_ignores_case() {
        assert_eq!(ExportFormat::from_extension("ADF"), Some(ExportFormat::Adf));
        assert_eq!(ExportFormat::from_extension("ima"), Some(ExportFormat::Ima));
        assert_eq!(ExportFormat::from_extension("dms"), None);
        assert_eq!("Img".parse::<ExportFormat>(), Ok(ExportFormat::Img));
    }

    #[test]
    fn compatibility_matrix() {
        let adf: Vec<_> = ExportFormat::compatible_with(ImageKind::Adf).collect();
        assert_eq!(adf, [ExportFormat::Adf]);
        let img: Vec<_> = ExportFormat::compatible_with(ImageKind::Img).collect();
        assert_eq!(img, [ExportFormat::Img, ExportFormat::Ima]);
    }

    #[test]
    fn export_writes_raw_dump() {
        let mut data = vec![0; ADF_SIZE_DD];
        data[0] = b'D';
        data[ADF_SIZE_DD - 1] = 0x5A;
        let image = DiskImage::from_bytes(data.clone()).expect("adf");
        let mut out: Vec<u8> = Vec::new();
        image.export(ExportFormat::Adf, &mut out).expect("export");
        assert_eq!(out, data);
    }

    #[test]
    fn export_rejects_incompatible_format() {
        let image = DiskImage::from_bytes(vec![0; IMG_SIZE_DD]).expect("img");
        let mut out: Vec<u8> = Vec::new();
        assert!(matches!(
            image.export(ExportFormat::Adf, &mut out),
            Err(ImageError::IncompatibleFormat {
                kind: ImageKind::Img,
                format: ExportFormat::Adf
            })
        ));
        assert!(out.is_empty());
    }
}
