use std::path::Path;

use crate::{AsciiGridCodec, Error, RasterHeader, RasterNum, RasterOptions, Result};

/// A full row-major grid as stored in a raster file, nodata cells included.
#[derive(Debug, Clone)]
pub struct GridData<T> {
    pub header: RasterHeader,
    pub options: RasterOptions,
    pub values: Vec<T>,
}

/// Reads and writes a single layer grid in a specific file format.
pub trait RasterCodec {
    fn read_grid<T: RasterNum>(&self, path: &Path) -> Result<GridData<T>>;

    /// `values` contains the full grid in row-major order.
    fn write_grid<T: RasterNum>(&self, path: &Path, header: &RasterHeader, options: &RasterOptions, values: &[T]) -> Result;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterFormat {
    AsciiGrid,
    GeoTiff,
}

impl RasterFormat {
    /// Given a file path, guess the raster format based on the file extension
    pub fn guess_from_path(path: &Path) -> Option<RasterFormat> {
        match inf::fs::suffix(path).as_str() {
            "asc" => Some(RasterFormat::AsciiGrid),
            "tif" | "tiff" => Some(RasterFormat::GeoTiff),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::AsciiGrid => "asc",
            RasterFormat::GeoTiff => "tif",
        }
    }

    /// Format used for paths with an unrecognized extension.
    pub fn fallback() -> RasterFormat {
        cfg_if::cfg_if! {
            if #[cfg(feature = "geotiff")] {
                RasterFormat::GeoTiff
            } else {
                RasterFormat::AsciiGrid
            }
        }
    }

    pub fn read_grid<T: RasterNum>(self, path: &Path) -> Result<GridData<T>> {
        match self {
            RasterFormat::AsciiGrid => AsciiGridCodec.read_grid(path),
            RasterFormat::GeoTiff => read_geotiff(path),
        }
    }

    pub fn write_grid<T: RasterNum>(self, path: &Path, header: &RasterHeader, options: &RasterOptions, values: &[T]) -> Result {
        match self {
            RasterFormat::AsciiGrid => AsciiGridCodec.write_grid(path, header, options, values),
            RasterFormat::GeoTiff => write_geotiff(path, header, options, values),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "geotiff")] {
        fn read_geotiff<T: RasterNum>(path: &Path) -> Result<GridData<T>> {
            crate::GeoTiffCodec.read_grid(path)
        }

        fn write_geotiff<T: RasterNum>(path: &Path, header: &RasterHeader, options: &RasterOptions, values: &[T]) -> Result {
            crate::GeoTiffCodec.write_grid(path, header, options, values)
        }
    } else {
        fn read_geotiff<T: RasterNum>(path: &Path) -> Result<GridData<T>> {
            Err(Error::UnsupportedFormat(format!("GeoTIFF support is disabled ({})", path.display())))
        }

        fn write_geotiff<T: RasterNum>(path: &Path, _header: &RasterHeader, _options: &RasterOptions, _values: &[T]) -> Result {
            Err(Error::UnsupportedFormat(format!("GeoTIFF support is disabled ({})", path.display())))
        }
    }
}

/// Reads a grid from a file, the format is derived from the file extension.
pub fn read_grid_from_file<T: RasterNum>(path: &Path) -> Result<GridData<T>> {
    match RasterFormat::guess_from_path(path) {
        Some(format) => format.read_grid(path),
        None => Err(Error::UnsupportedFormat(path.to_string_lossy().to_string())),
    }
}
