//! In-memory raster engine for single and multi layer grids.
//!
//! A [`RasterData`] owns either a flat array (one layer) or an array of per cell layer
//! values, a [`RasterHeader`] describing the grid geometry, free form [`RasterOptions`],
//! an optional [`PositionIndex`] mapping compact cell indices to grid rows and columns,
//! and lazily computed per layer statistics.
//!
//! Rasters are read from and written to ASCII grids, GeoTIFF files (feature `geotiff`)
//! and a GridFS style blob store (feature `gridfs`). Reads can be restricted by a mask
//! raster, which selects the cells to keep by coordinate correspondence.

mod ascii;
mod cell;
mod codec;
mod error;
#[cfg(feature = "geotiff")]
mod geotiff;
#[cfg(feature = "gridfs")]
pub mod gridfs;
mod header;
mod masking;
mod options;
mod position;
mod raster;
mod rasterio;
mod rasternum;
mod readoptions;
mod statistics;
mod storage;

#[cfg(test)]
mod rastertests;
#[cfg(test)]
mod testutils;

pub type Result<T = ()> = std::result::Result<T, Error>;

pub use ascii::AsciiGridCodec;
pub use cell::Cell;
pub use codec::{GridData, RasterCodec, RasterFormat};
pub use error::Error;
#[cfg(feature = "geotiff")]
pub use geotiff::GeoTiffCodec;
#[cfg(feature = "gridfs")]
pub use gridfs::{BlobStore, RetryPolicy};
pub use header::{HeaderField, NODATA_VALUE, RasterHeader};
pub use options::{RasterOptions, SRS_KEY};
pub use position::{Position, PositionIndex, PositionSource};
pub use raster::RasterData;
pub use rasternum::RasterNum;
pub use readoptions::ReadOptions;
pub use statistics::{LayerStatistics, StatisticKind};
pub use storage::Storage;
