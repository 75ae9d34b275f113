//! Layered raster data engine with ASCII grid, GeoTIFF and blob store persistence.

pub use inf;
pub use raster;
#[cfg(feature = "gridfs")]
pub use sqlite;
