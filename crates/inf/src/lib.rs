//! Shared infrastructure for the raster engine crates: the common error type,
//! numeric comparison helpers and file system utilities.

pub use error::Error;
pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod cast;
mod error;
pub mod fs;

#[doc(inline)]
pub use cast::float_equal;
