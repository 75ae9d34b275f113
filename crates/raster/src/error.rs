use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Infra(#[from] inf::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("Unknown header field: {0}")]
    UnknownHeaderField(String),
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),
    #[error("Unsupported raster format: {0}")]
    UnsupportedFormat(String),
    #[error("Blob not found: {0}")]
    BlobNotFound(String),
    #[error("Grid size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[cfg(feature = "geotiff")]
    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::Infra(inf::Error::from(err))
    }
}
