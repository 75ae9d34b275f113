//! A lightweight sqlite wrapper on top of the sqlite3-sys crate, extended with a
//! GridFS style blob bucket that stores named binary blobs in fixed size chunks
//! together with a flat JSON metadata document.

mod connection;
mod gridfs;
mod row;
mod statement;

#[derive(Debug, Copy, Clone)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    Create,
}

pub use connection::Connection;
pub use gridfs::{BlobMetadata, CHUNK_SIZE, GridFs};
pub use row::Row;
pub use statement::Statement;

pub type Error = inf::Error;
pub type Result<T = ()> = inf::Result<T>;
