use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{AccessMode, Connection, Error, Result};

/// Flat metadata document stored next to every blob.
pub type BlobMetadata = serde_json::Map<String, serde_json::Value>;

/// Blobs are split in chunks of this size, matching the GridFS default.
pub const CHUNK_SIZE: usize = 255 * 1024;

/// A named blob bucket backed by two sqlite tables: `<bucket>_files` holds one row
/// per blob (length, upload date and metadata), `<bucket>_chunks` holds the data.
///
/// Blobs are never overwritten in place: storing a name that already exists fails,
/// callers remove the previous blob first.
pub struct GridFs {
    conn: Connection,
    bucket: String,
}

impl GridFs {
    /// Opens (or creates) the database and the bucket tables.
    /// The connection is released when the bucket is dropped.
    pub fn open(db_path: &Path, bucket: &str) -> Result<Self> {
        if bucket.is_empty() || !bucket.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidArgument(format!("Invalid bucket name: '{bucket}'")));
        }

        let conn = Connection::new(db_path, AccessMode::Create)?;
        conn.execute_sql_statements(&bucket_schema(bucket))?;

        Ok(GridFs {
            conn,
            bucket: bucket.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        let stmt = self
            .conn
            .prepare_statement(&format!("SELECT 1 FROM {}_files WHERE name = ?1", self.bucket))?;
        stmt.bind_text(1, name)?;
        Ok(stmt.next_row()?.is_some())
    }

    pub fn put(&self, name: &str, data: &[u8], metadata: &BlobMetadata) -> Result<()> {
        if self.exists(name)? {
            return Err(Error::DatabaseError(format!(
                "Blob '{name}' already exists in bucket '{}'",
                self.bucket
            )));
        }

        let metadata = serde_json::to_string(metadata)
            .map_err(|e| Error::Runtime(format!("Failed to serialize metadata of '{name}' ({e})")))?;
        let upload_date = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        self.conn.transaction(|conn| {
            let files = conn.prepare_statement(&format!(
                "INSERT INTO {}_files (name, length, chunk_size, upload_date, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
                self.bucket
            ))?;
            files.bind_text(1, name)?;
            files.bind_int64(2, data.len() as i64)?;
            files.bind_int64(3, CHUNK_SIZE as i64)?;
            files.bind_int64(4, upload_date as i64)?;
            files.bind_text(5, &metadata)?;
            files.execute()?;

            let chunks = conn.prepare_statement(&format!(
                "INSERT INTO {}_chunks (files_name, n, data) VALUES (?1, ?2, ?3)",
                self.bucket
            ))?;
            for (n, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
                chunks.reset()?;
                chunks.bind_text(1, name)?;
                chunks.bind_int64(2, n as i64)?;
                chunks.bind_blob(3, chunk)?;
                chunks.execute()?;
            }

            Ok(())
        })?;

        log::debug!("Stored blob '{name}' ({} bytes) in bucket '{}'", data.len(), self.bucket);
        Ok(())
    }

    /// Fetches the blob data and its metadata, `None` when the name is unknown.
    pub fn get(&self, name: &str) -> Result<Option<(Vec<u8>, BlobMetadata)>> {
        let files = self.conn.prepare_statement(&format!(
            "SELECT length, metadata FROM {}_files WHERE name = ?1",
            self.bucket
        ))?;
        files.bind_text(1, name)?;

        let (length, metadata) = match files.next_row()? {
            Some(row) => {
                let metadata = if row.column_is_null(1) {
                    BlobMetadata::new()
                } else {
                    serde_json::from_str(row.column_string(1).unwrap_or("{}"))
                        .map_err(|e| Error::DatabaseError(format!("Invalid metadata for blob '{name}' ({e})")))?
                };
                (usize::try_from(row.column_int64(0)).unwrap_or(0), metadata)
            }
            None => return Ok(None),
        };

        let chunks = self.conn.prepare_statement(&format!(
            "SELECT data FROM {}_chunks WHERE files_name = ?1 ORDER BY n",
            self.bucket
        ))?;
        chunks.bind_text(1, name)?;

        let mut data = Vec::with_capacity(length);
        while let Some(row) = chunks.next_row()? {
            data.extend_from_slice(row.column_blob(0).unwrap_or_default());
        }

        if data.len() != length {
            return Err(Error::DatabaseError(format!(
                "Blob '{name}' is incomplete: expected {length} bytes, found {}",
                data.len()
            )));
        }

        Ok(Some((data, metadata)))
    }

    /// Removes a blob, returns false when nothing was stored under the name.
    pub fn remove(&self, name: &str) -> Result<bool> {
        self.conn.transaction(|conn| {
            let chunks = conn.prepare_statement(&format!("DELETE FROM {}_chunks WHERE files_name = ?1", self.bucket))?;
            chunks.bind_text(1, name)?;
            chunks.execute()?;

            let files = conn.prepare_statement(&format!("DELETE FROM {}_files WHERE name = ?1", self.bucket))?;
            files.bind_text(1, name)?;
            files.execute()?;

            Ok(conn.changes() > 0)
        })
    }

    /// Names of all stored blobs in alphabetical order.
    pub fn list(&self) -> Result<Vec<String>> {
        let stmt = self
            .conn
            .prepare_statement(&format!("SELECT name FROM {}_files ORDER BY name", self.bucket))?;

        let mut names = Vec::new();
        while let Some(row) = stmt.next_row()? {
            if let Some(name) = row.column_string(0) {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }
}

fn bucket_schema(bucket: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {bucket}_files (
            name        TEXT PRIMARY KEY NOT NULL,
            length      INTEGER NOT NULL,
            chunk_size  INTEGER NOT NULL,
            upload_date INTEGER NOT NULL,
            metadata    TEXT
        );
        CREATE TABLE IF NOT EXISTS {bucket}_chunks (
            files_name TEXT NOT NULL,
            n          INTEGER NOT NULL,
            data       BLOB NOT NULL,
            PRIMARY KEY (files_name, n)
        );"
    )
}
