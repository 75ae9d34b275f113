//! Raster persistence in a GridFS style blob store.
//!
//! A raster is stored as one blob holding the full grid as little endian `f32` values,
//! interleaved per cell (`[cell * layers + layer]`). The header fields and the raster
//! options are stored in the flat metadata document of the blob: header values as numbers,
//! options as numbers when they parse as one and as strings otherwise.

use std::{sync::Arc, thread, time::Duration};

use serde_json::Value;
use sqlite::{BlobMetadata, GridFs};

use crate::{
    Error, HeaderField, PositionSource, RasterData, RasterHeader, RasterNum, RasterOptions, ReadOptions, Result, Storage,
};

/// Minimal blob store interface needed to persist rasters.
pub trait BlobStore {
    fn get(&self, name: &str) -> Result<Option<(Vec<u8>, BlobMetadata)>>;
    fn put(&self, name: &str, data: &[u8], metadata: &BlobMetadata) -> Result;
    fn remove(&self, name: &str) -> Result<bool>;
    fn list(&self) -> Result<Vec<String>>;
}

impl BlobStore for GridFs {
    fn get(&self, name: &str) -> Result<Option<(Vec<u8>, BlobMetadata)>> {
        Ok(GridFs::get(self, name)?)
    }

    fn put(&self, name: &str, data: &[u8], metadata: &BlobMetadata) -> Result {
        Ok(GridFs::put(self, name, data, metadata)?)
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(GridFs::remove(self, name)?)
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(GridFs::list(self)?)
    }
}

/// Bounded retry of store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(2),
        }
    }
}

impl RetryPolicy {
    pub fn run<R>(&self, operation: &str, mut op: impl FnMut() -> Result<R>) -> Result<R> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(res) => return Ok(res),
                Err(e) if attempt < attempts => {
                    log::warn!("{operation} failed (attempt {attempt}/{attempts}): {e}");
                    thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn number_value(v: f64) -> Value {
    if inf::cast::is_integral(v) && inf::cast::fits_in_type::<i32>(v) {
        Value::from(v as i32)
    } else {
        serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

fn option_value(text: &str) -> Value {
    match inf::cast::parse_number(text) {
        Ok(v) if v.is_finite() => number_value(v),
        _ => Value::String(text.to_string()),
    }
}

fn encode_metadata(header: &RasterHeader, options: &RasterOptions, extra: &RasterOptions) -> BlobMetadata {
    let mut metadata = BlobMetadata::new();
    for (field, value) in header.iter() {
        metadata.insert(field.key().to_string(), number_value(value));
    }

    for (key, value) in options.iter().chain(extra.iter()) {
        if HeaderField::from_key(key).is_some() {
            log::warn!("Option '{key}' clashes with a header field and is not stored");
            continue;
        }
        metadata.insert(key.to_string(), option_value(value));
    }

    metadata
}

fn decode_metadata(metadata: &BlobMetadata) -> Result<(RasterHeader, RasterOptions)> {
    let mut header = RasterHeader::default();
    let mut options = RasterOptions::new();

    for (key, value) in metadata {
        match HeaderField::from_key(key) {
            Some(field) => {
                let number = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| inf::cast::parse_number(s).ok()))
                    .ok_or_else(|| Error::InvalidArgument(format!("Header field '{key}' is not a number: {value}")))?;
                header.set(field, number);
            }
            None => match value {
                Value::String(s) => options.insert(key.as_str(), s.as_str()),
                Value::Null => {}
                other => options.insert(key.as_str(), other.to_string()),
            },
        }
    }

    if header.layers() == 0 {
        header.set(HeaderField::Layers, 1.0);
    }

    header.validate()?;
    Ok((header, options))
}

fn decode_values(bytes: &[u8], expected: usize) -> Result<Vec<f32>> {
    if bytes.len() % size_of::<f32>() != 0 {
        return Err(Error::Runtime(format!("Blob size {} is not a multiple of 4 bytes", bytes.len())));
    }

    let words: Vec<[u8; 4]> = bytemuck::cast_slice::<u8, [u8; 4]>(bytes).to_vec();
    if words.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: words.len(),
        });
    }

    Ok(words.into_iter().map(f32::from_le_bytes).collect())
}

fn cell_values<T: RasterNum>(values: &[f32], cell: usize, layers: usize) -> Vec<T> {
    values[cell * layers..(cell + 1) * layers]
        .iter()
        .map(|&v| T::from_f64(f64::from(v)))
        .collect()
}

impl<T: RasterNum> RasterData<T> {
    /// Full grid values of every layer, interleaved per cell.
    fn interleaved_values(&self) -> Result<Vec<[u8; 4]>> {
        let layers = self.layers();
        let grids = (1..=layers)
            .map(|lyr| self.full_grid(lyr))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::Runtime("Raster data is not initialized".into()))?;

        let mut data = vec![[0_u8; 4]; self.header.cell_count() * layers];
        for (lyr, grid) in grids.iter().enumerate() {
            for (cell, value) in grid.iter().enumerate() {
                data[cell * layers + lyr] = (value.as_f64() as f32).to_le_bytes();
            }
        }

        Ok(data)
    }

    fn write_blob<S: BlobStore + ?Sized>(&self, store: &S, name: &str, extra: &RasterOptions, retry: &RetryPolicy) -> Result {
        let data = self.interleaved_values()?;
        let metadata = encode_metadata(&self.header, &self.options, extra);

        if retry.run("Remove blob", || store.remove(name))? {
            log::debug!("Replaced existing blob '{name}'");
        }

        retry.run("Store blob", || store.put(name, bytemuck::cast_slice(&data), &metadata))
    }

    /// Stores the raster under `name`, an existing blob with the same name is replaced.
    /// `extra` options are added to the metadata document.
    pub fn output_to_store<S: BlobStore + ?Sized>(&self, store: &S, name: &str, extra: &RasterOptions, retry: &RetryPolicy) -> bool {
        if !self.validate_raster_data() {
            return false;
        }

        match self.write_blob(store, name, extra, retry) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to store raster '{name}': {e}");
                false
            }
        }
    }

    fn load_blob<S: BlobStore + ?Sized, M: RasterNum>(
        store: &S,
        name: &str,
        mask: Option<&RasterData<M>>,
        opts: &ReadOptions,
    ) -> Result<Self> {
        let (bytes, metadata) = RetryPolicy::default()
            .run("Fetch blob", || store.get(name))?
            .ok_or_else(|| Error::BlobNotFound(name.to_string()))?;

        let (header, options) = decode_metadata(&metadata)?;
        let layers = header.layers();
        let values = decode_values(&bytes, header.cell_count() * layers)?;

        if let Some(mut raster) = mask.and_then(|mask| Self::load_blob_on_mask_cells(mask, &header, &options, &values, opts)) {
            raster.set_core_name(name);
            return Ok(raster);
        }

        let storage = if layers == 1 {
            Storage::Flat(values.iter().map(|&v| T::from_f64(f64::from(v))).collect())
        } else {
            Storage::Layered((0..header.cell_count()).map(|cell| cell_values(&values, cell, layers)).collect())
        };

        let mut raster = RasterData::from_grid(header, options, storage, opts);
        raster.set_core_name(name);
        raster.reconcile(mask, opts.calc_pos)?;
        Ok(raster)
    }

    /// Blobs written from a raster on the same mask share the mask's position index.
    fn load_blob_on_mask_cells<M: RasterNum>(
        mask: &RasterData<M>,
        header: &RasterHeader,
        options: &RasterOptions,
        values: &[f32],
        opts: &ReadOptions,
    ) -> Option<Self> {
        let index = mask.positions.index()?;
        if !opts.calc_pos
            || !opts.use_mask_ext
            || header.cells_num() != mask.cell_number()
            || !header.same_geometry(&mask.header)
        {
            return None;
        }

        let layers = header.layers();
        let cols = header.cols();
        let cells: Vec<Vec<T>> = index
            .cells()
            .iter()
            .map(|cell| match cell.index(cols) {
                Some(offset) => cell_values(values, offset, layers),
                None => vec![T::from_f64(header.nodata()); layers],
            })
            .collect();

        log::debug!("Reading blob on the {} cells of the mask", cells.len());
        let storage = Storage::from_cells(cells, layers > 1, T::from_f64(header.nodata()));
        let mut raster = RasterData::from_grid(*header, options.clone(), storage, opts);
        raster.header.set(HeaderField::CellsNum, index.len() as f64);
        raster.positions = PositionSource::Delegated(Arc::clone(index));
        if raster.srs().is_empty() {
            raster.options.set_srs(mask.srs());
        }
        Some(raster)
    }

    /// Reads a raster blob stored with [`RasterData::output_to_store`].
    pub fn from_store<S: BlobStore + ?Sized>(store: &S, name: &str, opts: &ReadOptions) -> Result<Self> {
        Self::load_blob(store, name, None::<&RasterData<T>>, opts)
    }

    /// Reads a raster blob restricted to the valid cells of `mask`.
    pub fn from_store_masked<S: BlobStore + ?Sized, M: RasterNum>(
        store: &S,
        name: &str,
        mask: &RasterData<M>,
        opts: &ReadOptions,
    ) -> Result<Self> {
        Self::load_blob(store, name, Some(mask), opts)
    }

    fn blob_exists<S: BlobStore + ?Sized>(store: &S, name: &str) -> bool {
        match store.list() {
            Ok(names) if names.iter().any(|n| n == name) => true,
            Ok(_) => {
                log::error!("Raster blob does not exist: {name}");
                false
            }
            Err(e) => {
                log::error!("Failed to list raster blobs: {e}");
                false
            }
        }
    }

    pub fn init_from_store<S: BlobStore + ?Sized>(store: &S, name: &str, opts: &ReadOptions) -> Option<Self> {
        if !Self::blob_exists(store, name) {
            return None;
        }

        match Self::from_store(store, name, opts) {
            Ok(raster) => Some(raster),
            Err(e) => {
                log::error!("Failed to create raster from blob '{name}': {e}");
                None
            }
        }
    }

    pub fn init_from_store_masked<S: BlobStore + ?Sized, M: RasterNum>(
        store: &S,
        name: &str,
        mask: &RasterData<M>,
        opts: &ReadOptions,
    ) -> Option<Self> {
        if !Self::blob_exists(store, name) {
            return None;
        }

        match Self::from_store_masked(store, name, mask, opts) {
            Ok(raster) => Some(raster),
            Err(e) => {
                log::error!("Failed to create raster from blob '{name}': {e}");
                None
            }
        }
    }

    /// Replaces the content of this raster with a stored blob, on failure the raster is left uninitialized.
    pub fn read_from_store<S: BlobStore + ?Sized>(&mut self, store: &S, name: &str, opts: &ReadOptions) -> bool {
        self.replace_with(Self::init_from_store(store, name, opts))
    }

    pub fn read_from_store_masked<S: BlobStore + ?Sized, M: RasterNum>(
        &mut self,
        store: &S,
        name: &str,
        mask: &RasterData<M>,
        opts: &ReadOptions,
    ) -> bool {
        self.replace_with(Self::init_from_store_masked(store, name, mask, opts))
    }
}
