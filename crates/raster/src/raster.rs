use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use inf::float_equal;
use rayon::prelude::*;

use crate::{
    Cell, Error, GridData, HeaderField, LayerStatistics, NODATA_VALUE, Position, PositionIndex, PositionSource,
    RasterHeader, RasterNum, RasterOptions, ReadOptions, Result, StatisticKind, Storage, codec,
};

/// In-memory raster with one or more layers.
///
/// The values are either stored for the full grid in row-major order, or compacted to the
/// cells that contain data. Compacted rasters map storage offsets to grid cells with a
/// [`PositionIndex`], which is owned by the raster or shared with the mask it was read with.
///
/// Layer numbers passed to the accessors are 1 based.
#[derive(Debug, Clone)]
pub struct RasterData<T: RasterNum> {
    pub(crate) storage: Option<Storage<T>>,
    pub(crate) positions: PositionSource,
    pub(crate) header: RasterHeader,
    pub(crate) options: RasterOptions,
    pub(crate) stats: OnceLock<Vec<LayerStatistics>>,
    pub(crate) nodata: T,
    pub(crate) default_value: T,
    pub(crate) use_mask_ext: bool,
    full_path: PathBuf,
    core_name: String,
}

impl<T: RasterNum> Default for RasterData<T> {
    fn default() -> Self {
        RasterData {
            storage: None,
            positions: PositionSource::Unmaterialized,
            header: RasterHeader::default(),
            options: RasterOptions::new(),
            stats: OnceLock::new(),
            nodata: T::from_f64(NODATA_VALUE),
            default_value: T::from_f64(NODATA_VALUE),
            use_mask_ext: false,
            full_path: PathBuf::new(),
            core_name: String::new(),
        }
    }
}

/// A default value equal to the sentinel follows the nodata value of the raster.
fn resolve_default_value(default_value: f64, nodata: f64) -> f64 {
    if float_equal(default_value, NODATA_VALUE) && !float_equal(nodata, NODATA_VALUE) {
        nodata
    } else {
        default_value
    }
}

fn log_failure<R>(res: Result<R>, resource: &str) -> Option<R> {
    match res {
        Ok(raster) => Some(raster),
        Err(e) => {
            log::error!("Failed to create raster from {resource}: {e}");
            None
        }
    }
}

impl<T: RasterNum> RasterData<T> {
    /// An uninitialized raster, use one of the `read_*` methods to load data into it.
    pub fn new() -> Self {
        RasterData::default()
    }

    /// Wraps a full grid before any masking or compaction takes place.
    pub(crate) fn from_grid(mut header: RasterHeader, mut options: RasterOptions, storage: Storage<T>, opts: &ReadOptions) -> Self {
        let nodata = header.nodata();
        options.merge(&opts.options);
        options.ensure_srs();

        header.set(HeaderField::CellsNum, header.cell_count() as f64);

        RasterData {
            storage: Some(storage),
            positions: PositionSource::Unmaterialized,
            header,
            options,
            stats: OnceLock::new(),
            nodata: T::from_f64(nodata),
            default_value: T::from_f64(resolve_default_value(opts.default_value, nodata)),
            use_mask_ext: opts.use_mask_ext,
            full_path: PathBuf::new(),
            core_name: String::new(),
        }
    }

    pub(crate) fn set_file_path(&mut self, path: &Path) {
        self.full_path = path.to_path_buf();
        self.core_name = inf::fs::core_name(path);
    }

    fn load_file<M: RasterNum>(path: &Path, mask: Option<&RasterData<M>>, opts: &ReadOptions) -> Result<Self> {
        let GridData { header, options, values } = codec::read_grid_from_file::<T>(path)?;
        let mut raster = RasterData::from_grid(header, options, Storage::Flat(values), opts);
        raster.set_file_path(path);
        raster.reconcile(mask, opts.calc_pos)?;
        Ok(raster)
    }

    /// Reads a single layer raster, the format is derived from the file extension.
    pub fn from_file(path: &Path, opts: &ReadOptions) -> Result<Self> {
        Self::load_file(path, None::<&RasterData<T>>, opts)
    }

    /// Reads a single layer raster restricted to the valid cells of `mask`.
    pub fn from_file_masked<M: RasterNum>(path: &Path, mask: &RasterData<M>, opts: &ReadOptions) -> Result<Self> {
        Self::load_file(path, Some(mask), opts)
    }

    fn load_files<M: RasterNum>(paths: &[PathBuf], mask: Option<&RasterData<M>>, opts: &ReadOptions) -> Result<Self> {
        let (first, others) = paths
            .split_first()
            .ok_or_else(|| Error::InvalidArgument("No raster files provided".into()))?;

        let mut raster = Self::load_file(first, mask, opts)?;
        // dem_1.asc, dem_2.asc, ... share the core name dem
        if let Some(pos) = raster.core_name.find('_') {
            raster.core_name.truncate(pos);
        }

        if others.is_empty() {
            return Ok(raster);
        }

        let grids = others
            .iter()
            .map(|path| codec::read_grid_from_file::<T>(path))
            .collect::<Result<Vec<_>>>()?;
        raster.add_layers(&grids)?;
        Ok(raster)
    }

    /// Fills the layers after the first one by coordinate lookup in the given grids.
    fn add_layers(&mut self, grids: &[GridData<T>]) -> Result {
        let storage = self.storage.take().ok_or_else(|| Error::Runtime("Raster is not initialized".into()))?;
        let layer_count = grids.len() + 1;
        let nodata = self.nodata;
        let header = &self.header;
        let positions = &self.positions;
        let cols = header.cols();

        let cells: Vec<Vec<T>> = (0..storage.len())
            .into_par_iter()
            .map(|index| {
                let mut values = Vec::with_capacity(layer_count);
                values.push(storage.value(index, 0).unwrap_or(nodata));

                let coordinate = positions.cell_at(index, cols).map(|cell| header.coordinate_of(cell.row, cell.col));
                for grid in grids {
                    let value = coordinate
                        .and_then(|(x, y)| grid.header.row_col_at(x, y))
                        .and_then(|cell| cell.index(grid.header.cols()))
                        .and_then(|idx| grid.values.get(idx).copied())
                        .filter(|v| !float_equal(*v, grid.header.nodata()))
                        .unwrap_or(nodata);
                    values.push(value);
                }

                values
            })
            .collect();

        self.storage = Some(Storage::Layered(cells));
        self.header.set(HeaderField::Layers, layer_count as f64);
        self.stats = OnceLock::new();
        Ok(())
    }

    /// Reads a multi layer raster from one single layer file per layer.
    pub fn from_files(paths: &[PathBuf], opts: &ReadOptions) -> Result<Self> {
        Self::load_files(paths, None::<&RasterData<T>>, opts)
    }

    pub fn from_files_masked<M: RasterNum>(paths: &[PathBuf], mask: &RasterData<M>, opts: &ReadOptions) -> Result<Self> {
        Self::load_files(paths, Some(mask), opts)
    }

    fn from_full_grid(mut header: RasterHeader, storage: Storage<T>, mut options: RasterOptions) -> Result<Self> {
        header.validate()?;
        if storage.len() != header.cell_count() {
            return Err(Error::SizeMismatch {
                expected: header.cell_count(),
                actual: storage.len(),
            });
        }

        header.set(HeaderField::CellsNum, header.cell_count() as f64);
        options.ensure_srs();
        let nodata = T::from_f64(header.nodata());
        Ok(RasterData {
            storage: Some(storage),
            header,
            options,
            nodata,
            default_value: nodata,
            ..RasterData::default()
        })
    }

    /// Single layer raster covering the full grid described by `header`.
    pub fn from_array(mut header: RasterHeader, values: Vec<T>, options: RasterOptions) -> Result<Self> {
        header.set(HeaderField::Layers, 1.0);
        Self::from_full_grid(header, Storage::Flat(values), options)
    }

    /// Multi layer raster covering the full grid, `values[cell][layer]`.
    pub fn from_layers(mut header: RasterHeader, values: Vec<Vec<T>>, options: RasterOptions) -> Result<Self> {
        let layers = layer_count(&values)?;
        header.set(HeaderField::Layers, layers as f64);
        Self::from_full_grid(header, Storage::Layered(values), options)
    }

    fn from_mask_storage<M: RasterNum>(mask: &RasterData<M>, storage: Storage<T>, options: RasterOptions) -> Result<Self> {
        let mask_storage = mask.storage.as_ref().ok_or_else(|| Error::InvalidArgument("Mask raster is not initialized".into()))?;
        if storage.len() != mask_storage.len() {
            return Err(Error::SizeMismatch {
                expected: mask_storage.len(),
                actual: storage.len(),
            });
        }

        let mut header = mask.header;
        header.set(HeaderField::CellsNum, storage.len() as f64);
        header.set(
            HeaderField::Layers,
            match &storage {
                Storage::Flat(_) => 1.0,
                Storage::Layered(values) => layer_count(values)? as f64,
            },
        );

        let mut raster_options = RasterOptions::with_srs(mask.srs());
        raster_options.merge(&options);

        let positions = match mask.positions.index() {
            Some(index) => PositionSource::Delegated(Arc::clone(index)),
            None => PositionSource::Unmaterialized,
        };

        Ok(RasterData {
            storage: Some(storage),
            positions,
            header,
            options: raster_options,
            nodata: T::from_f64(header.nodata()),
            default_value: T::from_f64(mask.default_value.as_f64()),
            use_mask_ext: true,
            ..RasterData::default()
        })
    }

    /// Single layer raster with the geometry and cell addressing of `mask`.
    /// `values` holds one value per stored mask cell.
    pub fn from_mask_values<M: RasterNum>(mask: &RasterData<M>, values: Vec<T>, options: RasterOptions) -> Result<Self> {
        Self::from_mask_storage(mask, Storage::Flat(values), options)
    }

    /// Multi layer raster with the geometry and cell addressing of `mask`, `values[cell][layer]`.
    pub fn from_mask_layers<M: RasterNum>(mask: &RasterData<M>, values: Vec<Vec<T>>, options: RasterOptions) -> Result<Self> {
        Self::from_mask_storage(mask, Storage::Layered(values), options)
    }

    /// Like [`RasterData::from_file`] but returns `None` when the file is missing or invalid.
    pub fn init_from_file(path: &Path, opts: &ReadOptions) -> Option<Self> {
        if !inf::fs::file_exists(path) {
            log::error!("Raster file does not exist: {}", path.display());
            return None;
        }

        log_failure(Self::from_file(path, opts), &path.to_string_lossy())
    }

    pub fn init_from_file_masked<M: RasterNum>(path: &Path, mask: &RasterData<M>, opts: &ReadOptions) -> Option<Self> {
        if !inf::fs::file_exists(path) {
            log::error!("Raster file does not exist: {}", path.display());
            return None;
        }

        log_failure(Self::from_file_masked(path, mask, opts), &path.to_string_lossy())
    }

    fn check_files_exist(paths: &[PathBuf]) -> bool {
        match paths.iter().find(|p| !inf::fs::file_exists(p)) {
            Some(missing) => {
                log::error!("Raster file does not exist: {}", missing.display());
                false
            }
            None => !paths.is_empty(),
        }
    }

    pub fn init_from_files(paths: &[PathBuf], opts: &ReadOptions) -> Option<Self> {
        if !Self::check_files_exist(paths) {
            return None;
        }

        log_failure(Self::from_files(paths, opts), "layer files")
    }

    pub fn init_from_files_masked<M: RasterNum>(paths: &[PathBuf], mask: &RasterData<M>, opts: &ReadOptions) -> Option<Self> {
        if !Self::check_files_exist(paths) {
            return None;
        }

        log_failure(Self::from_files_masked(paths, mask, opts), "layer files")
    }

    pub fn init_from_array(header: RasterHeader, values: Vec<T>, options: RasterOptions) -> Option<Self> {
        log_failure(Self::from_array(header, values, options), "array")
    }

    pub fn init_from_layers(header: RasterHeader, values: Vec<Vec<T>>, options: RasterOptions) -> Option<Self> {
        log_failure(Self::from_layers(header, values, options), "layered array")
    }

    pub fn init_from_mask_values<M: RasterNum>(mask: &RasterData<M>, values: Vec<T>, options: RasterOptions) -> Option<Self> {
        log_failure(Self::from_mask_values(mask, values, options), "mask values")
    }

    pub fn init_from_mask_layers<M: RasterNum>(mask: &RasterData<M>, values: Vec<Vec<T>>, options: RasterOptions) -> Option<Self> {
        log_failure(Self::from_mask_layers(mask, values, options), "mask layers")
    }

    /// Replaces the content of this raster with the content of a file.
    /// On failure the raster is left uninitialized.
    pub fn read_from_file(&mut self, path: &Path, opts: &ReadOptions) -> bool {
        self.replace_with(Self::init_from_file(path, opts))
    }

    pub fn read_from_file_masked<M: RasterNum>(&mut self, path: &Path, mask: &RasterData<M>, opts: &ReadOptions) -> bool {
        self.replace_with(Self::init_from_file_masked(path, mask, opts))
    }

    pub(crate) fn replace_with(&mut self, raster: Option<Self>) -> bool {
        *self = raster.unwrap_or_default();
        self.initialized()
    }

    // Status

    pub fn initialized(&self) -> bool {
        self.storage.is_some()
    }

    pub fn is_2d(&self) -> bool {
        self.storage.as_ref().is_some_and(Storage::is_layered)
    }

    /// True when the storage is compacted and addressed through a position index.
    pub fn positions_calculated(&self) -> bool {
        self.positions.is_materialized()
    }

    /// True when the position index was built for this raster instead of shared with a mask.
    pub fn positions_allocated(&self) -> bool {
        self.positions.is_owned()
    }

    pub fn mask_extended(&self) -> bool {
        self.use_mask_ext
    }

    pub fn statistics_calculated(&self) -> bool {
        self.stats.get().is_some()
    }

    pub fn validate_raster_data(&self) -> bool {
        if !self.initialized() {
            log::warn!("Raster data is not initialized");
            return false;
        }

        true
    }

    pub fn validate_row_col(&self, row: i32, col: i32) -> bool {
        if row < 0 || col < 0 || row as usize >= self.rows() || col as usize >= self.cols() {
            log::warn!("Row {row} or column {col} is out of range ({}x{})", self.rows(), self.cols());
            return false;
        }

        true
    }

    pub fn validate_layer(&self, lyr: usize) -> bool {
        if lyr == 0 || lyr > self.layers() {
            log::warn!("Layer {lyr} is out of range (1..={})", self.layers());
            return false;
        }

        true
    }

    pub fn validate_index(&self, index: usize) -> bool {
        if index >= self.cell_number() {
            log::warn!("Cell index {index} is out of range ({} cells)", self.cell_number());
            return false;
        }

        true
    }

    // Header

    pub fn header(&self) -> &RasterHeader {
        &self.header
    }

    pub fn rows(&self) -> usize {
        self.header.rows()
    }

    pub fn cols(&self) -> usize {
        self.header.cols()
    }

    pub fn cell_width(&self) -> f64 {
        self.header.cell_size()
    }

    pub fn xll_center(&self) -> f64 {
        self.header.xll()
    }

    pub fn yll_center(&self) -> f64 {
        self.header.yll()
    }

    pub fn layers(&self) -> usize {
        self.header.layers()
    }

    /// Number of stored cells.
    pub fn cell_number(&self) -> usize {
        self.storage.as_ref().map_or(0, Storage::len)
    }

    pub fn nodata_value(&self) -> T {
        self.nodata
    }

    pub fn default_value(&self) -> T {
        self.default_value
    }

    pub fn srs(&self) -> &str {
        self.options.srs()
    }

    pub fn option(&self, key: &str) -> &str {
        self.options.get(key)
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    pub fn set_option(&mut self, key: &str, value: &str) {
        self.options.insert(key, value);
    }

    pub fn file_path(&self) -> &Path {
        &self.full_path
    }

    pub fn core_name(&self) -> &str {
        &self.core_name
    }

    pub fn set_core_name(&mut self, name: &str) {
        self.core_name = name.to_string();
    }

    // Positions

    /// Resolves a grid cell to its offset in the stored values.
    pub fn get_position(&self, row: i32, col: i32) -> Position {
        if !self.initialized() {
            return Position::OutOfBounds;
        }

        self.positions.resolve(row, col, self.rows(), self.cols())
    }

    /// Resolves a coordinate to its offset in the stored values.
    pub fn position_at(&self, x: f64, y: f64) -> Position {
        match self.header.row_col_at(x, y) {
            Some(cell) => self.get_position(cell.row, cell.col),
            None => Position::OutOfBounds,
        }
    }

    pub fn row_col_at(&self, x: f64, y: f64) -> Option<Cell> {
        self.header.row_col_at(x, y)
    }

    /// Center coordinate of a grid cell.
    pub fn coordinate_of(&self, row: i32, col: i32) -> (f64, f64) {
        self.header.coordinate_of(row, col)
    }

    /// The position index, `None` for rasters that store the full grid.
    pub fn positions(&self) -> Option<&PositionIndex> {
        self.positions.index().map(|idx| idx.as_ref())
    }

    /// The grid cell of every stored value, compacts the raster first when needed.
    pub fn position_data(&mut self) -> Option<&[Cell]> {
        if !self.positions_calculated() && !self.set_calc_positions() {
            return None;
        }

        self.positions().map(PositionIndex::cells)
    }

    /// Compacts a full grid raster to its valid cells and builds the position index.
    pub fn set_calc_positions(&mut self) -> bool {
        if !self.validate_raster_data() {
            return false;
        }

        if self.positions_calculated() {
            return true;
        }

        if let Some(storage) = &self.storage {
            let (index, compact) = PositionIndex::materialize(storage, self.cols(), self.nodata);
            self.header.set(HeaderField::CellsNum, index.len() as f64);
            self.storage = Some(compact);
            self.positions = PositionSource::Owned(Arc::new(index));
            self.stats = OnceLock::new();
        }

        true
    }

    // Values

    fn stored_value(&self, index: usize, lyr: usize) -> T {
        self.storage
            .as_ref()
            .and_then(|storage| storage.value(index, lyr - 1))
            .unwrap_or(self.nodata)
    }

    /// Value of a grid cell, nodata for filtered cells and invalid arguments.
    pub fn value(&self, row: i32, col: i32, lyr: usize) -> T {
        if !self.validate_raster_data() || !self.validate_layer(lyr) {
            return self.nodata;
        }

        match self.get_position(row, col) {
            Position::Index(index) => self.stored_value(index, lyr),
            Position::Filtered => self.nodata,
            Position::OutOfBounds => {
                log::warn!("Cell ({row}, {col}) is outside of the raster");
                self.nodata
            }
        }
    }

    /// Value at a storage offset.
    pub fn value_by_index(&self, index: usize, lyr: usize) -> T {
        if !self.validate_raster_data() || !self.validate_layer(lyr) || !self.validate_index(index) {
            return self.nodata;
        }

        self.stored_value(index, lyr)
    }

    /// All layer values of a grid cell, `None` for filtered cells and invalid arguments.
    pub fn values_at(&self, row: i32, col: i32) -> Option<Vec<T>> {
        let index = self.get_position(row, col).index()?;
        self.storage.as_ref()?.cell_values(index)
    }

    pub fn values_by_index(&self, index: usize) -> Option<Vec<T>> {
        self.storage.as_ref()?.cell_values(index)
    }

    pub fn is_nodata(&self, row: i32, col: i32, lyr: usize) -> bool {
        float_equal(self.value(row, col, lyr), self.nodata)
    }

    /// Updates the value of a stored cell. Cells that are not stored in a compacted raster
    /// cannot be assigned. The statistics are not refreshed, use [`RasterData::update_statistics`].
    pub fn set_value(&mut self, row: i32, col: i32, value: T, lyr: usize) -> bool {
        if !self.validate_raster_data() || !self.validate_layer(lyr) {
            return false;
        }

        match self.get_position(row, col) {
            Position::Index(index) => self.set_value_by_index(index, value, lyr),
            Position::Filtered => {
                log::warn!("Cell ({row}, {col}) is not stored in the raster, the value is not assigned");
                false
            }
            Position::OutOfBounds => {
                log::warn!("Cell ({row}, {col}) is outside of the raster");
                false
            }
        }
    }

    pub fn set_value_by_index(&mut self, index: usize, value: T, lyr: usize) -> bool {
        if !self.validate_raster_data() || !self.validate_layer(lyr) || !self.validate_index(index) {
            return false;
        }

        self.storage.as_mut().is_some_and(|storage| storage.set(index, lyr - 1, value))
    }

    /// The stored values of a single layer raster.
    pub fn raster_data(&self) -> Option<&[T]> {
        match self.storage.as_ref()? {
            Storage::Flat(values) => Some(values),
            Storage::Layered(_) => None,
        }
    }

    /// The stored values of a multi layer raster, one vector of layer values per cell.
    pub fn raster_2d_data(&self) -> Option<&[Vec<T>]> {
        match self.storage.as_ref()? {
            Storage::Flat(_) => None,
            Storage::Layered(values) => Some(values),
        }
    }

    /// Row-major values of a layer for the full grid, nodata where no value is stored.
    pub fn full_grid(&self, lyr: usize) -> Option<Vec<T>> {
        if !self.validate_raster_data() || !self.validate_layer(lyr) {
            return None;
        }

        let storage = self.storage.as_ref()?;
        if !self.positions_calculated() && storage.len() == self.header.cell_count() {
            return Some((0..storage.len()).map(|i| storage.value(i, lyr - 1).unwrap_or(self.nodata)).collect());
        }

        let cols = self.cols();
        let mut grid = vec![self.nodata; self.header.cell_count()];
        for index in 0..storage.len() {
            if let Some(offset) = self.positions.cell_at(index, cols).and_then(|cell| cell.index(cols)) {
                grid[offset] = storage.value(index, lyr - 1).unwrap_or(self.nodata);
            }
        }

        Some(grid)
    }

    // Statistics

    /// Per layer statistics, computed on first access.
    pub fn layer_statistics(&self) -> &[LayerStatistics] {
        self.stats.get_or_init(|| {
            let nodata = self.nodata.as_f64();
            match &self.storage {
                Some(storage) => (0..self.layers())
                    .map(|lyr| LayerStatistics::compute(&storage.layer_values(lyr), nodata))
                    .collect(),
                None => Vec::new(),
            }
        })
    }

    /// Discards the cached statistics and computes them again.
    pub fn update_statistics(&mut self) {
        self.stats = OnceLock::new();
        self.layer_statistics();
    }

    /// Statistic of a layer, nodata for invalid layers.
    pub fn statistics(&self, kind: StatisticKind, lyr: usize) -> f64 {
        if !self.validate_raster_data() || !self.validate_layer(lyr) {
            return self.nodata.as_f64();
        }

        self.layer_statistics()
            .get(lyr - 1)
            .map_or(self.nodata.as_f64(), |stats| stats.get(kind))
    }

    /// Statistic by name (`MEAN`, `STD`, ...).
    pub fn statistics_by_name(&self, name: &str, lyr: usize) -> Result<f64> {
        Ok(self.statistics(name.parse()?, lyr))
    }

    /// Statistic of every layer.
    pub fn statistics_all(&self, kind: StatisticKind) -> Vec<f64> {
        self.layer_statistics().iter().map(|stats| stats.get(kind)).collect()
    }

    // The shorthands below describe the first layer, use `statistics(kind, lyr)` for the others.

    pub fn valid_number(&self) -> usize {
        self.layer_statistics().first().map_or(0, |stats| stats.count)
    }

    pub fn average(&self) -> f64 {
        self.statistics(StatisticKind::Mean, 1)
    }

    pub fn minimum(&self) -> f64 {
        self.statistics(StatisticKind::Min, 1)
    }

    pub fn maximum(&self) -> f64 {
        self.statistics(StatisticKind::Max, 1)
    }

    pub fn std(&self) -> f64 {
        self.statistics(StatisticKind::Std, 1)
    }

    pub fn range(&self) -> f64 {
        self.statistics(StatisticKind::Range, 1)
    }

    // Transformations

    /// Assigns `value` to every nodata value of every layer.
    pub fn replace_nodata(&mut self, value: T) {
        let nodata = self.nodata;
        if let Some(storage) = self.storage.as_mut() {
            storage.par_map_values(|v| if float_equal(v, nodata) { value } else { v });
        }
    }

    /// Maps the integer part of every value through `reclass_map`, values without a mapping become nodata.
    pub fn reclassify(&mut self, reclass_map: &HashMap<i32, T>) {
        let nodata = self.nodata;
        if let Some(storage) = self.storage.as_mut() {
            storage.par_map_values(|v| {
                num::cast::<T, i32>(v)
                    .and_then(|class| reclass_map.get(&class).copied())
                    .unwrap_or(nodata)
            });
        }
    }
}

fn layer_count<T>(values: &[Vec<T>]) -> Result<usize> {
    let layers = values.first().map_or(0, Vec::len);
    if layers == 0 {
        return Err(Error::InvalidArgument("Layered values need at least one layer".into()));
    }

    if let Some(cell) = values.iter().position(|v| v.len() != layers) {
        return Err(Error::InvalidArgument(format!(
            "Cell {cell} has {} layers, expected {layers}",
            values[cell].len()
        )));
    }

    Ok(layers)
}
