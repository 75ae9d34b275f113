//! Restricts a raster to the valid cells of a mask raster.
//!
//! Every valid mask cell is mapped to the target grid through its center coordinate. The
//! resulting raster takes over the geometry of the mask, optionally cropped to the bounding
//! box of the cells that hold data.

use std::sync::{Arc, OnceLock};

use inf::float_equal;
use rayon::prelude::*;

use crate::{Cell, Error, HeaderField, PositionIndex, PositionSource, RasterData, RasterNum, Result, Storage};

struct Sample<T> {
    cell: Cell,
    values: Vec<T>,
    valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundingBox {
    min_row: i32,
    max_row: i32,
    min_col: i32,
    max_col: i32,
}

impl BoundingBox {
    fn new(cell: Cell) -> Self {
        BoundingBox {
            min_row: cell.row,
            max_row: cell.row,
            min_col: cell.col,
            max_col: cell.col,
        }
    }

    fn extend(&mut self, cell: Cell) {
        self.min_row = self.min_row.min(cell.row);
        self.max_row = self.max_row.max(cell.row);
        self.min_col = self.min_col.min(cell.col);
        self.max_col = self.max_col.max(cell.col);
    }

    fn rows(&self) -> usize {
        (self.max_row - self.min_row + 1) as usize
    }

    fn cols(&self) -> usize {
        (self.max_col - self.min_col + 1) as usize
    }

    fn contains(&self, cell: Cell) -> bool {
        (self.min_row..=self.max_row).contains(&cell.row) && (self.min_col..=self.max_col).contains(&cell.col)
    }
}

impl<T: RasterNum> RasterData<T> {
    /// Grid cells of the stored values whose first layer holds data.
    pub(crate) fn valid_cells(&self) -> Vec<Cell> {
        match (self.positions.index(), &self.storage) {
            (Some(index), _) => index.cells().to_vec(),
            (None, Some(storage)) => (0..storage.len())
                .filter(|&i| storage.value(i, 0).is_some_and(|v| !float_equal(v, self.nodata)))
                .map(|i| Cell::from_index(i, self.cols()))
                .collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Applies the mask (if any) to freshly read full grid values and decides on the
    /// storage layout of the raster.
    pub(crate) fn reconcile<M: RasterNum>(&mut self, mask: Option<&RasterData<M>>, calc_pos: bool) -> Result {
        let Some(mask) = mask else {
            if calc_pos {
                self.set_calc_positions();
            } else {
                self.header.set(HeaderField::CellsNum, self.header.cell_count() as f64);
            }
            return Ok(());
        };

        if !mask.initialized() {
            return Err(Error::InvalidArgument("Mask raster is not initialized".into()));
        }

        let storage = self
            .storage
            .take()
            .ok_or_else(|| Error::Runtime("Raster is not initialized".into()))?;
        let layered = storage.is_layered();
        let layers = self.layers().max(1);
        let nodata = self.nodata;
        let default_value = self.default_value;
        let source_header = self.header;
        let source_positions = self.positions.clone();

        let mask_cells = mask.valid_cells();
        let mut samples: Vec<Sample<T>> = mask_cells
            .par_iter()
            .map(|&cell| {
                let (x, y) = mask.header.coordinate_of(cell.row, cell.col);
                let index = source_header.row_col_at(x, y).and_then(|target| {
                    source_positions
                        .resolve(target.row, target.col, source_header.rows(), source_header.cols())
                        .index()
                });

                match index {
                    Some(index) => {
                        let first = storage.value(index, 0).unwrap_or(nodata);
                        let values = (0..layers)
                            .map(|lyr| storage.value(index, lyr).unwrap_or(nodata))
                            .map(|v| if float_equal(v, nodata) { default_value } else { v })
                            .collect();
                        Sample {
                            cell,
                            values,
                            valid: !float_equal(first, nodata),
                        }
                    }
                    None => Sample {
                        cell,
                        values: vec![default_value; layers],
                        valid: false,
                    },
                }
            })
            .collect();

        let mut bbox: Option<BoundingBox> = None;
        for sample in samples.iter().filter(|s| s.valid) {
            match bbox.as_mut() {
                Some(bbox) => bbox.extend(sample.cell),
                None => bbox = Some(BoundingBox::new(sample.cell)),
            }
        }

        let same_extent = bbox.is_some_and(|bbox| bbox.rows() == mask.rows() && bbox.cols() == mask.cols());

        let mut header = mask.header;
        header.set(HeaderField::Layers, layers as f64);
        header.set(HeaderField::Nodata, source_header.nodata());

        if !self.use_mask_ext && !same_extent {
            match bbox {
                Some(bbox) => {
                    let cell_size = mask.cell_width();
                    header.set(HeaderField::Cols, bbox.cols() as f64);
                    header.set(HeaderField::Rows, bbox.rows() as f64);
                    header.set(HeaderField::XllCenter, mask.xll_center() + bbox.min_col as f64 * cell_size);
                    header.set(
                        HeaderField::YllCenter,
                        mask.yll_center() + (mask.rows() as i32 - 1 - bbox.max_row) as f64 * cell_size,
                    );

                    samples.retain(|s| bbox.contains(s.cell) && !float_equal(s.values[0], nodata));
                    for sample in &mut samples {
                        sample.cell = Cell::new(sample.cell.row - bbox.min_row, sample.cell.col - bbox.min_col);
                    }
                }
                None => log::warn!("The raster has no data within the mask, keeping the extent of the mask"),
            }
        }

        self.options.set_srs(mask.srs());

        let (positions, values) = if (self.use_mask_ext || same_extent) && calc_pos {
            log::debug!("Sharing the position index of the mask ({} cells)", mask_cells.len());
            let positions = match mask.positions.index() {
                Some(index) => PositionSource::Delegated(Arc::clone(index)),
                None => PositionSource::Owned(Arc::new(PositionIndex::new(mask_cells))),
            };
            (positions, samples.into_iter().map(|s| s.values).collect::<Vec<_>>())
        } else if !calc_pos {
            log::debug!("Storing the full grid of {}x{} cells", header.rows(), header.cols());
            let cols = header.cols();
            let mut values = vec![vec![default_value; layers]; header.cell_count()];
            for sample in samples {
                if let Some(slot) = sample.cell.index(cols).and_then(|idx| values.get_mut(idx)) {
                    *slot = sample.values;
                }
            }
            (PositionSource::Unmaterialized, values)
        } else {
            log::debug!("Building a position index for {} cells", samples.len());
            let (cells, values): (Vec<Cell>, Vec<Vec<T>>) = samples.into_iter().map(|s| (s.cell, s.values)).unzip();
            (PositionSource::Owned(Arc::new(PositionIndex::new(cells))), values)
        };

        header.set(HeaderField::CellsNum, values.len() as f64);
        self.header = header;
        self.storage = Some(Storage::from_cells(values, layered, nodata));
        self.positions = positions;
        self.stats = OnceLock::new();
        Ok(())
    }
}
