use std::sync::Arc;

use inf::float_equal;

use crate::{Cell, RasterNum, Storage};

/// Result of resolving a grid cell to an offset in the stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Offset of the cell in the stored values.
    Index(usize),
    /// The cell lies inside the grid but is not stored (nodata in a compact raster).
    Filtered,
    /// The cell lies outside the grid.
    OutOfBounds,
}

impl Position {
    pub fn index(self) -> Option<usize> {
        match self {
            Position::Index(idx) => Some(idx),
            Position::Filtered | Position::OutOfBounds => None,
        }
    }
}

/// Row and column of every stored cell, in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionIndex {
    cells: Vec<Cell>,
}

impl PositionIndex {
    /// The cells must be sorted in row-major order.
    pub fn new(cells: Vec<Cell>) -> Self {
        debug_assert!(cells.windows(2).all(|w| w[0] < w[1]));
        PositionIndex { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Compact offset of a cell.
    pub fn find(&self, cell: Cell) -> Option<usize> {
        self.cells.binary_search(&cell).ok()
    }

    /// Builds the index for full grid storage and compacts the storage to the cells
    /// whose first layer value is valid.
    pub fn materialize<T: RasterNum>(storage: &Storage<T>, cols: usize, nodata: T) -> (PositionIndex, Storage<T>) {
        let valid: Vec<usize> = (0..storage.len())
            .filter(|&i| storage.value(i, 0).is_some_and(|v| !float_equal(v, nodata)))
            .collect();

        let cells = valid.iter().map(|&i| Cell::from_index(i, cols)).collect();
        let compact = storage.select(&valid);
        (PositionIndex { cells }, compact)
    }
}

/// Where a raster gets its cell addressing from.
#[derive(Debug, Clone, Default)]
pub enum PositionSource {
    /// The stored values cover the full grid in row-major order.
    #[default]
    Unmaterialized,
    /// Compact storage addressed by an index built for this raster.
    Owned(Arc<PositionIndex>),
    /// Compact storage addressed by an index shared with a mask raster.
    Delegated(Arc<PositionIndex>),
}

impl PositionSource {
    pub fn index(&self) -> Option<&Arc<PositionIndex>> {
        match self {
            PositionSource::Unmaterialized => None,
            PositionSource::Owned(idx) | PositionSource::Delegated(idx) => Some(idx),
        }
    }

    pub fn is_materialized(&self) -> bool {
        !matches!(self, PositionSource::Unmaterialized)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, PositionSource::Owned(_))
    }

    /// Offset in the stored values of the cell at `row`, `col`.
    pub fn resolve(&self, row: i32, col: i32, rows: usize, cols: usize) -> Position {
        if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
            return Position::OutOfBounds;
        }

        match self.index() {
            None => Position::Index(row as usize * cols + col as usize),
            Some(idx) => idx.find(Cell::new(row, col)).map_or(Position::Filtered, Position::Index),
        }
    }

    /// Grid cell stored at a given offset.
    pub fn cell_at(&self, index: usize, cols: usize) -> Option<Cell> {
        match self.index() {
            None => Some(Cell::from_index(index, cols)),
            Some(idx) => idx.cell(index),
        }
    }
}
