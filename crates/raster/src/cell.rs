/// Represents a point in the raster using r,c coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    pub const fn is_valid(&self) -> bool {
        self.row >= 0 && self.col >= 0
    }

    /// Cell at a row-major offset in a grid with `cols` columns.
    pub const fn from_index(index: usize, cols: usize) -> Self {
        Cell::new((index / cols) as i32, (index % cols) as i32)
    }

    /// Row-major offset in a grid with `cols` columns, `None` for negative coordinates.
    pub const fn index(&self, cols: usize) -> Option<usize> {
        if self.is_valid() {
            Some(self.row as usize * cols + self.col as usize)
        } else {
            None
        }
    }
}
