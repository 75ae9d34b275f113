use std::str::FromStr;

use inf::float_equal;

use crate::{Cell, Error, Result};

/// Sentinel used for nodata and for header fields that were never assigned.
pub const NODATA_VALUE: f64 = -9999.0;

/// The fixed fields of a raster header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Cols,
    Rows,
    XllCenter,
    YllCenter,
    CellSize,
    Nodata,
    Layers,
    CellsNum,
}

impl HeaderField {
    pub const ALL: [HeaderField; 8] = [
        HeaderField::Cols,
        HeaderField::Rows,
        HeaderField::XllCenter,
        HeaderField::YllCenter,
        HeaderField::CellSize,
        HeaderField::Nodata,
        HeaderField::Layers,
        HeaderField::CellsNum,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            HeaderField::Cols => "NCOLS",
            HeaderField::Rows => "NROWS",
            HeaderField::XllCenter => "XLLCENTER",
            HeaderField::YllCenter => "YLLCENTER",
            HeaderField::CellSize => "CELLSIZE",
            HeaderField::Nodata => "NODATA_VALUE",
            HeaderField::Layers => "LAYERS",
            HeaderField::CellsNum => "CELLSNUM",
        }
    }

    /// Case insensitive lookup of a header key.
    pub fn from_key(key: &str) -> Option<HeaderField> {
        HeaderField::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl FromStr for HeaderField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HeaderField::from_key(s).ok_or_else(|| Error::UnknownHeaderField(s.to_string()))
    }
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Grid geometry of a raster.
///
/// All fields are kept in double precision whatever the element type of the raster,
/// `xll`/`yll` are the coordinates of the center of the lower left cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterHeader {
    values: [f64; 8],
}

impl Default for RasterHeader {
    fn default() -> Self {
        RasterHeader {
            values: [NODATA_VALUE; 8],
        }
    }
}

impl RasterHeader {
    /// Single layer header for a full `rows` x `cols` grid.
    pub fn new(rows: usize, cols: usize, xll: f64, yll: f64, cellsize: f64, nodata: f64) -> Self {
        let mut header = RasterHeader::default();
        header.set(HeaderField::Rows, rows as f64);
        header.set(HeaderField::Cols, cols as f64);
        header.set(HeaderField::XllCenter, xll);
        header.set(HeaderField::YllCenter, yll);
        header.set(HeaderField::CellSize, cellsize);
        header.set(HeaderField::Nodata, nodata);
        header.set(HeaderField::Layers, 1.0);
        header.set(HeaderField::CellsNum, (rows * cols) as f64);
        header
    }

    #[inline]
    pub fn get(&self, field: HeaderField) -> f64 {
        self.values[field as usize]
    }

    #[inline]
    pub fn set(&mut self, field: HeaderField, value: f64) {
        self.values[field as usize] = value;
    }

    /// Lookup by key name, fails for keys that are not part of the header.
    pub fn get_by_key(&self, key: &str) -> Result<f64> {
        Ok(self.get(key.parse()?))
    }

    pub fn set_by_key(&mut self, key: &str, value: f64) -> Result<()> {
        self.set(key.parse()?, value);
        Ok(())
    }

    /// Overwrites every field with the value from `other`.
    pub fn copy_from(&mut self, other: &RasterHeader) {
        self.values = other.values;
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeaderField, f64)> + '_ {
        HeaderField::ALL.into_iter().map(|field| (field, self.get(field)))
    }

    pub fn rows(&self) -> usize {
        count_field(self.get(HeaderField::Rows))
    }

    pub fn cols(&self) -> usize {
        count_field(self.get(HeaderField::Cols))
    }

    pub fn layers(&self) -> usize {
        count_field(self.get(HeaderField::Layers))
    }

    pub fn cells_num(&self) -> usize {
        count_field(self.get(HeaderField::CellsNum))
    }

    pub fn xll(&self) -> f64 {
        self.get(HeaderField::XllCenter)
    }

    pub fn yll(&self) -> f64 {
        self.get(HeaderField::YllCenter)
    }

    pub fn cell_size(&self) -> f64 {
        self.get(HeaderField::CellSize)
    }

    pub fn nodata(&self) -> f64 {
        self.get(HeaderField::Nodata)
    }

    /// Number of cells of the full grid.
    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Checks the invariants every constructed raster header satisfies.
    pub fn validate(&self) -> Result<()> {
        if self.rows() == 0 || self.cols() == 0 {
            return Err(Error::InvalidArgument(format!(
                "Raster dimensions must be positive ({} rows, {} cols)",
                self.get(HeaderField::Rows),
                self.get(HeaderField::Cols)
            )));
        }

        if !(self.cell_size() > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "Cell size must be positive ({})",
                self.cell_size()
            )));
        }

        if self.layers() == 0 {
            return Err(Error::InvalidArgument("A raster needs at least one layer".into()));
        }

        if self.cells_num() > self.cell_count() {
            return Err(Error::InvalidArgument(format!(
                "Valid cell count {} exceeds the grid size {}",
                self.cells_num(),
                self.cell_count()
            )));
        }

        Ok(())
    }

    /// Center coordinate of a cell.
    pub fn coordinate_of(&self, row: i32, col: i32) -> (f64, f64) {
        let cellsize = self.cell_size();
        (
            self.xll() + col as f64 * cellsize,
            self.yll() + (self.rows() as f64 - row as f64 - 1.0) * cellsize,
        )
    }

    /// Cell containing a coordinate, `None` when the coordinate lies outside the grid.
    /// Points on an inner cell boundary resolve to the cell right of or below the boundary.
    pub fn row_col_at(&self, x: f64, y: f64) -> Option<Cell> {
        let cellsize = self.cell_size();
        let x_min = self.xll() - cellsize / 2.0;
        let x_max = x_min + cellsize * self.cols() as f64;
        let y_min = self.yll() - cellsize / 2.0;
        let y_max = y_min + cellsize * self.rows() as f64;

        if x < x_min || x > x_max || y < y_min || y > y_max {
            return None;
        }

        // truncation towards zero, both offsets are positive here
        let row = ((y_max - y) / cellsize) as i32;
        let col = ((x - x_min) / cellsize) as i32;
        if row as usize >= self.rows() || col as usize >= self.cols() {
            return None;
        }

        Some(Cell::new(row, col))
    }

    /// True when both headers describe the same grid.
    pub fn same_geometry(&self, other: &RasterHeader) -> bool {
        self.rows() == other.rows()
            && self.cols() == other.cols()
            && float_equal(self.xll(), other.xll())
            && float_equal(self.yll(), other.yll())
            && float_equal(self.cell_size(), other.cell_size())
    }
}

fn count_field(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn header() -> RasterHeader {
        RasterHeader::new(4, 3, 1.0, 1.0, 2.0, NODATA_VALUE)
    }

    #[test]
    fn keys() {
        assert_eq!(HeaderField::from_key("ncols"), Some(HeaderField::Cols));
        assert_eq!(HeaderField::from_key("NODATA_VALUE"), Some(HeaderField::Nodata));
        assert_eq!("CELLSNUM".parse::<HeaderField>().unwrap(), HeaderField::CellsNum);
        assert!("SRS".parse::<HeaderField>().is_err());
    }

    #[test]
    fn default_header_is_seeded_with_the_sentinel() {
        let header = RasterHeader::default();
        assert!(header.iter().all(|(_, v)| v == NODATA_VALUE));
        assert_eq!(header.rows(), 0);
        assert!(header.validate().is_err());
    }

    #[test]
    fn get_set_by_key() -> Result<()> {
        let mut header = header();
        assert_eq!(header.get_by_key("NROWS")?, 4.0);
        header.set_by_key("xllcenter", 10.5)?;
        assert_eq!(header.xll(), 10.5);
        assert!(header.get_by_key("VALID_CELLNUMBER").is_err());
        assert!(header.set_by_key("MEAN", 1.0).is_err());
        Ok(())
    }

    #[test]
    fn copy_overwrites_all_fields() {
        let mut dest = header();
        let src = RasterHeader::new(2, 2, 3.0, 3.0, 2.0, -1.0);
        dest.copy_from(&src);
        assert_eq!(dest, src);
    }

    #[test]
    fn coordinates() {
        let header = header();
        assert_eq!(header.coordinate_of(0, 0), (1.0, 7.0));
        assert_eq!(header.coordinate_of(3, 2), (5.0, 1.0));

        assert_eq!(header.row_col_at(1.0, 7.0), Some(Cell::new(0, 0)));
        assert_eq!(header.row_col_at(5.0, 1.0), Some(Cell::new(3, 2)));
        // lower left corner of the grid
        assert_eq!(header.row_col_at(0.0, 0.0), None);
        assert_eq!(header.row_col_at(0.0, 0.5), Some(Cell::new(3, 0)));
        // on the boundary between cells
        assert_eq!(header.row_col_at(2.0, 6.0), Some(Cell::new(1, 1)));
        assert_eq!(header.row_col_at(7.0, 1.0), None);
        assert_eq!(header.row_col_at(-0.1, 1.0), None);
        assert_eq!(header.row_col_at(1.0, 8.1), None);
        // left and top edges belong to the grid, right and bottom edges do not
        assert_eq!(header.row_col_at(0.0, 8.0), Some(Cell::new(0, 0)));
        assert_eq!(header.row_col_at(6.0, 4.0), None);
        assert_eq!(header.row_col_at(3.0, 0.0), None);
    }

    #[test]
    fn coordinate_roundtrip() {
        let header = RasterHeader::new(20, 30, 100.25, -50.75, 0.5, NODATA_VALUE);
        for (row, col) in [(0, 0), (19, 29), (7, 13)] {
            let (x, y) = header.coordinate_of(row, col);
            assert_eq!(header.row_col_at(x, y), Some(Cell::new(row, col)));
        }

        let (x, y) = header.coordinate_of(19, 0);
        assert_relative_eq!(x, 100.25);
        assert_relative_eq!(y, -50.75);
    }

    #[test]
    fn validation() {
        assert!(header().validate().is_ok());

        let mut header = header();
        header.set(HeaderField::CellsNum, 13.0);
        assert!(header.validate().is_err());
        header.set(HeaderField::CellsNum, 6.0);
        header.set(HeaderField::CellSize, 0.0);
        assert!(header.validate().is_err());
    }
}
