use std::path::Path;

use crate::{
    AsciiGridCodec, RasterCodec, RasterData, RasterHeader, RasterNum, RasterOptions, ReadOptions, Result, Storage,
};

pub const NOD: f64 = -9999.0;

pub fn create_vec<T: RasterNum>(data: &[f64]) -> Vec<T> {
    data.iter().map(|&v| T::from_f64(v)).collect()
}

/// 4 rows, 3 columns, lower left cell center at (1, 1), cell size 2.
pub fn demo_header() -> RasterHeader {
    RasterHeader::new(4, 3, 1.0, 1.0, 2.0, NOD)
}

pub fn demo_values<T: RasterNum>() -> Vec<T> {
    create_vec(&[1.0, 2.0, NOD, NOD, 3.0, 4.0, NOD, 5.0, NOD, NOD, NOD, 6.0])
}

/// The demo grid as it is right after reading it from disk.
pub fn demo_raster<T: RasterNum>(opts: &ReadOptions) -> RasterData<T> {
    RasterData::from_grid(demo_header(), RasterOptions::new(), Storage::Flat(demo_values()), opts)
}

/// Full grid mask raster with cell size 2.
pub fn mask_raster<M: RasterNum>(rows: usize, cols: usize, xll: f64, yll: f64, values: &[f64]) -> RasterData<M> {
    RasterData::from_array(RasterHeader::new(rows, cols, xll, yll, 2.0, NOD), create_vec(values), RasterOptions::new())
        .expect("valid mask raster")
}

/// Values of a 20x30 grid: every tenth cell is nodata (59 cells), the first value is the
/// minimum 2.75 and the last value the maximum 98.49.
pub fn grid_20x30_values(offset: f64) -> Vec<f64> {
    (0..600)
        .map(|i| match i {
            0 => 2.75,
            599 => 98.49,
            i if i % 10 == 3 && i < 590 => NOD,
            i => 10.0 + (i % 80) as f64 + offset,
        })
        .collect()
}

pub fn grid_20x30_header() -> RasterHeader {
    RasterHeader::new(20, 30, 500.5, 1000.5, 1.0, NOD)
}

pub fn write_ascii_grid<T: RasterNum>(path: &Path, header: &RasterHeader, values: &[T]) -> Result {
    AsciiGridCodec.write_grid(path, header, &RasterOptions::new(), values)
}
