use rayon::prelude::*;

use crate::RasterNum;

/// Cell values of a raster.
///
/// Single layer rasters keep one value per stored cell, multi layer rasters keep a vector
/// of layer values per stored cell (`values[cell][layer]`). Layer arguments are zero based.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage<T> {
    Flat(Vec<T>),
    Layered(Vec<Vec<T>>),
}

impl<T: RasterNum> Storage<T> {
    /// Builds the storage from per cell layer values, `layered` selects the representation.
    /// The flat representation keeps the first layer only.
    pub fn from_cells(cells: Vec<Vec<T>>, layered: bool, nodata: T) -> Self {
        if layered {
            Storage::Layered(cells)
        } else {
            Storage::Flat(cells.into_iter().map(|c| c.first().copied().unwrap_or(nodata)).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Storage::Flat(values) => values.len(),
            Storage::Layered(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_layered(&self) -> bool {
        matches!(self, Storage::Layered(_))
    }

    pub fn value(&self, index: usize, layer: usize) -> Option<T> {
        match self {
            Storage::Flat(values) if layer == 0 => values.get(index).copied(),
            Storage::Flat(_) => None,
            Storage::Layered(values) => values.get(index).and_then(|cell| cell.get(layer).copied()),
        }
    }

    pub fn set(&mut self, index: usize, layer: usize, value: T) -> bool {
        let slot = match self {
            Storage::Flat(values) if layer == 0 => values.get_mut(index),
            Storage::Flat(_) => None,
            Storage::Layered(values) => values.get_mut(index).and_then(|cell| cell.get_mut(layer)),
        };

        match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// All layer values of a stored cell.
    pub fn cell_values(&self, index: usize) -> Option<Vec<T>> {
        match self {
            Storage::Flat(values) => values.get(index).map(|v| vec![*v]),
            Storage::Layered(values) => values.get(index).cloned(),
        }
    }

    /// Keeps the cells at the given offsets in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        match self {
            Storage::Flat(values) => Storage::Flat(indices.iter().map(|&i| values[i]).collect()),
            Storage::Layered(values) => Storage::Layered(indices.iter().map(|&i| values[i].clone()).collect()),
        }
    }

    /// Values of one layer promoted to double precision.
    pub fn layer_values(&self, layer: usize) -> Vec<f64> {
        match self {
            Storage::Flat(values) => values.par_iter().map(|v| v.as_f64()).collect(),
            Storage::Layered(values) => values
                .par_iter()
                .map(|cell| cell.get(layer).map_or(f64::NAN, |v| v.as_f64()))
                .collect(),
        }
    }

    /// Applies `op` to every value of every layer.
    pub fn par_map_values(&mut self, op: impl Fn(T) -> T + Sync + Send) {
        match self {
            Storage::Flat(values) => values.par_iter_mut().for_each(|v| *v = op(*v)),
            Storage::Layered(values) => values.par_iter_mut().for_each(|cell| {
                cell.iter_mut().for_each(|v| *v = op(*v));
            }),
        }
    }
}
