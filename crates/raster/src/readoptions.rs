use crate::{NODATA_VALUE, RasterOptions};

/// Settings for constructing a raster from a file or blob.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    /// Compact the storage to the valid cells and build the position index.
    pub calc_pos: bool,
    /// Keep the full extent of the mask instead of cropping to the valid cells.
    pub use_mask_ext: bool,
    /// Fill value for masked cells without data.
    pub default_value: f64,
    /// Extra options merged into the options of the raster.
    pub options: RasterOptions,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            calc_pos: true,
            use_mask_ext: true,
            default_value: NODATA_VALUE,
            options: RasterOptions::new(),
        }
    }
}

impl ReadOptions {
    pub fn with_calc_pos(mut self, calc_pos: bool) -> Self {
        self.calc_pos = calc_pos;
        self
    }

    pub fn with_mask_extent(mut self, use_mask_ext: bool) -> Self {
        self.use_mask_ext = use_mask_ext;
        self
    }

    pub fn with_default_value(mut self, default_value: f64) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key, value);
        self
    }
}
