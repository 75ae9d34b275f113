use std::path::{Path, PathBuf};

use crate::{Error, RasterData, RasterFormat, RasterNum, Result};

/// Output paths of the layers of a multi layer raster: `<dir>/<stem>_<layer>.<ext>`.
fn layer_paths(path: &Path, layers: usize, format: RasterFormat) -> Vec<PathBuf> {
    let stem = inf::fs::core_name(path);
    (1..=layers)
        .map(|lyr| path.with_file_name(format!("{stem}_{lyr}.{}", format.extension())))
        .collect()
}

impl<T: RasterNum> RasterData<T> {
    fn write_layers(&self, path: &Path, format: RasterFormat) -> Result {
        if !self.initialized() {
            return Err(Error::Runtime("Raster data is not initialized".into()));
        }

        let paths = if self.is_2d() {
            layer_paths(path, self.layers(), format)
        } else {
            vec![path.to_path_buf()]
        };

        for (lyr, layer_path) in (1..).zip(&paths) {
            let values = self
                .full_grid(lyr)
                .ok_or_else(|| Error::InvalidArgument(format!("Invalid layer {lyr}")))?;
            format.write_grid(layer_path, &self.header, &self.options, &values)?;
            log::debug!("Wrote layer {lyr} to {}", layer_path.display());
        }

        Ok(())
    }

    fn output_with_format(&self, path: &Path, format: RasterFormat) -> bool {
        match self.write_layers(path, format) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to write raster to {}: {e}", path.display());
                false
            }
        }
    }

    /// Writes the raster, the format is selected by the file extension. Unknown extensions
    /// are replaced by the GeoTIFF extension (the ASCII grid extension without GeoTIFF support).
    /// Multi layer rasters are written as one file per layer.
    pub fn output_to_file(&self, path: &Path) -> bool {
        if inf::fs::directory_of(path).is_none() {
            log::error!("Output path needs a directory: {}", path.display());
            return false;
        }

        if !self.validate_raster_data() {
            return false;
        }

        match RasterFormat::guess_from_path(path) {
            Some(format) => self.output_with_format(path, format),
            None => {
                let format = RasterFormat::fallback();
                let path = inf::fs::replace_suffix(path, format.extension());
                log::warn!("Unknown raster extension, writing {}", path.display());
                self.output_with_format(&path, format)
            }
        }
    }

    pub fn output_ascii(&self, path: &Path) -> bool {
        self.output_with_format(path, RasterFormat::AsciiGrid)
    }

    pub fn output_geotiff(&self, path: &Path) -> bool {
        self.output_with_format(path, RasterFormat::GeoTiff)
    }
}
