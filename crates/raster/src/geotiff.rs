//! Single band GeoTIFF support using the pure Rust tiff crate.
//!
//! The geo transform is stored with the `ModelPixelScale` and `ModelTiepoint` tags, the
//! nodata value with the GDAL nodata tag. Values are always written as 32 bit floats.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, Write},
    path::Path,
};

use num::ToPrimitive;
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    encoder::{DirectoryEncoder, TiffEncoder, TiffKindStandard, colortype},
    tags::Tag,
};

use crate::{Error, GridData, NODATA_VALUE, RasterCodec, RasterHeader, RasterNum, RasterOptions, Result};

const GT_CITATION_GEO_KEY: u16 = 1026;

#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffCodec;

fn read_cell_size<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<(f64, f64)> {
    let values = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Runtime("ModelPixelScale tag not found".into()))?;
    if values.len() < 2 {
        return Err(Error::Runtime("ModelPixelScale must have at least 2 values".into()));
    }

    Ok((values[0], values[1]))
}

fn read_tie_points<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<[f64; 6]> {
    let values = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Runtime("ModelTiepoint tag not found".into()))?;
    if values.len() < 6 {
        return Err(Error::Runtime("ModelTiepoint must have 6 values".into()));
    }

    let mut tie_points = [0.0; 6];
    tie_points.copy_from_slice(&values[0..6]);
    Ok(tie_points)
}

fn read_ascii_tag<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Option<String> {
    decoder
        .get_tag_ascii_string(tag)
        .ok()
        .map(|s| s.trim_matches(|c: char| c == '\0' || c == '|' || c.is_whitespace()).to_string())
}

fn convert_values<S: ToPrimitive, T: RasterNum>(values: Vec<S>, nodata: f64) -> Vec<T> {
    values
        .into_iter()
        .map(|v| T::from_f64(v.to_f64().unwrap_or(nodata)))
        .collect()
}

fn decode_values<T: RasterNum>(result: DecodingResult, nodata: f64) -> Vec<T> {
    match result {
        // 8 bit data carries no signedness, a negative nodata value marks signed bytes
        DecodingResult::U8(v) if nodata < 0.0 => convert_values(v.into_iter().map(|b| b as i8).collect(), nodata),
        DecodingResult::U8(v) => convert_values(v, nodata),
        DecodingResult::U16(v) => convert_values(v, nodata),
        DecodingResult::U32(v) => convert_values(v, nodata),
        DecodingResult::U64(v) => convert_values(v, nodata),
        DecodingResult::F16(v) => convert_values(v.into_iter().map(f32::from).collect(), nodata),
        DecodingResult::F32(v) => convert_values(v, nodata),
        DecodingResult::F64(v) => convert_values(v, nodata),
        DecodingResult::I8(v) => convert_values(v, nodata),
        DecodingResult::I16(v) => convert_values(v, nodata),
        DecodingResult::I32(v) => convert_values(v, nodata),
        DecodingResult::I64(v) => convert_values(v, nodata),
    }
}

fn read_geotiff<T: RasterNum, R: Read + Seek>(stream: R) -> Result<GridData<T>> {
    let mut decoder = Decoder::new(stream)?.with_limits(Limits::unlimited());
    let (cols, rows) = decoder.dimensions()?;
    let (cell_size_x, cell_size_y) = read_cell_size(&mut decoder)?;
    let tie_points = read_tie_points(&mut decoder)?;

    if (cell_size_x - cell_size_y).abs() > f64::EPSILON * cell_size_x.abs().max(1.0) {
        log::warn!("Non square cells ({cell_size_x} x {cell_size_y}), using the horizontal cell size");
    }

    // top left corner of the grid
    let origin_x = tie_points[3] - tie_points[0] * cell_size_x;
    let origin_y = tie_points[4] + tie_points[1] * cell_size_y;

    let nodata = read_ascii_tag(&mut decoder, Tag::GdalNodata)
        .and_then(|nodata| nodata.parse::<f64>().ok())
        .unwrap_or(NODATA_VALUE);

    let header = RasterHeader::new(
        rows as usize,
        cols as usize,
        origin_x + 0.5 * cell_size_x,
        origin_y - (rows as f64 - 0.5) * cell_size_y,
        cell_size_x,
        nodata,
    );
    header.validate()?;

    let mut options = RasterOptions::new();
    if let Some(srs) = read_ascii_tag(&mut decoder, Tag::GeoAsciiParamsTag).filter(|srs| !srs.is_empty()) {
        options.set_srs(&srs);
    }

    let values = decode_values(decoder.read_image()?, nodata);
    if values.len() != header.cell_count() {
        return Err(Error::SizeMismatch {
            expected: header.cell_count(),
            actual: values.len(),
        });
    }

    Ok(GridData { header, options, values })
}

fn write_spatial_reference_tags<W: Write + Seek>(
    dir_encoder: &mut DirectoryEncoder<'_, W, TiffKindStandard>,
    header: &RasterHeader,
    srs: &str,
) -> Result {
    let cell_size = header.cell_size();
    dir_encoder.write_tag(Tag::ModelPixelScaleTag, &[cell_size, cell_size, 0.0][..])?;

    // The top left corner of the grid is the tie point of raster coordinate (0, 0)
    let tie_points = [
        0.0,
        0.0,
        0.0,
        header.xll() - 0.5 * cell_size,
        header.yll() + (header.rows() as f64 - 0.5) * cell_size,
        0.0,
    ];
    dir_encoder.write_tag(Tag::ModelTiepointTag, &tie_points[..])?;

    let nodata = header.nodata().to_string();
    dir_encoder.write_tag(Tag::GdalNodata, nodata.as_str())?;

    if !srs.is_empty() {
        let citation = format!("{srs}|");
        let geo_keys: [u16; 8] = [1, 1, 0, 1, GT_CITATION_GEO_KEY, Tag::GeoAsciiParamsTag.to_u16(), citation.len() as u16, 0];
        dir_encoder.write_tag(Tag::GeoKeyDirectoryTag, &geo_keys[..])?;
        dir_encoder.write_tag(Tag::GeoAsciiParamsTag, citation.as_str())?;
    }

    Ok(())
}

fn rows_per_strip(cols: usize, rows: usize) -> u32 {
    // aim for strips of about 8KB
    let target_strip_size = 8 * 1024;
    let bytes_per_row = cols * std::mem::size_of::<f32>();
    let rows_per_strip = if bytes_per_row > 0 {
        (target_strip_size / bytes_per_row).max(1)
    } else {
        1
    };

    rows_per_strip.min(rows) as u32
}

impl RasterCodec for GeoTiffCodec {
    fn read_grid<T: RasterNum>(&self, path: &Path) -> Result<GridData<T>> {
        let file = File::open(path)?;
        read_geotiff(BufReader::new(file))
            .map_err(|e| Error::Runtime(format!("Failed to read GeoTIFF '{}' ({e})", path.display())))
    }

    fn write_grid<T: RasterNum>(&self, path: &Path, header: &RasterHeader, options: &RasterOptions, values: &[T]) -> Result {
        if values.len() != header.cell_count() {
            return Err(Error::SizeMismatch {
                expected: header.cell_count(),
                actual: values.len(),
            });
        }

        let data: Vec<f32> = values.iter().map(|v| v.as_f64() as f32).collect();

        inf::fs::create_directory_for_file(path)?;
        let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
        let mut image = encoder.new_image::<colortype::Gray32Float>(header.cols() as u32, header.rows() as u32)?;
        write_spatial_reference_tags(image.encoder(), header, options.srs())?;
        image.rows_per_strip(rows_per_strip(header.cols(), header.rows()))?;
        image.write_data(&data)?;
        Ok(())
    }
}
