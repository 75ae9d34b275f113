//! Arc/Info ASCII grid support.
//!
//! The header consists of `KEYWORD value` pairs followed by the row-major cell values.
//! Lower left coordinates can be given as cell centers (`XLLCENTER`, `YLLCENTER`) or as
//! the lower left corner of the grid (`XLLCORNER`, `YLLCORNER`), corners are converted
//! to cell centers on read. Files are always written with center coordinates.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use inf::cast::parse_number;

use crate::{Error, GridData, HeaderField, NODATA_VALUE, RasterCodec, RasterHeader, RasterNum, RasterOptions, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiGridCodec;

enum Origin {
    Center(f64),
    Corner(f64),
}

#[derive(Default)]
struct AsciiHeader {
    cols: Option<f64>,
    rows: Option<f64>,
    x: Option<Origin>,
    y: Option<Origin>,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

impl AsciiHeader {
    fn set(&mut self, keyword: &str, value: f64) {
        match keyword.to_ascii_uppercase().as_str() {
            "NCOLS" => self.cols = Some(value),
            "NROWS" => self.rows = Some(value),
            "XLLCENTER" => self.x = Some(Origin::Center(value)),
            "XLLCORNER" => self.x = Some(Origin::Corner(value)),
            "YLLCENTER" => self.y = Some(Origin::Center(value)),
            "YLLCORNER" => self.y = Some(Origin::Corner(value)),
            "CELLSIZE" => self.cellsize = Some(value),
            "NODATA_VALUE" => self.nodata = Some(value),
            _ => log::warn!("Ignoring unknown ASCII grid header keyword: {keyword}"),
        }
    }

    fn into_header(self) -> Result<RasterHeader> {
        let missing = |name: &str| Error::InvalidArgument(format!("ASCII grid header lacks {name}"));

        let cols = self.cols.ok_or_else(|| missing("NCOLS"))?;
        let rows = self.rows.ok_or_else(|| missing("NROWS"))?;
        let cellsize = self.cellsize.ok_or_else(|| missing("CELLSIZE"))?;
        let to_center = |origin: Origin| match origin {
            Origin::Center(v) => v,
            Origin::Corner(v) => v + 0.5 * cellsize,
        };
        let xll = to_center(self.x.ok_or_else(|| missing("XLLCENTER or XLLCORNER"))?);
        let yll = to_center(self.y.ok_or_else(|| missing("YLLCENTER or YLLCORNER"))?);

        if !inf::cast::is_integral(cols) || !inf::cast::is_integral(rows) || cols < 1.0 || rows < 1.0 {
            return Err(Error::InvalidArgument(format!("Invalid ASCII grid dimensions: {rows}x{cols}")));
        }

        let header = RasterHeader::new(
            rows as usize,
            cols as usize,
            xll,
            yll,
            cellsize,
            self.nodata.unwrap_or(NODATA_VALUE),
        );
        header.validate()?;
        Ok(header)
    }
}

fn is_numeric(token: &str) -> bool {
    parse_number(token).is_ok()
}

fn parse_grid<T: RasterNum>(text: &str) -> Result<(RasterHeader, Vec<T>)> {
    let mut tokens = text.split_ascii_whitespace().peekable();

    let mut ascii_header = AsciiHeader::default();
    while let Some(keyword) = tokens.next_if(|token| !is_numeric(token)) {
        let value = tokens
            .next()
            .ok_or_else(|| Error::InvalidArgument(format!("ASCII grid header keyword {keyword} has no value")))?;
        ascii_header.set(keyword, parse_number(value)?);
    }

    let header = ascii_header.into_header()?;
    let cell_count = header.cell_count();
    let mut values = Vec::with_capacity(cell_count);
    for token in tokens.by_ref().take(cell_count) {
        values.push(T::from_f64(parse_number(token)?));
    }

    if values.len() != cell_count {
        return Err(Error::SizeMismatch {
            expected: cell_count,
            actual: values.len(),
        });
    }

    if tokens.next().is_some() {
        log::warn!("ASCII grid contains more values than the header announces ({cell_count})");
    }

    Ok((header, values))
}

impl RasterCodec for AsciiGridCodec {
    fn read_grid<T: RasterNum>(&self, path: &Path) -> Result<GridData<T>> {
        let text = std::fs::read_to_string(path)?;
        let (header, values) = parse_grid(&text)
            .map_err(|e| Error::Runtime(format!("Failed to read ASCII grid '{}' ({e})", path.display())))?;

        Ok(GridData {
            header,
            options: RasterOptions::new(),
            values,
        })
    }

    fn write_grid<T: RasterNum>(&self, path: &Path, header: &RasterHeader, _options: &RasterOptions, values: &[T]) -> Result {
        if values.len() != header.cell_count() {
            return Err(Error::SizeMismatch {
                expected: header.cell_count(),
                actual: values.len(),
            });
        }

        inf::fs::create_directory_for_file(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        for field in [
            HeaderField::Cols,
            HeaderField::Rows,
            HeaderField::XllCenter,
            HeaderField::YllCenter,
            HeaderField::CellSize,
            HeaderField::Nodata,
        ] {
            writeln!(writer, "{} {}", field.key(), header.get(field))?;
        }

        for row in values.chunks(header.cols()) {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }

        writer.flush()?;
        Ok(())
    }
}
