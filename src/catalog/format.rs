//! Format handlers behind catalog entries.
//!
//! Each handler reads or writes one [`Data`] kind. Writers are deterministic:
//! the same value always produces the same bytes.

use crate::data::Data;
use anyhow::{Context as _, Result};
use image::ImageFormat;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Rows sampled when inferring the schema of a CSV file.
pub const INFER_SCHEMA_ROWS: usize = 10_000;

/// Storage format of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    /// Comma-delimited table with a header row
    #[serde(alias = "tabular-delimited")]
    Csv,

    /// PNG image
    Image,
}

impl DatasetFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Image => "image",
        }
    }

    /// Whether a value of this kind can be stored in this format.
    pub fn accepts(self, data: &Data) -> bool {
        matches!(
            (self, data),
            (Self::Csv, Data::Table(_)) | (Self::Image, Data::Image(_))
        )
    }

    pub fn read(self, path: &Path) -> Result<Data> {
        match self {
            Self::Csv => read_csv(path).map(Data::Table),
            Self::Image => read_png(path).map(Data::Image),
        }
    }

    pub fn write(self, data: &Data, path: &Path) -> Result<()> {
        match (self, data) {
            (Self::Csv, Data::Table(df)) => write_csv(df, path),
            (Self::Image, Data::Image(bytes)) => write_png(bytes, path),
            (format, other) => Err(anyhow::anyhow!(
                "Cannot store a {} as {}",
                other.kind(),
                format.as_str()
            )),
        }
    }
}

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .finish()
        .context("Failed to scan CSV")?
        .collect()
        .context("Failed to read CSV")
}

pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut df = df.clone();
    let file = File::create(path).context("Failed to create CSV file")?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut df)
        .context("Failed to write CSV file")
}

pub fn read_png(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).context("Failed to read image file")?;
    image::load_from_memory_with_format(&bytes, ImageFormat::Png)
        .context("File is not a valid PNG image")?;
    Ok(bytes)
}

pub fn write_png(bytes: &[u8], path: &Path) -> Result<()> {
    if image::guess_format(bytes).ok() != Some(ImageFormat::Png) {
        return Err(anyhow::anyhow!("Image data is not PNG encoded"));
    }
    std::fs::write(path, bytes).context("Failed to write image file")
}
