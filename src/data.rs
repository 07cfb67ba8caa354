//! Values carried along the edges of a pipeline graph.

use polars::prelude::DataFrame;
use std::fmt;

/// A materialized dataset or parameter value.
#[derive(Debug, Clone)]
pub enum Data {
    /// Tabular dataset
    Table(DataFrame),

    /// Encoded PNG image
    Image(Vec<u8>),

    /// Externally supplied parameter
    Param(serde_json::Value),
}

impl Data {
    pub fn as_table(&self) -> Option<&DataFrame> {
        match self {
            Self::Table(df) => Some(df),
            _ => None,
        }
    }

    pub fn as_param(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Param(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Image(_) => "image",
            Self::Param(_) => "parameter",
        }
    }
}

impl From<DataFrame> for Data {
    fn from(df: DataFrame) -> Self {
        Self::Table(df)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(df) => write!(f, "table {}x{}", df.height(), df.width()),
            Self::Image(bytes) => write!(f, "image ({} bytes)", bytes.len()),
            Self::Param(value) => write!(f, "parameter {value}"),
        }
    }
}
