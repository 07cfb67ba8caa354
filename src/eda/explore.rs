//! Structural summaries of a table, emitted to the log.

use anyhow::Result;
use polars::prelude::*;

/// Rows shown in the preview.
pub const PREVIEW_ROWS: usize = 3;

/// Columns described in the summary block.
pub const SUMMARY_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub unique: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub described: Vec<ColumnSummary>,
}

/// Summarize `df` and log shape, column names, a short preview and a
/// per-column description.
pub fn explore_dataset(df: &DataFrame, name: &str) -> Result<DatasetSummary> {
    let summary = summarize(df, name)?;

    tracing::info!("===== Exploring dataset: {name} =====");
    tracing::info!("Shape: ({}, {})", summary.rows, summary.columns.len());
    tracing::info!("Columns: {}", summary.columns.join(", "));
    tracing::info!("First {PREVIEW_ROWS} rows:\n{}", df.head(Some(PREVIEW_ROWS)));
    for column in &summary.described {
        tracing::info!(
            "  {} [{}] non-null={} unique={} min={} max={} mean={}",
            column.name,
            column.dtype,
            column.non_null,
            column.unique,
            fmt_stat(column.min),
            fmt_stat(column.max),
            fmt_stat(column.mean)
        );
    }

    Ok(summary)
}

pub fn summarize(df: &DataFrame, name: &str) -> Result<DatasetSummary> {
    let described = df
        .get_columns()
        .iter()
        .take(SUMMARY_COLUMNS)
        .map(|column| describe_column(column.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?;

    Ok(DatasetSummary {
        name: name.to_owned(),
        rows: df.height(),
        columns: df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect(),
        described,
    })
}

fn describe_column(series: &Series) -> Result<ColumnSummary> {
    let (min, max, mean) = if series.dtype().is_primitive_numeric() {
        let values = series.cast(&DataType::Float64)?;
        let values = values.f64()?;
        (values.min(), values.max(), values.mean())
    } else {
        (None, None, None)
    };

    Ok(ColumnSummary {
        name: series.name().to_string(),
        dtype: series.dtype().to_string(),
        non_null: series.len() - series.null_count(),
        unique: series.n_unique()?,
        min,
        max,
        mean,
    })
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.2}"))
}
