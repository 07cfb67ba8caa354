//! Null normalization rules for the raw COVID-19 datasets.
//!
//! Every rule keeps the row count and the column order; only null cells in the
//! named columns change.

use anyhow::{Context as _, Result};
use polars::prelude::*;

/// Replacement for missing categorical values.
pub const UNKNOWN: &str = "Unknown";

/// Categorical worldometer columns filled with [`UNKNOWN`].
pub const WORLDOMETER_CATEGORICAL: [&str; 2] = ["Continent", "WHO Region"];

/// Numeric worldometer columns filled with zero.
pub const WORLDOMETER_NUMERIC: [&str; 12] = [
    "Population",
    "NewCases",
    "TotalDeaths",
    "NewDeaths",
    "TotalRecovered",
    "NewRecovered",
    "ActiveCases",
    "Serious,Critical",
    "Tot Cases/1M pop",
    "Deaths/1M pop",
    "TotalTests",
    "Tests/1M pop",
];

/// `Province/State` nulls become `"Unknown"`.
pub fn clean_province_state(df: &DataFrame) -> Result<DataFrame> {
    fill_text(df, &["Province/State"], UNKNOWN)
}

/// `FIPS` and `Admin2` nulls become `"Unknown"`.
pub fn clean_usa_county(df: &DataFrame) -> Result<DataFrame> {
    fill_text(df, &["FIPS", "Admin2"], UNKNOWN)
}

/// Categorical columns get `"Unknown"`, numeric columns get `0`. Columns the
/// table does not have are skipped.
pub fn clean_worldometer_data(df: &DataFrame) -> Result<DataFrame> {
    let categorical = present_columns(df, &WORLDOMETER_CATEGORICAL);
    let numeric = present_columns(df, &WORLDOMETER_NUMERIC);

    let df = fill_text(df, &categorical, UNKNOWN)?;
    fill_zero(&df, &numeric)
}

/// Fill nulls in `columns` with `sentinel`. Non-string columns are cast to
/// string first so the sentinel fits. Every column must exist.
pub fn fill_text(df: &DataFrame, columns: &[&str], sentinel: &str) -> Result<DataFrame> {
    let mut exprs = Vec::with_capacity(columns.len());
    for &name in columns {
        let dtype = df
            .column(name)
            .with_context(|| format!("Column '{name}' not found"))?
            .dtype()
            .clone();

        let expr = if dtype == DataType::String {
            col(name)
        } else {
            col(name).cast(DataType::String)
        };
        exprs.push(expr.fill_null(lit(sentinel)).alias(name));
    }
    apply(df, exprs)
}

/// Fill nulls in numeric `columns` with zero. Every column must exist.
pub fn fill_zero(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut exprs = Vec::with_capacity(columns.len());
    for &name in columns {
        df.column(name)
            .with_context(|| format!("Column '{name}' not found"))?;
        exprs.push(col(name).fill_null(lit(0)).alias(name));
    }
    apply(df, exprs)
}

fn present_columns<'a>(df: &DataFrame, candidates: &[&'a str]) -> Vec<&'a str> {
    candidates
        .iter()
        .copied()
        .filter(|name| df.column(name).is_ok())
        .collect()
}

fn apply(df: &DataFrame, exprs: Vec<Expr>) -> Result<DataFrame> {
    if exprs.is_empty() {
        return Ok(df.clone());
    }
    df.clone()
        .lazy()
        .with_columns(exprs)
        .collect()
        .context("Failed to fill missing values")
}
