//! Missing-value and duplicate-row reports.

use crate::catalog::format::write_csv;
use anyhow::{Context as _, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Quality counts for one column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnQuality {
    pub column: String,
    pub missing_values: usize,
    /// Duplicate rows of the whole table, repeated on every column.
    pub duplicated_rows: usize,
}

/// Per-column null counts and the table's duplicate-row count.
pub fn assess(df: &DataFrame) -> Result<Vec<ColumnQuality>> {
    let duplicated_rows = count_duplicate_rows(df)?;
    Ok(df
        .get_columns()
        .iter()
        .map(|column| ColumnQuality {
            column: column.name().to_string(),
            missing_values: column.null_count(),
            duplicated_rows,
        })
        .collect())
}

/// Rows equal to an earlier row in every column. The first occurrence is not
/// counted and nulls compare equal to each other.
pub fn count_duplicate_rows(df: &DataFrame) -> Result<usize> {
    if df.width() == 0 {
        return Ok(0);
    }
    let unique = df
        .unique_stable(None, UniqueKeepStrategy::First, None)
        .context("Failed to detect duplicate rows")?;
    Ok(df.height() - unique.height())
}

/// Report table with columns `column`, `missing_values`, `duplicated_rows`;
/// one row per column of `df`.
pub fn quality_report(df: &DataFrame) -> Result<DataFrame> {
    report_frame(&assess(df)?)
}

fn report_frame(rows: &[ColumnQuality]) -> Result<DataFrame> {
    let names: Vec<String> = rows.iter().map(|r| r.column.clone()).collect();
    let missing: Vec<i64> = rows.iter().map(|r| to_i64(r.missing_values)).collect();
    let duplicated: Vec<i64> = rows.iter().map(|r| to_i64(r.duplicated_rows)).collect();

    DataFrame::new(vec![
        Column::from(Series::new("column".into(), names)),
        Column::from(Series::new("missing_values".into(), missing)),
        Column::from(Series::new("duplicated_rows".into(), duplicated)),
    ])
    .context("Failed to assemble quality report")
}

pub fn report_file_name(label: &str) -> String {
    format!("missing_duplicates_report_{label}.csv")
}

/// Write one report per `(label, table)` into `dir`, replacing earlier
/// reports with the same label. Returns the written paths in input order.
pub fn write_reports(tables: &[(&str, &DataFrame)], dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(tables.len());
    for (label, df) in tables {
        let rows = assess(df)?;
        let path = dir.join(report_file_name(label));
        write_csv(&report_frame(&rows)?, &path)?;

        let missing: usize = rows.iter().map(|r| r.missing_values).sum();
        let duplicated = rows.first().map_or(0, |r| r.duplicated_rows);
        tracing::info!(
            "{label}: {missing} missing values, {duplicated} duplicated rows -> {}",
            path.display()
        );
        written.push(path);
    }
    Ok(written)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table_with_gap() -> DataFrame {
        let x = Series::new("X".into(), vec![Some("a"), None, Some("c"), Some("d"), Some("e")]);
        let y = Series::new("Y".into(), vec![1i64, 2, 3, 4, 5]);
        DataFrame::new(vec![Column::from(x), Column::from(y)]).unwrap()
    }

    #[test]
    fn test_assess_counts_missing_per_column() {
        let rows = assess(&table_with_gap()).unwrap();
        assert_eq!(
            rows,
            vec![
                ColumnQuality {
                    column: "X".to_owned(),
                    missing_values: 1,
                    duplicated_rows: 0,
                },
                ColumnQuality {
                    column: "Y".to_owned(),
                    missing_values: 0,
                    duplicated_rows: 0,
                },
            ]
        );
    }

    #[test]
    fn test_duplicates_skip_first_occurrence() {
        let x = Series::new("X".into(), vec![Some("a"), Some("a"), None, None, Some("a")]);
        let y = Series::new("Y".into(), vec![1i64, 1, 2, 2, 3]);
        let df = DataFrame::new(vec![Column::from(x), Column::from(y)]).unwrap();

        // (a,1) repeats once, (null,2) repeats once, (a,3) is unique
        assert_eq!(count_duplicate_rows(&df).unwrap(), 2);
    }

    #[test]
    fn test_duplicates_need_every_column_equal() {
        let x = Series::new("X".into(), vec!["a", "a"]);
        let y = Series::new("Y".into(), vec![1.0, 1.5]);
        let df = DataFrame::new(vec![Column::from(x), Column::from(y)]).unwrap();
        assert_eq!(count_duplicate_rows(&df).unwrap(), 0);
    }

    #[test]
    fn test_duplicates_of_frame_without_columns() {
        assert_eq!(count_duplicate_rows(&DataFrame::empty()).unwrap(), 0);
    }

    #[test]
    fn test_quality_report_shape() {
        let report = quality_report(&table_with_gap()).unwrap();
        assert_eq!(report.height(), 2);
        let names: Vec<&str> = report
            .get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect();
        assert_eq!(names, vec!["column", "missing_values", "duplicated_rows"]);
    }

    #[test]
    fn test_write_reports_one_file_per_label() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("02_reporting");
        let df = table_with_gap();

        let written = write_reports(&[("day_wise", &df), ("full_grouped", &df)], &target).unwrap();

        assert_eq!(written.len(), 2);
        assert!(target.join("missing_duplicates_report_day_wise.csv").exists());
        assert!(target.join("missing_duplicates_report_full_grouped.csv").exists());

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("column,missing_values,duplicated_rows"));
        assert_eq!(lines.next(), Some("X,1,0"));
        assert_eq!(lines.next(), Some("Y,0,0"));
    }
}
