//! The COVID-19 exploratory analysis pipeline.
//!
//! Six raw tables are explored, three are cleaned, all six get a
//! missing/duplicate report and two charts are drawn from the cleaned data.
//!
//! - [`explore`]: shape, columns, preview and column summary in the log
//! - [`cleaning`]: null normalization per dataset
//! - [`quality`]: missing-value and duplicate-row reports
//! - [`plots`]: case charts rendered to PNG

pub mod cleaning;
pub mod explore;
pub mod plots;
pub mod quality;

use crate::data::Data;
use crate::pipeline::{Node, PARAMS_PREFIX};
use std::path::Path;

pub const COUNTRY_WISE_LATEST: &str = "country_wise_latest";
pub const CLEAN_COMPLETE: &str = "covid_19_clean_complete";
pub const DAY_WISE: &str = "day_wise";
pub const FULL_GROUPED: &str = "full_grouped";
pub const USA_COUNTY_WISE: &str = "usa_county_wise";
pub const WORLDOMETER_DATA: &str = "worldometer_data";

pub const CLEAN_COMPLETE_FINAL: &str = "covid_19_clean_complete_final";
pub const USA_COUNTY_WISE_CLEAN: &str = "usa_county_wise_clean";
pub const WORLDOMETER_DATA_CLEAN: &str = "worldometer_data_clean";

pub const COVID_CASES_PLOT: &str = "covid_cases_plot";
pub const CASES_BY_CONTINENT_PLOT: &str = "cases_by_continent_plot";

/// Parameter naming the directory that receives the quality reports.
pub const REPORTING_DIR_PARAM: &str = "reporting_dir";

/// `(node name, raw dataset, label parameter)` for each exploration step.
const EXPLORATIONS: [(&str, &str, &str); 6] = [
    ("explore_country_wise", COUNTRY_WISE_LATEST, "params:dataset1_name"),
    ("explore_clean_complete", CLEAN_COMPLETE, "params:dataset2_name"),
    ("explore_day_wise", DAY_WISE, "params:dataset3_name"),
    ("explore_full_grouped", FULL_GROUPED, "params:dataset4_name"),
    ("explore_usa_county", USA_COUNTY_WISE, "params:dataset5_name"),
    ("explore_worldometer", WORLDOMETER_DATA, "params:dataset6_name"),
];

/// `(report label, dataset)` checked by `check_all_datasets`, in input order.
pub const REPORTED_DATASETS: [(&str, &str); 6] = [
    ("covid_19_clean_complete", CLEAN_COMPLETE_FINAL),
    ("day_wise", DAY_WISE),
    ("full_grouped", FULL_GROUPED),
    ("usa_county_wise", USA_COUNTY_WISE_CLEAN),
    ("worldometer_data", WORLDOMETER_DATA_CLEAN),
    ("country_wise_latest", COUNTRY_WISE_LATEST),
];

/// Nodes of the `eda` pipeline in declaration order.
pub fn create_pipeline() -> Vec<Node> {
    let mut nodes: Vec<Node> = EXPLORATIONS
        .iter()
        .map(|&(name, dataset, label)| {
            Node::new(name, &[dataset, label], &[], |inputs| {
                let df = inputs.table(0)?;
                let label = inputs.param_str(1)?;
                explore::explore_dataset(df, label)?;
                Ok(vec![])
            })
        })
        .collect();

    nodes.push(Node::table_transform(
        "clean_province_state_node",
        CLEAN_COMPLETE,
        CLEAN_COMPLETE_FINAL,
        cleaning::clean_province_state,
    ));
    nodes.push(Node::table_transform(
        "clean_usa_county_node",
        USA_COUNTY_WISE,
        USA_COUNTY_WISE_CLEAN,
        cleaning::clean_usa_county,
    ));
    nodes.push(Node::table_transform(
        "clean_worldometer_data_node",
        WORLDOMETER_DATA,
        WORLDOMETER_DATA_CLEAN,
        cleaning::clean_worldometer_data,
    ));

    nodes.push(check_all_datasets());

    nodes.push(Node::new(
        "plot_cases_node",
        &[CLEAN_COMPLETE_FINAL],
        &[COVID_CASES_PLOT],
        |inputs| Ok(vec![Data::Image(plots::plot_cases(inputs.table(0)?)?)]),
    ));
    nodes.push(Node::new(
        "plot_cases_by_continent_node",
        &[WORLDOMETER_DATA_CLEAN],
        &[CASES_BY_CONTINENT_PLOT],
        |inputs| {
            Ok(vec![Data::Image(plots::plot_cases_by_continent(
                inputs.table(0)?,
            )?)])
        },
    ));

    nodes
}

fn check_all_datasets() -> Node {
    let reporting_dir = format!("{PARAMS_PREFIX}{REPORTING_DIR_PARAM}");
    let mut declared: Vec<&str> = REPORTED_DATASETS.iter().map(|(_, id)| *id).collect();
    declared.push(&reporting_dir);

    Node::new("check_all_datasets", &declared, &[], |inputs| {
        let dir = inputs.param_str(REPORTED_DATASETS.len())?;
        let mut tables = Vec::with_capacity(REPORTED_DATASETS.len());
        for (i, (label, _)) in REPORTED_DATASETS.iter().enumerate() {
            tables.push((*label, inputs.table(i)?));
        }
        quality::write_reports(&tables, Path::new(dir))?;
        Ok(vec![])
    })
}
