//! Integration tests for complete pipeline runs
//!
//! These tests build graphs against temporary project directories, execute
//! them and inspect what ends up on disk.

use covid_pipeline::catalog::{DataCatalog, DatasetFormat};
use covid_pipeline::config::{DEFAULT_ENV, Parameters, ProjectPaths};
use covid_pipeline::data::Data;
use covid_pipeline::eda::cleaning::{UNKNOWN, fill_text};
use covid_pipeline::eda::quality::{report_file_name, write_reports};
use covid_pipeline::error::PipelineError;
use covid_pipeline::pipeline::{Executor, Node, PipelineGraph};
use covid_pipeline::registry::DEFAULT_PIPELINE;
use covid_pipeline::session::Session;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RAW_FIXTURE: &str = "Id,X\n1,a\n2,\n3,c\n4,d\n5,e\n";

fn load_clean_report_nodes() -> Vec<Node> {
    vec![
        Node::table_transform("load_raw", "raw_source", "raw", |df| Ok(df.clone())),
        Node::table_transform("clean", "raw", "clean", |df| fill_text(df, &["X"], UNKNOWN)),
        Node::new(
            "report",
            &["raw", "clean", "params:reporting_dir"],
            &[],
            |inputs| {
                let dir = Path::new(inputs.param_str(2)?);
                write_reports(
                    &[("raw", inputs.table(0)?), ("clean", inputs.table(1)?)],
                    dir,
                )?;
                Ok(vec![])
            },
        ),
    ]
}

fn scenario_setup(dir: &TempDir) -> (DataCatalog, Parameters) {
    fs::write(dir.path().join("raw.csv"), RAW_FIXTURE).unwrap();

    let mut catalog = DataCatalog::new();
    catalog.register("raw_source", dir.path().join("raw.csv"), DatasetFormat::Csv);
    catalog.register(
        "clean",
        dir.path().join("03_intermediate/clean.csv"),
        DatasetFormat::Csv,
    );

    let reports = dir.path().join("02_reporting");
    let params = Parameters::new().with("reporting_dir", reports.to_string_lossy().into_owned());
    (catalog, params)
}

#[test]
fn test_load_clean_report_scenario() {
    let dir = TempDir::new().unwrap();
    let (catalog, params) = scenario_setup(&dir);

    let graph = PipelineGraph::build(load_clean_report_nodes(), &catalog, &params)
        .expect("Scenario graph should build");
    let report = Executor::new()
        .run(&graph, &catalog, &params)
        .expect("Scenario should run");

    assert_eq!(report.executed, vec!["load_raw", "clean", "report"]);
    assert_eq!(report.persisted, vec!["clean"]);
    assert!(
        report.free_outputs.is_empty(),
        "Intermediate 'raw' is consumed and must not be a free output"
    );

    let cleaned = catalog.load("clean").unwrap();
    let cleaned = cleaned.as_table().expect("CSV entries load as tables");
    assert_eq!(cleaned.height(), 5, "Cleaning must keep every row");
    assert_eq!(cleaned.column("X").unwrap().null_count(), 0);

    let raw_report = fs::read_to_string(dir.path().join("02_reporting").join(report_file_name("raw")))
        .expect("Raw report should be written");
    let lines: Vec<&str> = raw_report.lines().collect();
    assert_eq!(
        lines,
        vec!["column,missing_values,duplicated_rows", "Id,0,0", "X,1,0"]
    );

    let clean_report =
        fs::read_to_string(dir.path().join("02_reporting").join(report_file_name("clean")))
            .unwrap();
    assert!(clean_report.lines().any(|line| line == "X,0,0"));
}

#[test]
fn test_missing_declared_output_is_never_written() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("raw.csv"), RAW_FIXTURE).unwrap();

    let mut catalog = DataCatalog::new();
    catalog.register("raw_source", dir.path().join("raw.csv"), DatasetFormat::Csv);
    catalog.register("staged", dir.path().join("staged.csv"), DatasetFormat::Csv);
    catalog.register("Y", dir.path().join("y.csv"), DatasetFormat::Csv);

    let nodes = vec![
        Node::table_transform("stage", "raw_source", "staged", |df| Ok(df.clone())),
        Node::new("produce_y", &["staged"], &["Y"], |_| Ok(vec![])),
    ];
    let params = Parameters::new();
    let graph = PipelineGraph::build(nodes, &catalog, &params).unwrap();

    let err = Executor::new().run(&graph, &catalog, &params).unwrap_err();

    assert!(
        matches!(err, PipelineError::OutputContract { ref node, ref detail }
            if node == "produce_y" && detail.contains("'Y'")),
        "Unexpected error: {err}"
    );
    assert!(!dir.path().join("y.csv").exists(), "'Y' must not be written");
    assert!(
        dir.path().join("staged.csv").exists(),
        "Outputs persisted before the failure are kept"
    );
}

// ----------------------------------------------------------------------------
// Full eda pipeline over a fixture project

const COUNTRY_WISE_LATEST: &str = "\
Country/Region,Confirmed,Deaths,WHO Region
Chile,10,1,Americas
Peru,20,2,Americas
Spain,30,3,Europe
";

const CLEAN_COMPLETE: &str = "\
Province/State,Country/Region,Date,Confirmed,Deaths
,Chile,2020-01-22,5,0
Hubei,China,2020-01-22,40,1
,Peru,2020-01-22,25,0
,Chile,2020-01-23,8,0
,Spain,2020-01-23,60,2
";

const DAY_WISE: &str = "\
Date,Confirmed,Deaths
2020-01-22,555,17
2020-01-23,654,18
";

const FULL_GROUPED: &str = "\
Date,Country/Region,Confirmed
2020-01-22,Chile,0
2020-01-22,Chile,0
2020-01-23,Peru,1
";

const USA_COUNTY_WISE: &str = "\
UID,FIPS,Admin2,Province_State,Confirmed
84001001,1001.0,Autauga,Alabama,3
84001003,,Baldwin,Alabama,4
84001005,1005.0,,Alabama,1
";

const WORLDOMETER_DATA: &str = "\
Country/Region,Continent,Population,TotalCases,NewCases,TotalDeaths,WHO Region
USA,North America,331000000,5032179,10,162804,Americas
Brazil,South America,212000000,2917562,,98644,Americas
India,Asia,1381000000,2025409,,41638,South-EastAsia
Nowhere,,38000,100,,,
";

fn fixture_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let raw = root.join("data/01_raw");
    fs::create_dir_all(&raw).unwrap();
    for (name, content) in [
        ("country_wise_latest.csv", COUNTRY_WISE_LATEST),
        ("covid_19_clean_complete.csv", CLEAN_COMPLETE),
        ("day_wise.csv", DAY_WISE),
        ("full_grouped.csv", FULL_GROUPED),
        ("usa_county_wise.csv", USA_COUNTY_WISE),
        ("worldometer_data.csv", WORLDOMETER_DATA),
    ] {
        fs::write(raw.join(name), content).unwrap();
    }

    let conf = root.join("conf").join(DEFAULT_ENV);
    fs::create_dir_all(&conf).unwrap();
    fs::write(
        conf.join("catalog.json"),
        include_str!("../conf/base/catalog.json"),
    )
    .unwrap();
    fs::write(
        conf.join("parameters.json"),
        include_str!("../conf/base/parameters.json"),
    )
    .unwrap();

    dir
}

fn persisted_files(session: &Session, ids: &[String]) -> Vec<(PathBuf, Vec<u8>)> {
    ids.iter()
        .map(|id| {
            let path = session.catalog.location(id).unwrap().to_path_buf();
            let bytes = fs::read(&path).unwrap();
            (path, bytes)
        })
        .collect()
}

#[test]
fn test_eda_pipeline_end_to_end() {
    let project = fixture_project();
    let session = Session::load(ProjectPaths::new(project.path(), DEFAULT_ENV))
        .expect("Fixture project should load");

    let report = session
        .run(DEFAULT_PIPELINE, &Executor::new())
        .expect("eda pipeline should run on the fixture project");

    assert_eq!(report.executed.len(), 12);
    assert_eq!(
        report.persisted,
        vec![
            "covid_19_clean_complete_final",
            "usa_county_wise_clean",
            "worldometer_data_clean",
            "covid_cases_plot",
            "cases_by_continent_plot",
        ]
    );
    assert!(report.free_outputs.is_empty());

    let cleaned = session.catalog.load("covid_19_clean_complete_final").unwrap();
    let cleaned = cleaned.as_table().unwrap();
    assert_eq!(cleaned.height(), 5);
    assert_eq!(cleaned.column("Province/State").unwrap().null_count(), 0);

    let county = session.catalog.load("usa_county_wise_clean").unwrap();
    let county = county.as_table().unwrap();
    assert_eq!(county.column("FIPS").unwrap().null_count(), 0);
    assert_eq!(county.column("Admin2").unwrap().null_count(), 0);

    let reports = project.path().join("data/02_reporting");
    for label in [
        "covid_19_clean_complete",
        "day_wise",
        "full_grouped",
        "usa_county_wise",
        "worldometer_data",
        "country_wise_latest",
    ] {
        assert!(
            reports.join(report_file_name(label)).exists(),
            "Missing report for {label}"
        );
    }
    let full_grouped = fs::read_to_string(reports.join(report_file_name("full_grouped"))).unwrap();
    assert!(
        full_grouped.lines().any(|line| line == "Date,0,1"),
        "The repeated Chile row should be counted once:\n{full_grouped}"
    );

    for plot in ["covid_cases_plot", "cases_by_continent_plot"] {
        match session.catalog.load(plot).unwrap() {
            Data::Image(bytes) => assert!(image::load_from_memory(&bytes).is_ok()),
            other => panic!("{plot} should load as an image, got {other}"),
        }
    }
    assert!(project.path().join("data/04_models/cases_by_continent.png").exists());
}

#[test]
fn test_eda_rerun_is_byte_identical() {
    let project = fixture_project();
    let session = Session::load(ProjectPaths::new(project.path(), DEFAULT_ENV)).unwrap();

    let first = session.run("eda", &Executor::new()).unwrap();
    let first_files = persisted_files(&session, &first.persisted);
    let first_report = fs::read(
        project
            .path()
            .join("data/02_reporting")
            .join(report_file_name("worldometer_data")),
    )
    .unwrap();

    let second = session.run("eda", &Executor::new()).unwrap();
    let second_files = persisted_files(&session, &second.persisted);
    let second_report = fs::read(
        project
            .path()
            .join("data/02_reporting")
            .join(report_file_name("worldometer_data")),
    )
    .unwrap();

    assert_eq!(first.persisted, second.persisted);
    assert_eq!(first_files, second_files, "Persisted outputs differ between runs");
    assert_eq!(first_report, second_report);
}

#[test]
fn test_missing_source_file_stops_run() {
    let project = fixture_project();
    fs::remove_file(project.path().join("data/01_raw/day_wise.csv")).unwrap();

    let session = Session::load(ProjectPaths::new(project.path(), DEFAULT_ENV)).unwrap();
    session
        .build(DEFAULT_PIPELINE)
        .expect("Registered sources still satisfy graph construction");

    let err = session.run(DEFAULT_PIPELINE, &Executor::new()).unwrap_err();
    assert_eq!(err.node(), Some("explore_day_wise"), "Unexpected error: {err}");
    assert!(
        matches!(err, PipelineError::DatasetFailed { ref dataset, ref source, .. }
            if dataset == "day_wise" && matches!(**source, PipelineError::NotFound { .. })),
        "Unexpected error: {err}"
    );
}

#[test]
fn test_unknown_pipeline_is_rejected() {
    let project = fixture_project();
    let session = Session::load(ProjectPaths::new(project.path(), DEFAULT_ENV)).unwrap();
    let err = session.build("training").unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}
