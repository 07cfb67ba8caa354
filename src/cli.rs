use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use covid_pipeline::config::{DEFAULT_ENV, ProjectPaths};
use covid_pipeline::pipeline::Executor;
use covid_pipeline::registry::DEFAULT_PIPELINE;
use covid_pipeline::session::Session;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "covid-pipeline",
    about = "Build and run the COVID-19 dataset pipelines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the pipeline graph and execute every node
    Run(ProjectArgs),
    /// Print the resolved execution order without running anything
    List(ProjectArgs),
    /// Build the pipeline graph and report configuration problems
    Validate(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Registered pipeline to use
    #[arg(short, long, default_value = DEFAULT_PIPELINE)]
    pub pipeline: String,

    /// Project root containing `conf/` and `data/`
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Configuration environment under `conf/`
    #[arg(short, long, default_value = DEFAULT_ENV)]
    pub env: String,
}

impl ProjectArgs {
    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::new(&self.project_dir, &self.env)
    }
}

impl Commands {
    pub fn project(&self) -> &ProjectArgs {
        match self {
            Self::Run(args) | Self::List(args) | Self::Validate(args) => args,
        }
    }
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => handle_run(&args),
        Commands::List(args) => handle_list(&args),
        Commands::Validate(args) => handle_validate(&args),
    }
}

fn handle_run(args: &ProjectArgs) -> Result<()> {
    let session = Session::load(args.paths())?;
    let report = session.run(&args.pipeline, &Executor::new())?;

    println!("{}", report.summary());
    for name in &report.persisted {
        if let Some(location) = session.catalog.location(name) {
            println!("  saved {name} -> {}", location.display());
        }
    }
    for (name, data) in &report.free_outputs {
        println!("  free output {name}: {data}");
    }
    Ok(())
}

fn handle_list(args: &ProjectArgs) -> Result<()> {
    let session = Session::load(args.paths())?;
    let graph = session.build(&args.pipeline)?;

    println!("Pipeline '{}' ({} nodes):", args.pipeline, graph.len());
    print!("{}", graph.describe());
    Ok(())
}

fn handle_validate(args: &ProjectArgs) -> Result<()> {
    let session = Session::load(args.paths())?;
    let graph = session.build(&args.pipeline)?;

    let missing: Vec<&str> = graph
        .nodes()
        .iter()
        .flat_map(|node| node.dataset_inputs())
        .filter(|input| graph.producer(input).is_none() && !session.catalog.exists(input))
        .collect();

    if missing.is_empty() {
        println!(
            "Pipeline '{}' is valid: {} nodes, {} edges",
            args.pipeline,
            graph.len(),
            graph.edges().len()
        );
    } else {
        tracing::warn!(
            "Pipeline '{}' builds, but these source files are absent: {}",
            args.pipeline,
            missing.join(", ")
        );
        println!("Missing source data: {}", missing.join(", "));
    }
    Ok(())
}
