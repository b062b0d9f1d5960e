mod config;
mod error;
mod oracle;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use error::HitmapError;
use log::{debug, error, info};
use mesh::{Grid, MeshError, export_cells_csv, run_procedures, write_hitmap};
use oracle::CommandOracle;
use std::{fs::File, io::BufWriter, path::PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Map achievable coverage x approval pairs of axiom-satisfying committees", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", default_value = "config/hitmap.toml")]
    config: PathBuf,

    /// Set of rules to apply (xJR, PAV, PHR)
    #[arg(short = 'r', long = "rule-set")]
    rule_set: Option<String>,

    /// Directory to write the hitmap to
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Output file name, without extension
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Also dump every cell to a CSV file
    #[arg(long = "export-csv")]
    export_csv: bool,

    /// Log level filter (overrides RUST_LOG)
    #[arg(short = 'l', long = "log-level")]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = &args.log_level {
        builder.parse_filters(level);
    }
    let _ = builder.try_init();

    if let Err(e) = run(args) {
        error!("Error: {e:#}");

        // Provide helpful hints for common errors
        for cause in e.chain() {
            if let Some(HitmapError::OracleSpawn { program, .. }) =
                cause.downcast_ref::<HitmapError>()
            {
                error!("Hint: check that oracle.command '{program}' is installed and on PATH.");
                break;
            }
            if let Some(MeshError::UnevenPartition { axis, max, .. }) = cause.downcast_ref::<MeshError>()
            {
                error!("Hint: the {axis} resolution must divide {max}.");
                break;
            }
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load_from_file(&args.config)?;
    if let Some(rule_set) = args.rule_set {
        config.output.rule_set = rule_set;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    if let Some(name) = args.name {
        config.output.name = name;
    }
    config.output.export_csv |= args.export_csv;
    config.validate()?;

    let election = config.election;
    let rule_set = config.rule_set()?;
    info!(
        "Candidates: {}, Voters: {}, Committee: {}",
        election.candidates, election.voters, election.committee_size
    );
    info!(
        "Mesh resolution (coverage x approval score): ({}, {})",
        config.coverage_parts(),
        config.approval_parts()
    );
    debug!("{}", config.stats);

    let mut grid = Grid::with_fixed_exterior(
        election,
        config.coverage_parts(),
        config.approval_parts(),
        &config.stats.seed_bounds(),
    )
    .context("Failed to build the mesh")?;

    let reports = run_procedures(&mut grid, rule_set.procedures(), |rule| {
        CommandOracle::new(&config.oracle, rule)
    })
    .with_context(|| format!("Rule set {} failed", rule_set))?;

    let total_calls: usize = reports.iter().map(|(_, r)| r.oracle_calls).sum();
    info!("Oracle calls: {}", total_calls);

    let out_dir = &config.output.dir;
    std::fs::create_dir_all(out_dir).map_err(|e| HitmapError::CreateDir {
        path: out_dir.clone(),
        source: e,
    })?;
    let path = out_dir.join(format!("{}.outhit", config.output.name));
    let file = File::create(&path).map_err(|e| HitmapError::CreateFile {
        path: path.clone(),
        source: e,
    })?;
    write_hitmap(BufWriter::new(file), &config.stats, &grid)?;
    info!("Hitmap saved to: {}", path.display());

    if config.output.export_csv {
        let csv_path = export_cells_csv(&grid, Some(out_dir), &config.output.name)?;
        info!("Cells exported to: {}", csv_path.display());
    }

    info!("Cells per symbol:");
    for (symbol, count) in grid.feature_counts() {
        info!("  {}: {}", symbol, count);
    }

    Ok(())
}
