use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mesh::{Feature, FeatureSet, parse_hitmap};
use std::{fs::File, io::BufReader, path::PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Summarize a hitmap written by `hitmap`", long_about = None)]
struct Args {
    /// Hitmap file (.outhit)
    path: PathBuf,

    /// Print the header lines as well
    #[arg(long = "header")]
    header: bool,
}

fn label(symbol: char) -> String {
    match FeatureSet::from_symbol(symbol).and_then(|set| set.dominant()) {
        Some(feature) => feature.to_string(),
        None => "UNKNOWN".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let file = File::open(&args.path)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;
    let hitmap = parse_hitmap(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", args.path.display()))?;

    if args.header {
        for line in &hitmap.header {
            info!("{}", line);
        }
    }
    info!(
        "Max coverage: {}, Max approval: {}",
        hitmap.max_coverage, hitmap.max_approval
    );
    info!(
        "Mesh resolution (coverage x approval score): ({}, {})",
        hitmap.cov_parts(),
        hitmap.app_parts()
    );

    let total = hitmap.cov_parts() * hitmap.app_parts();
    for (symbol, count) in hitmap.counts() {
        let share = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        info!("  {} {:<7} {:>8} ({:.1}%)", symbol, label(symbol), count, share);
    }

    let reached = hitmap
        .rows
        .iter()
        .flatten()
        .filter(|features| features.contains(Feature::Exists))
        .count();
    info!("Cells with an existing committee: {}", reached);

    Ok(())
}
