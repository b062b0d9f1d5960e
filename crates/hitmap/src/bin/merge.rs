use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use mesh::{Feature, Hitmap, parse_hitmap};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(author, version, about = "Copy single-rule committees (PAV, PHR) onto an xJR hitmap", long_about = None)]
struct Args {
    /// Hitmap the cells are copied onto (usually the xJR run)
    base: PathBuf,

    /// Hitmaps of single-rule runs (PAV or PHR)
    #[arg(short = 'm', long = "overlay", required = true)]
    overlays: Vec<PathBuf>,

    /// Merged hitmap path
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

fn read(path: &Path) -> Result<Hitmap> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_hitmap(BufReader::new(file)).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.overlays.contains(&args.output) || args.base == args.output {
        bail!("Output {} would overwrite an input", args.output.display());
    }

    let mut merged = read(&args.base)?;
    for path in &args.overlays {
        let overlay = read(path)?;
        let changed = merged
            .overlay(&overlay, &[Feature::Pav, Feature::Phr])
            .with_context(|| format!("Cannot merge {}", path.display()))?;
        if changed == 0 {
            warn!("{}: no PAV or PHR cell to copy", path.display());
        } else {
            info!("{}: copied {} cells", path.display(), changed);
        }
    }

    if let Some(dir) = args.output.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create file {}", args.output.display()))?;
    merged.write_to(BufWriter::new(file))?;
    info!("Merged hitmap saved to: {}", args.output.display());

    Ok(())
}
