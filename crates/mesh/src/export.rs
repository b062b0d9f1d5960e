use crate::constants::CSV_HEADER;
use crate::error::{MeshError, Result};
use crate::grid::Grid;
use chrono::Local;
use csv::WriterBuilder;
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

/// Dumps every cell (indices, value bounds, symbol, status) to a timestamped CSV
pub fn export_cells_csv(grid: &Grid, output_dir: Option<&Path>, prefix: &str) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let filename = format!("{prefix}_{timestamp}.csv");

    let file_path = if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir).map_err(|e| MeshError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        dir.join(&filename)
    } else {
        filename.into()
    };

    let file = File::create(&file_path).map_err(|e| MeshError::CreateFile {
        path: file_path.clone(),
        source: e,
    })?;

    let writer = BufWriter::new(file);
    #[allow(unused_mut)]
    let mut builder = WriterBuilder::new();
    #[cfg(windows)]
    {
        use csv::Terminator;
        builder = builder.terminator(Terminator::CRLF);
    }

    let mut wtr = builder.from_writer(writer);

    wtr.write_record(CSV_HEADER)?;
    for ((cov, app), cell) in grid.cells() {
        wtr.write_record([
            cov.to_string(),
            app.to_string(),
            cell.cov_bounds.lo.to_string(),
            cell.cov_bounds.hi.to_string(),
            cell.app_bounds.lo.to_string(),
            cell.app_bounds.hi.to_string(),
            cell.features.symbol().to_string(),
            cell.status.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(file_path)
}
