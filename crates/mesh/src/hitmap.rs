use crate::constants::{HITMAP_HEADER_LINES, MAX_APPROVAL_LABEL, MAX_COVERAGE_LABEL};
use crate::error::{MeshError, Result};
use crate::features::{Feature, FeatureSet};
use crate::grid::Grid;
use crate::search::ProbeBounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Write};

/// Election statistics computed before the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionStats {
    pub avg_approvals: f64,
    pub max_approval: u64,
    pub min_approval: u64,
    pub max_coverage: u64,
    pub min_coverage: u64,
    pub max_jr_approval: u64,
    pub min_jr_approval: u64,
    pub max_jr_coverage: u64,
    pub min_jr_coverage: u64,
    pub justified_core: u64,
}

impl ElectionStats {
    /// Rectangle of achievable values; everything outside is fixed as EMPTY
    pub fn seed_bounds(&self) -> ProbeBounds {
        ProbeBounds {
            min_coverage: self.min_coverage,
            max_coverage: self.max_coverage,
            min_approval: self.min_approval,
            max_approval: self.max_approval,
        }
    }
}

impl fmt::Display for ElectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Avg approvals by each voter: {}", self.avg_approvals)?;
        writeln!(f, "{}: {}", MAX_APPROVAL_LABEL, self.max_approval)?;
        writeln!(f, "Min approval: {}", self.min_approval)?;
        writeln!(f, "{}: {}", MAX_COVERAGE_LABEL, self.max_coverage)?;
        writeln!(f, "Min coverage: {}", self.min_coverage)?;
        writeln!(f, "Max JR approval: {}", self.max_jr_approval)?;
        writeln!(f, "Min JR approval: {}", self.min_jr_approval)?;
        writeln!(f, "Max JR coverage: {}", self.max_jr_coverage)?;
        writeln!(f, "Min JR coverage: {}", self.min_jr_coverage)?;
        writeln!(f, "Justified Core: {}", self.justified_core)
    }
}

pub fn write_hitmap<W: Write>(mut writer: W, stats: &ElectionStats, grid: &Grid) -> Result<()> {
    write!(writer, "{}", stats)?;
    writer.write_all(grid.render().as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Parsed `.outhit` file
#[derive(Debug, Clone, PartialEq)]
pub struct Hitmap {
    pub header: Vec<String>,
    pub max_coverage: u64,
    pub max_approval: u64,
    /// `rows[cov][app]`, lowest coverage first
    pub rows: Vec<Vec<FeatureSet>>,
}

impl Hitmap {
    pub fn cov_parts(&self) -> usize {
        self.rows.len()
    }

    pub fn app_parts(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Copies every cell of `other` whose symbol is one of `features` onto
    /// this map. Returns the number of cells changed.
    pub fn overlay(&mut self, other: &Hitmap, features: &[Feature]) -> Result<usize> {
        let expected = (self.cov_parts(), self.app_parts());
        let found = (other.cov_parts(), other.app_parts());
        if expected != found {
            return Err(MeshError::HitmapMismatch { expected, found });
        }
        let mut changed = 0;
        for (row, other_row) in self.rows.iter_mut().zip(&other.rows) {
            for (cell, other_cell) in row.iter_mut().zip(other_row) {
                if let Some(feature) = other_cell.dominant()
                    && features.contains(&feature)
                    && !cell.contains(feature)
                {
                    cell.insert(feature);
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Same layout as `write_hitmap`: header, then highest coverage first
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for line in &self.header {
            writeln!(writer, "{}", line)?;
        }
        for (i, row) in self.rows.iter().rev().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            let line: String = row.iter().map(FeatureSet::symbol).collect();
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn counts(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for features in self.rows.iter().flatten() {
            *counts.entry(features.symbol()).or_insert(0) += 1;
        }
        counts
    }
}

fn header_value(header: &[String], label: &str) -> Result<u64> {
    for (i, line) in header.iter().enumerate() {
        if let Some((key, value)) = line.split_once(':')
            && key.trim() == label
        {
            return value.trim().parse().map_err(|_| MeshError::HitmapFormat {
                line: i + 1,
                message: format!("invalid value for '{}': {}", label, value.trim()),
            });
        }
    }
    Err(MeshError::HitmapFormat {
        line: header.len(),
        message: format!("missing header '{}'", label),
    })
}

pub fn parse_hitmap<R: BufRead>(reader: R) -> Result<Hitmap> {
    let mut lines = reader.lines();

    let mut header = Vec::with_capacity(HITMAP_HEADER_LINES);
    for i in 0..HITMAP_HEADER_LINES {
        match lines.next() {
            Some(line) => header.push(line?.trim().to_string()),
            None => {
                return Err(MeshError::HitmapFormat {
                    line: i + 1,
                    message: "truncated header".to_string(),
                });
            }
        }
    }
    let max_coverage = header_value(&header, MAX_COVERAGE_LABEL)?;
    let max_approval = header_value(&header, MAX_APPROVAL_LABEL)?;

    let mut rows: Vec<Vec<FeatureSet>> = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = HITMAP_HEADER_LINES + i + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .chars()
            .map(|symbol| {
                FeatureSet::from_symbol(symbol).ok_or_else(|| MeshError::HitmapFormat {
                    line: line_no,
                    message: format!("unknown symbol '{}'", symbol),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(first) = rows.first()
            && first.len() != row.len()
        {
            return Err(MeshError::HitmapFormat {
                line: line_no,
                message: format!("expected {} cells, got {}", first.len(), row.len()),
            });
        }
        rows.push(row);
    }
    // body lists the highest coverage first
    rows.reverse();

    Ok(Hitmap {
        header,
        max_coverage,
        max_approval,
        rows,
    })
}
