use crate::area::{Area, AreaQueue};
use crate::constants::PROGRESS_INTERVAL;
use crate::error::{MeshError, ProbeError, Result};
use crate::features::{CellStatus, Feature};
use crate::grid::Grid;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Inclusive coverage and approval value ranges sent to the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeBounds {
    pub min_coverage: u64,
    pub max_coverage: u64,
    pub min_approval: u64,
    pub max_approval: u64,
}

impl fmt::Display for ProbeBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.min_coverage, self.max_coverage, self.min_approval, self.max_approval
        )
    }
}

/// Achievable (coverage, approval) pair found by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Witness {
    pub coverage: u64,
    pub approval: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub satisfied: bool,
    pub witness: Option<Witness>,
    pub objective: Option<i64>,
}

impl ProbeOutcome {
    pub fn infeasible() -> Self {
        Self {
            satisfied: false,
            witness: None,
            objective: None,
        }
    }

    pub fn feasible(coverage: u64, approval: u64) -> Self {
        Self {
            satisfied: true,
            witness: Some(Witness { coverage, approval }),
            objective: None,
        }
    }
}

/// Feasibility oracle. Must be monotone: failure on some bounds implies
/// failure on every sub-range of them.
pub trait Probe {
    fn probe(&mut self, bounds: &ProbeBounds) -> std::result::Result<ProbeOutcome, ProbeError>;
}

impl<F> Probe for F
where
    F: FnMut(&ProbeBounds) -> std::result::Result<ProbeOutcome, ProbeError>,
{
    fn probe(&mut self, bounds: &ProbeBounds) -> std::result::Result<ProbeOutcome, ProbeError> {
        self(bounds)
    }
}

/// Counters of one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchReport {
    pub areas_examined: usize,
    pub oracle_calls: usize,
    pub short_circuits: usize,
    pub failed_areas: usize,
    pub cells_settled_by_failure: usize,
    pub elapsed: Duration,
}

/// One `fill_with` pass over a grid.
///
/// The pass drains an [`AreaQueue`] seeded with one area. Each area is either
/// settled by an existing tag, or sent to the oracle. A failing area settles
/// every cell it contains with one call; a succeeding area is bisected until
/// unit cells are reached.
pub struct BoundarySearch<'g> {
    grid: &'g mut Grid,
    queue: AreaQueue,
    success: Feature,
    failure: Option<Feature>,
    report: SearchReport,
}

impl<'g> BoundarySearch<'g> {
    pub fn new(
        grid: &'g mut Grid,
        area: Area,
        success: Feature,
        failure: Option<Feature>,
    ) -> Result<Self> {
        if !area.is_ordered() {
            return Err(MeshError::InvalidArea(area));
        }
        // corners in range imply every contained index is
        grid.cell_at(area.min_cov, area.min_app)?;
        grid.cell_at(area.max_cov, area.max_app)?;
        Ok(Self {
            grid,
            queue: AreaQueue::new(area),
            success,
            failure,
            report: SearchReport::default(),
        })
    }

    pub fn run<P: Probe + ?Sized>(mut self, probe: &mut P) -> Result<SearchReport> {
        let start = Instant::now();
        while let Some(area) = self.queue.pop() {
            self.report.areas_examined += 1;
            let examined = self.report.areas_examined;
            if examined % PROGRESS_INTERVAL == 0 {
                let total = start.elapsed().as_secs_f64();
                info!(
                    "Areas:{} Tot time: {:.2}s Avg time:{:.2}",
                    examined,
                    total,
                    total / examined as f64
                );
            }
            self.step(area, probe)?;
        }
        self.report.elapsed = start.elapsed();
        Ok(self.report)
    }

    fn step<P: Probe + ?Sized>(&mut self, area: Area, probe: &mut P) -> Result<()> {
        if area.is_unit()
            && self
                .grid
                .cell_at(area.min_cov, area.min_app)?
                .features
                .contains(self.success)
        {
            return Ok(());
        }

        let bounds = self.grid.area_bounds(&area)?;
        let outcome = if self.grid.any_in_area(&area, self.success) {
            self.report.short_circuits += 1;
            None
        } else {
            self.report.oracle_calls += 1;
            let outcome = probe
                .probe(&bounds)
                .map_err(|source| MeshError::Oracle { source })?;
            Some(outcome)
        };
        let satisfied = outcome.is_none_or(|o| o.satisfied);
        debug!("{}: {}", bounds, satisfied);

        if !satisfied {
            self.settle_failed(&area)?;
            return Ok(());
        }

        if area.is_unit() {
            self.mark_success(area.min_cov, area.min_app)?;
            return Ok(());
        }

        if let Some(witness) = outcome.and_then(|o| o.witness) {
            let (cov, app) = self.grid.index_of(witness.coverage, witness.approval)?;
            if !area.contains(cov, app) {
                warn!(
                    "Witness ({}, {}) lies outside probed bounds {}",
                    witness.coverage, witness.approval, bounds
                );
            }
            self.mark_success(cov, app)?;
        }
        self.queue.bisect_into(&area)
    }

    fn mark_success(&mut self, cov: usize, app: usize) -> Result<()> {
        let success = self.success;
        let cell = self.grid.cell_at_mut(cov, app)?;
        cell.features.insert(success);
        if cell.status != CellStatus::Fixed {
            cell.status = CellStatus::Clean;
        }
        Ok(())
    }

    fn settle_failed(&mut self, area: &Area) -> Result<()> {
        self.report.failed_areas += 1;
        for (cov, app) in area.indices() {
            let cell = self.grid.cell_at_mut(cov, app)?;
            if cell.status == CellStatus::Fixed {
                continue;
            }
            cell.status = CellStatus::Clean;
            if let Some(failure) = self.failure {
                cell.features.replace_with(failure);
            }
            self.report.cells_settled_by_failure += 1;
        }
        Ok(())
    }
}

/// Decides `success` for every cell of `area`. Cells proven infeasible get
/// `failure` (overwriting their features) when one is given.
pub fn fill_with<P: Probe + ?Sized>(
    grid: &mut Grid,
    area: Area,
    success: Feature,
    failure: Option<Feature>,
    probe: &mut P,
) -> Result<SearchReport> {
    BoundarySearch::new(grid, area, success, failure)?.run(probe)
}
