use crate::area::Area;
use crate::error::{MeshError, Result};
use crate::features::{Axis, CellStatus, Direction, Feature, FeatureSet, Requirement};
use crate::search::ProbeBounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sizes of one election
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionShape {
    pub candidates: usize,
    pub voters: u64,
    pub committee_size: u64,
}

impl ElectionShape {
    pub fn max_coverage(&self) -> u64 {
        self.voters
    }

    pub fn max_approval(&self) -> u64 {
        self.voters * self.committee_size
    }
}

/// Inclusive value range represented by a cell along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lo: u64,
    pub hi: u64,
}

impl Bounds {
    pub fn contains(&self, value: u64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Information for a single cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub cov_bounds: Bounds,
    pub app_bounds: Bounds,
    pub features: FeatureSet,
    pub status: CellStatus,
}

/// Discretisation of one axis into `parts` equal steps
#[derive(Debug, Clone)]
struct AxisPartition {
    axis: Axis,
    max: u64,
    step: u64,
    ranges: Vec<Bounds>,
}

impl AxisPartition {
    fn new(axis: Axis, max: u64, parts: usize) -> Result<Self> {
        if parts == 0 {
            return Err(MeshError::InvalidResolution { axis, parts });
        }
        if max % parts as u64 != 0 {
            return Err(MeshError::UnevenPartition { axis, max, parts });
        }
        let step = max / parts as u64;
        // zero is folded into the first range; later ranges start past the previous upper bound
        let ranges = (0..parts as u64)
            .map(|i| {
                let lower = i * step;
                Bounds {
                    lo: if lower == 0 { 0 } else { lower + 1 },
                    hi: lower + step,
                }
            })
            .collect();
        Ok(Self {
            axis,
            max,
            step,
            ranges,
        })
    }

    fn parts(&self) -> usize {
        self.ranges.len()
    }

    fn index_of(&self, value: u64) -> Result<usize> {
        if value > self.max {
            return Err(MeshError::ValueOutOfRange {
                axis: self.axis,
                value,
                max: self.max,
            });
        }
        if value <= self.step {
            Ok(0)
        } else {
            Ok(((value - 1) / self.step) as usize)
        }
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.parts() {
            return Err(MeshError::IndexOutOfRange {
                axis: self.axis,
                index,
                parts: self.parts(),
            });
        }
        Ok(())
    }
}

/// Coverage x approval grid. `cells[cov * app_parts + app]`.
#[derive(Debug, Clone)]
pub struct Grid {
    shape: ElectionShape,
    coverage: AxisPartition,
    approval: AxisPartition,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(shape: ElectionShape, coverage_parts: usize, approval_parts: usize) -> Result<Self> {
        if shape.voters == 0 {
            return Err(MeshError::InvalidShape("no voters".to_string()));
        }
        if shape.committee_size == 0 {
            return Err(MeshError::InvalidShape("empty committee".to_string()));
        }
        let coverage = AxisPartition::new(Axis::Coverage, shape.max_coverage(), coverage_parts)?;
        let approval = AxisPartition::new(Axis::Approval, shape.max_approval(), approval_parts)?;

        let mut cells = Vec::with_capacity(coverage.parts() * approval.parts());
        for cov_bounds in &coverage.ranges {
            for app_bounds in &approval.ranges {
                cells.push(Cell {
                    cov_bounds: *cov_bounds,
                    app_bounds: *app_bounds,
                    features: FeatureSet::UNKNOWN,
                    status: CellStatus::Dirty,
                });
            }
        }

        Ok(Self {
            shape,
            coverage,
            approval,
            cells,
        })
    }

    /// Builds the grid and fixes everything outside the known achievable rectangle
    pub fn with_fixed_exterior(
        shape: ElectionShape,
        coverage_parts: usize,
        approval_parts: usize,
        seed: &ProbeBounds,
    ) -> Result<Self> {
        let mut grid = Self::new(shape, coverage_parts, approval_parts)?;
        grid.seed_fixed(
            seed.min_coverage,
            seed.max_coverage,
            seed.min_approval,
            seed.max_approval,
        )?;
        Ok(grid)
    }

    pub fn shape(&self) -> &ElectionShape {
        &self.shape
    }

    pub fn cov_parts(&self) -> usize {
        self.coverage.parts()
    }

    pub fn app_parts(&self) -> usize {
        self.approval.parts()
    }

    pub fn max_coverage(&self) -> u64 {
        self.coverage.max
    }

    pub fn max_approval(&self) -> u64 {
        self.approval.max
    }

    pub fn coverage_step(&self) -> u64 {
        self.coverage.step
    }

    pub fn approval_step(&self) -> u64 {
        self.approval.step
    }

    /// Whole grid as an area
    pub fn full_area(&self) -> Area {
        Area::new(0, self.cov_parts() - 1, 0, self.app_parts() - 1)
    }

    /// Cell whose bounds contain both values
    pub fn index_of(&self, coverage: u64, approval: u64) -> Result<(usize, usize)> {
        Ok((
            self.coverage.index_of(coverage)?,
            self.approval.index_of(approval)?,
        ))
    }

    pub fn cell_at(&self, cov: usize, app: usize) -> Result<&Cell> {
        let offset = self.offset(cov, app)?;
        Ok(&self.cells[offset])
    }

    pub(crate) fn cell_at_mut(&mut self, cov: usize, app: usize) -> Result<&mut Cell> {
        let offset = self.offset(cov, app)?;
        Ok(&mut self.cells[offset])
    }

    fn offset(&self, cov: usize, app: usize) -> Result<usize> {
        self.coverage.check(cov)?;
        self.approval.check(app)?;
        Ok(cov * self.app_parts() + app)
    }

    /// Marks every cell outside the rectangle spanned by the cells containing
    /// `(min_cov, min_app)` and `(max_cov, max_app)` as EMPTY/FIXED.
    pub fn seed_fixed(
        &mut self,
        min_cov: u64,
        max_cov: u64,
        min_app: u64,
        max_app: u64,
    ) -> Result<Area> {
        if min_cov > max_cov {
            return Err(MeshError::InvertedBounds {
                axis: Axis::Coverage,
                lo: min_cov,
                hi: max_cov,
            });
        }
        if min_app > max_app {
            return Err(MeshError::InvertedBounds {
                axis: Axis::Approval,
                lo: min_app,
                hi: max_app,
            });
        }
        let (lo_cov, lo_app) = self.index_of(min_cov, min_app)?;
        let (hi_cov, hi_app) = self.index_of(max_cov, max_app)?;
        let inside = Area::new(lo_cov, hi_cov, lo_app, hi_app);
        let app_parts = self.app_parts();
        for (offset, cell) in self.cells.iter_mut().enumerate() {
            if !inside.contains(offset / app_parts, offset % app_parts) {
                cell.features = FeatureSet::only(Feature::Empty);
                cell.status = CellStatus::Fixed;
            }
        }
        log::debug!("Seeded fixed exterior around {}", inside);
        Ok(inside)
    }

    pub fn any_in_area(&self, area: &Area, feature: Feature) -> bool {
        area.indices()
            .any(|(cov, app)| self.cells[cov * self.app_parts() + app].features.contains(feature))
    }

    /// First index along `axis`, scanned in `direction`, at which some cell
    /// along the orthogonal axis satisfies `requirement`.
    pub fn extreme_index_with_feature(
        &self,
        requirement: Requirement,
        axis: Axis,
        direction: Direction,
    ) -> Result<usize> {
        let (outer, inner) = match axis {
            Axis::Coverage => (self.cov_parts(), self.app_parts()),
            Axis::Approval => (self.app_parts(), self.cov_parts()),
        };
        let matches_line = |line: usize| {
            (0..inner).any(|other| {
                let (cov, app) = match axis {
                    Axis::Coverage => (line, other),
                    Axis::Approval => (other, line),
                };
                requirement.matches(self.cells[cov * self.app_parts() + app].features)
            })
        };
        let found = match direction {
            Direction::Ascending => (0..outer).find(|&line| matches_line(line)),
            Direction::Descending => (0..outer).rev().find(|&line| matches_line(line)),
        };
        found.ok_or(MeshError::NoCellWithRequirement(requirement))
    }

    /// Minimal bounding area of the cells satisfying `requirement`
    pub fn search_area(&self, requirement: Requirement) -> Result<Area> {
        use Direction::*;
        Ok(Area::new(
            self.extreme_index_with_feature(requirement, Axis::Coverage, Ascending)?,
            self.extreme_index_with_feature(requirement, Axis::Coverage, Descending)?,
            self.extreme_index_with_feature(requirement, Axis::Approval, Ascending)?,
            self.extreme_index_with_feature(requirement, Axis::Approval, Descending)?,
        ))
    }

    /// Value bounds covered by an area, taken from its corner cells
    pub fn area_bounds(&self, area: &Area) -> Result<ProbeBounds> {
        let low = self.cell_at(area.min_cov, area.min_app)?;
        let high = self.cell_at(area.max_cov, area.max_app)?;
        Ok(ProbeBounds {
            min_coverage: low.cov_bounds.lo,
            max_coverage: high.cov_bounds.hi,
            min_approval: low.app_bounds.lo,
            max_approval: high.app_bounds.hi,
        })
    }

    /// Cells with their indices, coverage-major
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        let app_parts = self.app_parts();
        self.cells
            .iter()
            .enumerate()
            .map(move |(offset, cell)| ((offset / app_parts, offset % app_parts), cell))
    }

    /// Number of cells per rendered symbol
    pub fn feature_counts(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for cell in &self.cells {
            *counts.entry(cell.features.symbol()).or_insert(0) += 1;
        }
        counts
    }

    /// One line per coverage index (highest first), one symbol per approval
    /// index. No trailing newline.
    pub fn render(&self) -> String {
        let app_parts = self.app_parts();
        let mut out = String::with_capacity(self.cells.len() + self.cov_parts());
        for cov in (0..self.cov_parts()).rev() {
            if cov + 1 != self.cov_parts() {
                out.push('\n');
            }
            let row = &self.cells[cov * app_parts..(cov + 1) * app_parts];
            out.extend(row.iter().map(|cell| cell.features.symbol()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(voters: u64, committee_size: u64) -> ElectionShape {
        ElectionShape {
            candidates: 20,
            voters,
            committee_size,
        }
    }

    #[test]
    fn test_ranges_tile_axis() {
        let grid = Grid::new(shape(100, 10), 100, 100).unwrap();
        assert_eq!(grid.coverage_step(), 1);
        assert_eq!(grid.approval_step(), 10);

        let first = grid.cell_at(0, 0).unwrap();
        assert_eq!(first.cov_bounds, Bounds { lo: 0, hi: 1 });
        assert_eq!(first.app_bounds, Bounds { lo: 0, hi: 10 });

        let second = grid.cell_at(1, 1).unwrap();
        assert_eq!(second.cov_bounds, Bounds { lo: 2, hi: 2 });
        assert_eq!(second.app_bounds, Bounds { lo: 11, hi: 20 });

        let last = grid.cell_at(99, 99).unwrap();
        assert_eq!(last.cov_bounds, Bounds { lo: 100, hi: 100 });
        assert_eq!(last.app_bounds, Bounds { lo: 991, hi: 1000 });

        // contiguous, non-overlapping
        for app in 1..grid.app_parts() {
            let prev = grid.cell_at(0, app - 1).unwrap().app_bounds;
            let curr = grid.cell_at(0, app).unwrap().app_bounds;
            assert_eq!(curr.lo, prev.hi + 1);
        }
    }

    #[test]
    fn test_index_of_is_exact() {
        for (voters, committee, cov_parts, app_parts) in
            [(100, 10, 100, 100), (12, 3, 4, 6), (30, 2, 5, 60), (7, 1, 7, 1)]
        {
            let grid = Grid::new(shape(voters, committee), cov_parts, app_parts).unwrap();
            for value in 0..=grid.max_coverage() {
                let (cov, _) = grid.index_of(value, 0).unwrap();
                let hits = (0..cov_parts)
                    .filter(|&i| grid.cell_at(i, 0).unwrap().cov_bounds.contains(value))
                    .count();
                assert_eq!(hits, 1, "coverage {value} must map to one cell");
                assert!(grid.cell_at(cov, 0).unwrap().cov_bounds.contains(value));
            }
            for value in 0..=grid.max_approval() {
                let (_, app) = grid.index_of(0, value).unwrap();
                let hits = (0..app_parts)
                    .filter(|&i| grid.cell_at(0, i).unwrap().app_bounds.contains(value))
                    .count();
                assert_eq!(hits, 1, "approval {value} must map to one cell");
                assert!(grid.cell_at(0, app).unwrap().app_bounds.contains(value));
            }
        }
    }

    #[test]
    fn test_index_of_boundaries() {
        let grid = Grid::new(shape(100, 10), 100, 100).unwrap();
        assert_eq!(grid.index_of(26, 258).unwrap(), (25, 25));
        assert_eq!(grid.index_of(0, 0).unwrap(), (0, 0));
        assert_eq!(grid.index_of(1, 10).unwrap(), (0, 0));
        assert_eq!(grid.index_of(2, 11).unwrap(), (1, 1));
        assert_eq!(grid.index_of(100, 1000).unwrap(), (99, 99));
        assert!(matches!(
            grid.index_of(101, 0),
            Err(MeshError::ValueOutOfRange {
                axis: Axis::Coverage,
                ..
            })
        ));
        assert!(matches!(
            grid.index_of(0, 1001),
            Err(MeshError::ValueOutOfRange {
                axis: Axis::Approval,
                ..
            })
        ));
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            Grid::new(shape(100, 10), 3, 100),
            Err(MeshError::UnevenPartition {
                axis: Axis::Coverage,
                ..
            })
        ));
        assert!(matches!(
            Grid::new(shape(100, 10), 100, 7),
            Err(MeshError::UnevenPartition {
                axis: Axis::Approval,
                ..
            })
        ));
        assert!(matches!(
            Grid::new(shape(100, 10), 0, 100),
            Err(MeshError::InvalidResolution { .. })
        ));
        assert!(matches!(
            Grid::new(shape(0, 10), 1, 1),
            Err(MeshError::InvalidShape(_))
        ));
        assert!(matches!(
            Grid::new(shape(10, 0), 1, 1),
            Err(MeshError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_cell_at_out_of_range() {
        let grid = Grid::new(shape(10, 2), 10, 4).unwrap();
        assert!(grid.cell_at(9, 3).is_ok());
        assert!(matches!(
            grid.cell_at(10, 0),
            Err(MeshError::IndexOutOfRange {
                axis: Axis::Coverage,
                index: 10,
                parts: 10
            })
        ));
        assert!(matches!(
            grid.cell_at(0, 4),
            Err(MeshError::IndexOutOfRange {
                axis: Axis::Approval,
                ..
            })
        ));
    }

    #[test]
    fn test_seed_fixed() {
        let mut grid = Grid::new(shape(100, 10), 100, 100).unwrap();
        let inside = grid.seed_fixed(3, 95, 11, 950).unwrap();
        assert_eq!(inside, Area::new(2, 94, 1, 94));

        for ((cov, app), cell) in grid.cells() {
            if inside.contains(cov, app) {
                assert_eq!(cell.status, CellStatus::Dirty);
                assert!(cell.features.is_unknown());
            } else {
                assert_eq!(cell.status, CellStatus::Fixed);
                assert_eq!(cell.features, FeatureSet::only(Feature::Empty));
            }
        }
    }

    #[test]
    fn test_seed_fixed_rejects_inverted_bounds() {
        let mut grid = Grid::new(shape(8, 2), 8, 8).unwrap();
        assert!(matches!(
            grid.seed_fixed(6, 2, 3, 12),
            Err(MeshError::InvertedBounds {
                axis: Axis::Coverage,
                lo: 6,
                hi: 2
            })
        ));
        assert!(matches!(
            grid.seed_fixed(2, 6, 12, 3),
            Err(MeshError::InvertedBounds {
                axis: Axis::Approval,
                ..
            })
        ));
        // nothing was fixed
        assert!(grid.cells().all(|(_, c)| c.status == CellStatus::Dirty));

        // equal bounds are a single row
        let inside = grid.seed_fixed(4, 4, 3, 12).unwrap();
        assert_eq!(inside, Area::new(3, 3, 1, 5));
    }

    #[test]
    fn test_search_area_by_requirement() {
        let mut grid = Grid::new(shape(100, 10), 100, 100).unwrap();
        grid.seed_fixed(3, 95, 11, 950).unwrap();
        assert_eq!(
            grid.search_area(Requirement::Unknown).unwrap(),
            Area::new(2, 94, 1, 94)
        );

        assert!(matches!(
            grid.search_area(Requirement::Has(Feature::Jr)),
            Err(MeshError::NoCellWithRequirement(_))
        ));

        grid.cell_at_mut(10, 40).unwrap().features.insert(Feature::Jr);
        grid.cell_at_mut(30, 20).unwrap().features.insert(Feature::Jr);
        assert_eq!(
            grid.search_area(Requirement::Has(Feature::Jr)).unwrap(),
            Area::new(10, 30, 20, 40)
        );
        assert_eq!(
            grid.extreme_index_with_feature(
                Requirement::Has(Feature::Jr),
                Axis::Approval,
                Direction::Descending
            )
            .unwrap(),
            40
        );
    }

    #[test]
    fn test_area_bounds() {
        let grid = Grid::new(shape(100, 10), 100, 100).unwrap();
        let bounds = grid.area_bounds(&Area::new(0, 2, 1, 3)).unwrap();
        assert_eq!(
            bounds,
            ProbeBounds {
                min_coverage: 0,
                max_coverage: 3,
                min_approval: 11,
                max_approval: 40,
            }
        );
    }

    #[test]
    fn test_render_layout() {
        let mut grid = Grid::new(shape(3, 1), 3, 3).unwrap();
        grid.cell_at_mut(0, 0).unwrap().features.insert(Feature::Empty);
        grid.cell_at_mut(2, 1).unwrap().features.insert(Feature::Exists);
        grid.cell_at_mut(2, 2).unwrap().features.insert(Feature::Exists);
        grid.cell_at_mut(2, 2).unwrap().features.insert(Feature::Jr);

        assert_eq!(grid.render(), "usx\nuuu\n.uu");

        let counts = grid.feature_counts();
        assert_eq!(counts.get(&'u'), Some(&6));
        assert_eq!(counts.get(&'x'), Some(&1));
        assert_eq!(counts.get(&'.'), Some(&1));
    }
}
