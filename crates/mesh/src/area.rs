use crate::error::{MeshError, Result};
use itertools::Itertools;
use std::collections::VecDeque;
use std::fmt;

/// Inclusive index rectangle `(min_cov, max_cov, min_app, max_app)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Area {
    pub min_cov: usize,
    pub max_cov: usize,
    pub min_app: usize,
    pub max_app: usize,
}

impl Area {
    pub fn new(min_cov: usize, max_cov: usize, min_app: usize, max_app: usize) -> Self {
        Self {
            min_cov,
            max_cov,
            min_app,
            max_app,
        }
    }

    pub fn unit(cov: usize, app: usize) -> Self {
        Self::new(cov, cov, app, app)
    }

    /// Lower corner does not exceed the upper corner on either axis
    pub fn is_ordered(&self) -> bool {
        self.min_cov <= self.max_cov && self.min_app <= self.max_app
    }

    /// Single cell in both dimensions
    pub fn is_unit(&self) -> bool {
        self.min_cov == self.max_cov && self.min_app == self.max_app
    }

    pub fn contains(&self, cov: usize, app: usize) -> bool {
        (self.min_cov..=self.max_cov).contains(&cov) && (self.min_app..=self.max_app).contains(&app)
    }

    pub fn cell_count(&self) -> usize {
        (self.max_cov - self.min_cov + 1) * (self.max_app - self.min_app + 1)
    }

    /// All `(cov, app)` index pairs, coverage-major
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize)> {
        (self.min_cov..=self.max_cov).cartesian_product(self.min_app..=self.max_app)
    }

    /// Splits each dimension at its floor midpoint. Yields 2 or 4 areas.
    pub fn bisect(&self) -> Result<Vec<Area>> {
        if !self.is_ordered() {
            return Err(MeshError::InvalidArea(*self));
        }
        if self.is_unit() {
            return Err(MeshError::UnitAreaBisect(*self));
        }
        let cov_halves = bisect_segment(self.min_cov, self.max_cov);
        let app_halves = bisect_segment(self.min_app, self.max_app);
        Ok(cov_halves
            .into_iter()
            .cartesian_product(app_halves)
            .map(|((min_cov, max_cov), (min_app, max_app))| {
                Area::new(min_cov, max_cov, min_app, max_app)
            })
            .collect())
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..={}] x [{}..={}]",
            self.min_cov, self.max_cov, self.min_app, self.max_app
        )
    }
}

fn bisect_segment(lo: usize, hi: usize) -> Vec<(usize, usize)> {
    if lo == hi {
        return vec![(lo, hi)];
    }
    let mid = (lo + hi) / 2;
    vec![(lo, mid), (mid + 1, hi)]
}

/// FIFO of areas still to be examined. Owned by a single search pass.
#[derive(Debug, Default)]
pub struct AreaQueue {
    pending: VecDeque<Area>,
}

impl AreaQueue {
    pub fn new(initial: Area) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(initial);
        Self { pending }
    }

    pub fn push(&mut self, area: Area) {
        self.pending.push_back(area);
    }

    /// `None` once the queue is drained, which ends the search
    pub fn pop(&mut self) -> Option<Area> {
        self.pending.pop_front()
    }

    pub fn bisect_into(&mut self, area: &Area) -> Result<()> {
        self.pending.extend(area.bisect()?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn covered(areas: &[Area]) -> Vec<(usize, usize)> {
        areas.iter().flat_map(|a| a.indices()).collect()
    }

    #[test]
    fn test_bisect_two_dimensions() {
        let area = Area::new(2, 7, 10, 13);
        let parts = area.bisect().unwrap();
        assert_eq!(parts.len(), 4);

        let cells = covered(&parts);
        let unique: HashSet<_> = cells.iter().copied().collect();
        // no overlap
        assert_eq!(unique.len(), cells.len());
        // exact union
        let expected: HashSet<_> = area.indices().collect();
        assert_eq!(unique, expected);

        assert_eq!(parts[0], Area::new(2, 4, 10, 11));
        assert_eq!(parts[3], Area::new(5, 7, 12, 13));
    }

    #[test]
    fn test_bisect_degenerate_dimension() {
        let parts = Area::new(3, 3, 0, 4).bisect().unwrap();
        assert_eq!(parts, vec![Area::new(3, 3, 0, 2), Area::new(3, 3, 3, 4)]);

        let parts = Area::new(0, 1, 5, 5).bisect().unwrap();
        assert_eq!(parts, vec![Area::new(0, 0, 5, 5), Area::new(1, 1, 5, 5)]);
    }

    #[test]
    fn test_bisect_unit_fails() {
        let result = Area::unit(4, 4).bisect();
        assert!(matches!(result, Err(MeshError::UnitAreaBisect(_))));
    }

    #[test]
    fn test_bisect_shrinks() {
        let mut queue = AreaQueue::new(Area::new(0, 9, 0, 6));
        let mut seen = 0;
        while let Some(area) = queue.pop() {
            seen += 1;
            if !area.is_unit() {
                for part in area.bisect().unwrap() {
                    assert!(part.cell_count() < area.cell_count());
                }
                queue.bisect_into(&area).unwrap();
            }
        }
        // every internal node plus every leaf of the bisection tree
        assert!(seen >= 70);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = AreaQueue::new(Area::unit(0, 0));
        queue.push(Area::unit(1, 1));
        queue.push(Area::unit(2, 2));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(Area::unit(0, 0)));
        assert_eq!(queue.pop(), Some(Area::unit(1, 1)));
        assert_eq!(queue.pop(), Some(Area::unit(2, 2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_bisect_inverted_fails() {
        let inverted = Area {
            min_cov: 5,
            max_cov: 3,
            min_app: 0,
            max_app: 0,
        };
        assert!(!inverted.is_ordered());
        assert!(matches!(
            inverted.bisect(),
            Err(MeshError::InvalidArea(_))
        ));
        assert!(Area::new(0, 1, 2, 2).is_ordered());
    }

    #[test]
    fn test_contains_and_count() {
        let area = Area::new(1, 3, 4, 5);
        assert_eq!(area.cell_count(), 6);
        assert!(area.contains(1, 4));
        assert!(area.contains(3, 5));
        assert!(!area.contains(0, 4));
        assert!(!area.contains(2, 6));
        assert!(!area.is_unit());
        assert!(Area::unit(2, 2).is_unit());
    }
}
