pub mod area;
pub mod constants;
pub mod error;
pub mod export;
pub mod features;
pub mod grid;
pub mod hitmap;
pub mod procedure;
pub mod search;

pub use area::{Area, AreaQueue};
pub use error::{MeshError, ProbeError, Result};
pub use export::export_cells_csv;
pub use features::{Axis, CellStatus, Direction, Feature, FeatureSet, Requirement};
pub use grid::{Bounds, Cell, ElectionShape, Grid};
pub use hitmap::{ElectionStats, Hitmap, parse_hitmap, write_hitmap};
pub use procedure::{Procedure, Rule, RuleSet, run_procedures};
pub use search::{BoundarySearch, Probe, ProbeBounds, ProbeOutcome, SearchReport, Witness, fill_with};
