use crate::area::Area;
use crate::features::{Axis, Requirement};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeshError>;

/// Error reported by an oracle implementation.
pub type ProbeError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("An equal partition of {axis} in a mesh impossible: {max} / {parts}")]
    UnevenPartition { axis: Axis, max: u64, parts: usize },

    #[error("Invalid {axis} resolution: {parts}")]
    InvalidResolution { axis: Axis, parts: usize },

    #[error("Invalid election shape: {0}")]
    InvalidShape(String),

    #[error("{axis} index {index} out of range [0, {parts})")]
    IndexOutOfRange {
        axis: Axis,
        index: usize,
        parts: usize,
    },

    #[error("{axis} value {value} out of range [0, {max}]")]
    ValueOutOfRange { axis: Axis, value: u64, max: u64 },

    #[error("Inverted area: {0}")]
    InvalidArea(Area),

    #[error("Inverted {axis} bounds: {lo} > {hi}")]
    InvertedBounds { axis: Axis, lo: u64, hi: u64 },

    #[error("Area cannot be bisected: {0}")]
    UnitAreaBisect(Area),

    #[error("No cell with requested feature: {0}")]
    NoCellWithRequirement(Requirement),

    #[error("Oracle failure")]
    Oracle {
        #[source]
        source: ProbeError,
    },

    #[error("Hitmap sizes differ: {expected:?} vs {found:?}")]
    HitmapMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid hitmap at line {line}: {message}")]
    HitmapFormat { line: usize, message: String },

    #[error("Failed to create directory {path}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
