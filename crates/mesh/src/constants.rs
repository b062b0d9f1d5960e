/// Number of fixed-format header lines preceding the grid body of a hitmap file
pub const HITMAP_HEADER_LINES: usize = 10;

/// Header labels read back from a hitmap file
pub const MAX_COVERAGE_LABEL: &str = "Max coverage";
pub const MAX_APPROVAL_LABEL: &str = "Max approval";

/// Symbol printed for a cell without any feature
pub const UNKNOWN_SYMBOL: char = 'u';

/// Progress is logged every this many examined areas
pub const PROGRESS_INTERVAL: usize = 250;

/// Expected headers in exported CSV files
pub const CSV_HEADER: [&str; 8] = [
    "CoverageIndex",
    "ApprovalIndex",
    "CoverageMin",
    "CoverageMax",
    "ApprovalMin",
    "ApprovalMax",
    "Symbol",
    "Status",
];
