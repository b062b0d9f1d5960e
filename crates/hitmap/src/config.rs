use crate::error::{HitmapError, Result};
use mesh::{ElectionShape, ElectionStats, RuleSet};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

const ENV_OUTPUT_DIR: &str = "HITMAP_OUTPUT_DIR";

/// Run configuration (TOML)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub election: ElectionShape,
    #[serde(default)]
    pub grid: GridConfig,
    pub stats: ElectionStats,
    pub oracle: OracleConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Resolution of the grid; defaults to one cell per value
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GridConfig {
    pub coverage_parts: Option<usize>,
    pub approval_parts: Option<usize>,
}

/// External solver invoked once per probe
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_rule_set")]
    pub rule_set: String, // "xJR" | "PAV" | "PHR"
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_output_name")]
    pub name: String,
    #[serde(default)]
    pub export_csv: bool,
}

fn default_rule_set() -> String {
    RuleSet::default().to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_output_name() -> String {
    "hitmap".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            rule_set: default_rule_set(),
            dir: default_output_dir(),
            name: default_output_name(),
            export_csv: false,
        }
    }
}

impl Config {
    /// Reads the file and applies the environment override. Call `validate`
    /// once command line overrides are in place.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HitmapError::ReadConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_toml(&content).map_err(|e| match e {
            HitmapError::ParseConfig { source, .. } => HitmapError::ParseConfig {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        config.apply_output_dir_override(env::var(ENV_OUTPUT_DIR).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HitmapError::ParseConfig {
            path: PathBuf::new(),
            source: e,
        })
    }

    /// Non-blank values replace `output.dir`
    pub fn apply_output_dir_override(&mut self, value: Option<String>) -> Result<()> {
        if let Some(output_dir) = value
            && !output_dir.trim().is_empty()
        {
            let path = PathBuf::from(output_dir);

            // If the path already exists but is not a directory, reject early.
            if path.exists() && !path.is_dir() {
                return Err(HitmapError::InvalidConfiguration(format!(
                    "Output path is not a directory: {}",
                    path.display()
                )));
            }
            self.output.dir = path;
        }
        Ok(())
    }

    pub fn coverage_parts(&self) -> usize {
        self.grid
            .coverage_parts
            .unwrap_or(self.election.max_coverage() as usize)
    }

    pub fn approval_parts(&self) -> usize {
        self.grid
            .approval_parts
            .unwrap_or(self.election.max_approval() as usize)
    }

    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::from_str(&self.output.rule_set).map_err(|_| {
            HitmapError::InvalidConfiguration(format!(
                "Invalid rule set: {}. Must be 'xJR', 'PAV', or 'PHR'",
                self.output.rule_set
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        let election = &self.election;
        if election.voters == 0 || election.candidates == 0 || election.committee_size == 0 {
            return Err(HitmapError::InvalidConfiguration(format!(
                "election sizes must be positive, got {:?}",
                election
            )));
        }
        if election.committee_size > election.candidates as u64 {
            return Err(HitmapError::InvalidConfiguration(format!(
                "committee_size {} exceeds candidates {}",
                election.committee_size, election.candidates
            )));
        }

        let seed = self.stats.seed_bounds();
        if seed.min_coverage > seed.max_coverage || seed.max_coverage > election.max_coverage() {
            return Err(HitmapError::InvalidConfiguration(format!(
                "coverage bounds [{}, {}] not within [0, {}]",
                seed.min_coverage,
                seed.max_coverage,
                election.max_coverage()
            )));
        }
        if seed.min_approval > seed.max_approval || seed.max_approval > election.max_approval() {
            return Err(HitmapError::InvalidConfiguration(format!(
                "approval bounds [{}, {}] not within [0, {}]",
                seed.min_approval,
                seed.max_approval,
                election.max_approval()
            )));
        }

        if self.oracle.command.trim().is_empty() {
            return Err(HitmapError::InvalidConfiguration(
                "oracle.command cannot be empty".to_string(),
            ));
        }
        if self.output.name.trim().is_empty() {
            return Err(HitmapError::InvalidConfiguration(
                "output.name cannot be empty".to_string(),
            ));
        }
        self.rule_set()?;
        Ok(())
    }
}
