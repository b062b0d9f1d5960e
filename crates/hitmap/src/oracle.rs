use crate::config::OracleConfig;
use crate::error::{HitmapError, Result};
use log::trace;
use mesh::{Probe, ProbeBounds, ProbeError, ProbeOutcome, Rule, Witness};
use serde::Deserialize;
use std::process::Command;

/// One line of JSON printed by the solver
#[derive(Debug, Deserialize)]
struct OracleReply {
    satisfied: bool,
    #[serde(default)]
    coverage: Option<u64>,
    #[serde(default)]
    approval: Option<u64>,
    #[serde(default)]
    objective: Option<i64>,
}

impl From<OracleReply> for ProbeOutcome {
    fn from(reply: OracleReply) -> Self {
        let witness = reply
            .coverage
            .zip(reply.approval)
            .map(|(coverage, approval)| Witness { coverage, approval });
        ProbeOutcome {
            satisfied: reply.satisfied,
            witness,
            objective: reply.objective,
        }
    }
}

/// Parses the last non-empty line of the solver output
pub fn parse_reply(stdout: &str) -> Result<ProbeOutcome> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim();
    let reply: OracleReply =
        serde_json::from_str(line).map_err(|e| HitmapError::OracleReply {
            reply: line.to_string(),
            source: e,
        })?;
    Ok(reply.into())
}

/// Runs `command args... <rule> <min_cov> <max_cov> <min_app> <max_app>` per probe
#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    rule: Rule,
}

impl CommandOracle {
    pub fn new(config: &OracleConfig, rule: Rule) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            rule,
        }
    }

    fn run(&mut self, bounds: &ProbeBounds) -> Result<ProbeOutcome> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(self.rule.to_string())
            .arg(bounds.min_coverage.to_string())
            .arg(bounds.max_coverage.to_string())
            .arg(bounds.min_approval.to_string())
            .arg(bounds.max_approval.to_string())
            .output()
            .map_err(|e| HitmapError::OracleSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(HitmapError::OracleExit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!("{} {} -> {}", self.rule, bounds, stdout.trim());
        parse_reply(&stdout)
    }
}

impl Probe for CommandOracle {
    fn probe(&mut self, bounds: &ProbeBounds) -> std::result::Result<ProbeOutcome, ProbeError> {
        self.run(bounds).map_err(Into::into)
    }
}
