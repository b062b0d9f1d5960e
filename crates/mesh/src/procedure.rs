use crate::error::Result;
use crate::features::{Feature, Requirement};
use crate::grid::Grid;
use crate::search::{Probe, SearchReport, fill_with};
use log::info;
use strum_macros::{Display, EnumString};

/// Committee property computed by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Rule {
    #[strum(serialize = "any")]
    AnyCommittee,
    #[strum(serialize = "jr")]
    Jr,
    #[strum(serialize = "pjr")]
    Pjr,
    #[strum(serialize = "ejr")]
    Ejr,
    #[strum(serialize = "pav")]
    SinglePav,
    #[strum(serialize = "phragmen")]
    SinglePhragmen,
}

impl Rule {
    pub fn description(&self) -> &'static str {
        match self {
            Rule::AnyCommittee => "Any committee",
            Rule::Jr => "Justified representation",
            Rule::Pjr => "Proportional justified representation",
            Rule::Ejr => "Extended justified representation",
            Rule::SinglePav => "Single PAV committee",
            Rule::SinglePhragmen => "Single sequential Phragmen committee",
        }
    }
}

/// One search pass: which rule to probe, what to tag, and where to look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Procedure {
    pub rule: Rule,
    pub feature: Feature,
    pub failure: Option<Feature>,
    pub necessary: Requirement,
}

impl Procedure {
    const fn new(
        rule: Rule,
        feature: Feature,
        failure: Option<Feature>,
        necessary: Requirement,
    ) -> Self {
        Self {
            rule,
            feature,
            failure,
            necessary,
        }
    }
}

const XJR_PROCEDURES: [Procedure; 4] = [
    Procedure::new(
        Rule::AnyCommittee,
        Feature::Exists,
        Some(Feature::Empty),
        Requirement::Unknown,
    ),
    Procedure::new(Rule::Jr, Feature::Jr, None, Requirement::Has(Feature::Exists)),
    Procedure::new(Rule::Pjr, Feature::Pjr, None, Requirement::Has(Feature::Jr)),
    Procedure::new(Rule::Ejr, Feature::Ejr, None, Requirement::Has(Feature::Pjr)),
];

const PAV_PROCEDURES: [Procedure; 1] = [Procedure::new(
    Rule::SinglePav,
    Feature::Pav,
    Some(Feature::Empty),
    Requirement::Unknown,
)];

const PHR_PROCEDURES: [Procedure; 1] = [Procedure::new(
    Rule::SinglePhragmen,
    Feature::Phr,
    Some(Feature::Empty),
    Requirement::Unknown,
)];

/// Predefined pass sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum RuleSet {
    #[strum(serialize = "xJR")]
    Xjr,
    #[strum(serialize = "PAV")]
    Pav,
    #[default]
    #[strum(serialize = "PHR")]
    Phr,
}

impl RuleSet {
    /// Passes in dependency order (existence, JR, PJR, EJR for `xJR`)
    pub fn procedures(&self) -> &'static [Procedure] {
        match self {
            RuleSet::Xjr => &XJR_PROCEDURES,
            RuleSet::Pav => &PAV_PROCEDURES,
            RuleSet::Phr => &PHR_PROCEDURES,
        }
    }
}

/// Runs `procedures` in order on `grid`. Each pass searches the bounding
/// area of the cells carrying its necessary feature, so later passes only
/// look where earlier ones succeeded.
pub fn run_procedures<F, P>(
    grid: &mut Grid,
    procedures: &[Procedure],
    mut oracle_for: F,
) -> Result<Vec<(Rule, SearchReport)>>
where
    F: FnMut(Rule) -> P,
    P: Probe,
{
    let mut reports = Vec::with_capacity(procedures.len());
    for procedure in procedures {
        info!("Started computing: {}", procedure.rule.description());
        let area = grid.search_area(procedure.necessary)?;
        let mut oracle = oracle_for(procedure.rule);
        let report = fill_with(
            grid,
            area,
            procedure.feature,
            procedure.failure,
            &mut oracle,
        )?;
        info!(
            "Finished {}: {} areas, {} oracle calls in {:.2}s",
            procedure.rule,
            report.areas_examined,
            report.oracle_calls,
            report.elapsed.as_secs_f64()
        );
        reports.push((procedure.rule, report));
    }
    Ok(reports)
}
