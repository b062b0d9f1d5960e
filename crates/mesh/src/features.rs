use crate::constants::UNKNOWN_SYMBOL;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Grid axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Axis {
    #[strum(serialize = "coverage")]
    Coverage,
    #[strum(serialize = "approval")]
    Approval,
}

/// Scan order used by extreme index lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Cell tag. Declaration order is the rendering priority (last wins).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Feature {
    Empty,
    Exists,
    Jr,
    Pjr,
    Ejr,
    Pav,
    Phr,
}

impl Feature {
    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn symbol(self) -> char {
        match self {
            Feature::Empty => '.',
            Feature::Exists => 's',
            Feature::Jr => 'x',
            Feature::Pjr => 'r',
            Feature::Ejr => 'e',
            Feature::Pav => 'v',
            Feature::Phr => 'p',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Feature::iter().find(|f| f.symbol() == symbol)
    }
}

/// Additive set of features. The empty set is UNKNOWN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet(u8);

impl FeatureSet {
    pub const UNKNOWN: FeatureSet = FeatureSet(0);

    pub fn only(feature: Feature) -> Self {
        Self(feature.bit())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    /// Union semantics (success tags)
    pub fn insert(&mut self, feature: Feature) {
        self.0 |= feature.bit();
    }

    /// Overwrite semantics (failure tags)
    pub fn replace_with(&mut self, feature: Feature) {
        self.0 = feature.bit();
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::iter().filter(|f| self.contains(*f))
    }

    /// Highest priority feature present, if any
    pub fn dominant(&self) -> Option<Feature> {
        self.iter().last()
    }

    pub fn symbol(&self) -> char {
        self.dominant().map_or(UNKNOWN_SYMBOL, Feature::symbol)
    }

    /// Inverse of `symbol`. A rendered cell only keeps its dominant feature.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        if symbol == UNKNOWN_SYMBOL {
            return Some(Self::UNKNOWN);
        }
        Feature::from_symbol(symbol).map(Self::only)
    }
}

impl From<Feature> for FeatureSet {
    fn from(feature: Feature) -> Self {
        Self::only(feature)
    }
}

/// Evaluation state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CellStatus {
    Dirty,
    Clean,
    Fixed,
}

/// Which cells delimit the search area of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Cells without any feature
    Unknown,
    Has(Feature),
}

impl Requirement {
    pub fn matches(&self, features: FeatureSet) -> bool {
        match self {
            Requirement::Unknown => features.is_unknown(),
            Requirement::Has(feature) => features.contains(*feature),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Unknown => write!(f, "UNKNOWN"),
            Requirement::Has(feature) => write!(f, "{}", feature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_unknown_symbol() {
        assert_eq!(FeatureSet::UNKNOWN.symbol(), 'u');
        assert!(FeatureSet::default().is_unknown());
    }

    #[test]
    fn test_insert_is_additive() {
        let mut set = FeatureSet::only(Feature::Exists);
        set.insert(Feature::Jr);
        set.insert(Feature::Jr);
        assert!(set.contains(Feature::Exists));
        assert!(set.contains(Feature::Jr));
        assert!(!set.contains(Feature::Pjr));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_replace_with_overwrites() {
        let mut set = FeatureSet::only(Feature::Exists);
        set.insert(Feature::Pav);
        set.replace_with(Feature::Empty);
        assert_eq!(set, FeatureSet::only(Feature::Empty));
    }

    #[test]
    fn test_symbol_priority() {
        let mut set = FeatureSet::only(Feature::Exists);
        assert_eq!(set.symbol(), 's');
        set.insert(Feature::Ejr);
        set.insert(Feature::Jr);
        assert_eq!(set.symbol(), 'e');
        set.insert(Feature::Phr);
        assert_eq!(set.symbol(), 'p');
    }

    #[test]
    fn test_symbols_are_distinct() {
        let mut symbols: Vec<char> = Feature::iter().map(Feature::symbol).collect();
        symbols.push(UNKNOWN_SYMBOL);
        let len = symbols.len();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), len);
    }

    #[test]
    fn test_from_symbol() {
        assert_eq!(FeatureSet::from_symbol('u'), Some(FeatureSet::UNKNOWN));
        assert_eq!(
            FeatureSet::from_symbol('x'),
            Some(FeatureSet::only(Feature::Jr))
        );
        assert_eq!(FeatureSet::from_symbol('?'), None);
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(Feature::Pjr.to_string(), "PJR");
        assert_eq!(Feature::from_str("EXISTS").unwrap(), Feature::Exists);
        assert!(Feature::from_str("nope").is_err());
    }

    #[test]
    fn test_requirement_matches() {
        let mut set = FeatureSet::UNKNOWN;
        assert!(Requirement::Unknown.matches(set));
        assert!(!Requirement::Has(Feature::Exists).matches(set));

        set.insert(Feature::Exists);
        assert!(!Requirement::Unknown.matches(set));
        assert!(Requirement::Has(Feature::Exists).matches(set));
        assert_eq!(Requirement::Has(Feature::Jr).to_string(), "JR");
        assert_eq!(Requirement::Unknown.to_string(), "UNKNOWN");
    }
}
