//! # Taxonomy Matching Module
//!
//! Post-hoc enrichment of extracted facts: row headers map to canonical metric
//! names, column headers to reporting periods, and sheet names to canonical
//! sheet categories. Matching is threshold gated and pluggable through the
//! [`scorer::Scorer`] trait.

pub(crate) mod enrich;
pub(crate) mod metric;
pub(crate) mod period;
pub(crate) mod scorer;
pub(crate) mod sheet;

use std::fmt::Display;
use std::fmt::Formatter;

/// Which gate accepted a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MatchRule {
    /// Percent metric chosen for a percent row
    PercentGate,
    /// Non-percent metric chosen for a row without percent unit
    Unitless,
    /// Matched in the bucket opposite to the unit
    FallbackOtherBucket,
    /// Sheet name close to a known synonym
    SynonymGate,
    NoMatch,
}

impl MatchRule {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            Self::PercentGate => "percent_gate",
            Self::Unitless => "unitless",
            Self::FallbackOtherBucket => "fallback_other_bucket",
            Self::SynonymGate => "synonym_gate",
            Self::NoMatch => "no_match",
        }
    }
}

impl Display for MatchRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a taxonomy lookup. `canonical` is `None` for [`MatchRule::NoMatch`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct TaxonomyMatch<'a> {
    pub(crate) canonical: Option<&'a str>,
    pub(crate) score: f64,
    pub(crate) rule: MatchRule,
}

impl<'a> TaxonomyMatch<'a> {
    pub(crate) const fn matched(canonical: &'a str, score: f64, rule: MatchRule) -> Self {
        TaxonomyMatch { canonical: Some(canonical), score, rule }
    }

    pub(crate) const fn no_match() -> Self {
        TaxonomyMatch { canonical: None, score: 0.0, rule: MatchRule::NoMatch }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TaxonomyEntry {
    pub(crate) canonical: String,
    pub(crate) synonyms: Vec<String>,
}

/// Canonical names with their synonym lists, in lookup order.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Taxonomy {
    pub(crate) entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    pub(crate) fn from_static(table: &[(&str, &[&str])]) -> Self {
        let entries = table
            .iter()
            .map(|(canonical, synonyms)| TaxonomyEntry {
                canonical: (*canonical).to_owned(),
                synonyms: synonyms.iter().map(|synonym| (*synonym).to_owned()).collect(),
            })
            .collect();
        Taxonomy { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_from_table() {
        let taxonomy = Taxonomy::from_static(&[("Net Sales", &["sales", "revenue"][..])]);
        assert_eq!(taxonomy.entries.len(), 1);
        assert_eq!(taxonomy.entries[0].canonical, "Net Sales");
        assert_eq!(taxonomy.entries[0].synonyms, vec!["sales", "revenue"]);
        assert_eq!(MatchRule::FallbackOtherBucket.to_string(), "fallback_other_bucket");
    }
}
