use crate::facts::assemble::Fact;
use crate::taxonomy::metric::MetricMatcher;
use crate::taxonomy::period::parse_known_period;
use crate::taxonomy::period::KnownPeriod;
use crate::taxonomy::scorer::Scorer;
use crate::taxonomy::sheet::SheetMatcher;
use crate::taxonomy::MatchRule;
use std::collections::HashMap;

/// Identity of a fact: its cell within a sheet of a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FactKey {
    pub(crate) file: String,
    pub(crate) sheet: String,
    pub(crate) row: usize,
    pub(crate) col: usize,
}

impl From<&Fact> for FactKey {
    fn from(fact: &Fact) -> Self {
        FactKey {
            file: fact.file.to_owned(),
            sheet: fact.sheet.to_owned(),
            row: fact.row_idx,
            col: fact.col_idx,
        }
    }
}

/// Canonical metric and period attached to a fact.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct KnownFact {
    pub(crate) known_value: String,
    pub(crate) known_period: Option<KnownPeriod>,
    pub(crate) match_score: f64,
    pub(crate) match_rule: MatchRule,
}

/// Canonical category attached to a sheet.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct KnownSheet {
    pub(crate) known_sheet: String,
    pub(crate) match_score: f64,
    pub(crate) match_rule: MatchRule,
}

/// Enrichment entries keyed by fact identity. Facts already present are
/// never matched again, and unmatched facts leave no entry.
#[derive(Clone, Debug, Default)]
pub(crate) struct KnownFacts {
    entries: HashMap<FactKey, KnownFact>,
}

impl KnownFacts {
    /// Matches every fact not yet enriched and returns the number of new entries.
    pub(crate) fn populate<'a, S, I>(&mut self, facts: I, matcher: &MetricMatcher<S>) -> usize
    where
        S: Scorer,
        I: IntoIterator<Item = &'a Fact>,
    {
        let mut inserted = 0;
        for fact in facts {
            let key = FactKey::from(fact);
            if self.entries.contains_key(&key) {
                continue;
            }
            let found = matcher.best_match(&fact.row_header, fact.unit);
            let Some(canonical) = found.canonical else {
                continue;
            };
            self.entries.insert(
                key,
                KnownFact {
                    known_value: canonical.to_owned(),
                    known_period: parse_known_period(&fact.col_header),
                    match_score: found.score,
                    match_rule: found.rule,
                },
            );
            inserted += 1;
        }
        inserted
    }

    pub(crate) fn get(&self, fact: &Fact) -> Option<&KnownFact> {
        self.entries.get(&FactKey::from(fact))
    }
}

/// Enrichment entries keyed by `(file, sheet)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct KnownSheets {
    entries: HashMap<(String, String), KnownSheet>,
}

impl KnownSheets {
    /// Matches every distinct `(file, sheet)` pair not yet enriched and returns
    /// the number of new entries.
    pub(crate) fn populate<'a, S, I>(&mut self, sheets: I, matcher: &SheetMatcher<S>) -> usize
    where
        S: Scorer,
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut inserted = 0;
        for (file, sheet) in sheets {
            let key = (file.to_owned(), sheet.to_owned());
            if self.entries.contains_key(&key) {
                continue;
            }
            let found = matcher.best_match(sheet);
            let Some(canonical) = found.canonical else {
                continue;
            };
            self.entries.insert(
                key,
                KnownSheet { known_sheet: canonical.to_owned(), match_score: found.score, match_rule: found.rule },
            );
            inserted += 1;
        }
        inserted
    }

    pub(crate) fn get(&self, file: &str, sheet: &str) -> Option<&KnownSheet> {
        self.entries.get(&(file.to_owned(), sheet.to_owned()))
    }
}
