use crate::taxonomy::scorer::Scorer;
use crate::taxonomy::scorer::TokenSetScorer;
use crate::taxonomy::MatchRule;
use crate::taxonomy::Taxonomy;
use crate::taxonomy::TaxonomyMatch;
use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-_]+").expect("Hardcode regex pattern"));
static UNKNOWN_CHARACTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ()/]").expect("Hardcode regex pattern"));

const SHEETS: &[(&str, &[&str])] = &[
    ("P&L Statement", &[
        "p&l", "profit and loss", "profit & loss", "income statement", "p and l", "p / l", "pnl",
        "p & l statement", "profit and loss statement", "statement of operations",
        "consolidated statements of operations",
    ]),
    ("Quality of Earnings", &[
        "quality of earnings", "qoe", "q o e", "q-of-e", "quality-of-earnings", "quality of earning",
        "qoe analysis", "quality of earnings analysis", "quality of earnings report", "qoe report",
        "quality of earnings schedule", "qoe schedule", "earnings quality", "earnings quality analysis",
    ]),
    ("Working Capital", &[
        "working capital", "wc", "working capital schedule", "working capital analysis", "working-capital",
        "net working capital", "nwc", "working capital bridge", "working capital rollforward",
        "working capital summary",
    ]),
    ("Balance Sheet", &[
        "balance sheet", "statement of financial position", "consolidated balance sheets", "financial position",
    ]),
    ("Cash Flow Statement", &[
        "cash flow", "statement of cash flows", "cashflows", "consolidated statements of cash flows",
    ]),
];

/// Built-in canonical sheet categories with their synonyms.
pub(crate) fn default_sheets() -> Taxonomy {
    Taxonomy::from_static(SHEETS)
}

/// Lower case, `&` spelled `and`, separators collapsed, only `a-z 0-9 ( ) /` kept.
pub(crate) fn normalize_sheet(text: &str) -> String {
    let lower = text.to_lowercase().replace('&', "and");
    let spaced = SEPARATORS.replace_all(&lower, " ");
    UNKNOWN_CHARACTERS.replace_all(&spaced, "").trim().to_owned()
}

/// Maps a raw sheet name to a canonical sheet category.
pub(crate) struct SheetMatcher<S: Scorer = TokenSetScorer> {
    /// Canonical name with its normalized synonyms, the canonical itself last
    candidates: Vec<(String, Vec<String>)>,
    scorer: S,
    threshold: f64,
}

impl SheetMatcher<TokenSetScorer> {
    pub(crate) fn new(threshold: f64) -> Self {
        Self::with_scorer(&default_sheets(), TokenSetScorer, threshold)
    }
}

impl<S: Scorer> SheetMatcher<S> {
    pub(crate) fn with_scorer(taxonomy: &Taxonomy, scorer: S, threshold: f64) -> Self {
        let candidates = taxonomy
            .entries
            .iter()
            .map(|entry| {
                let variants = entry
                    .synonyms
                    .iter()
                    .chain(std::iter::once(&entry.canonical))
                    .map(|variant| normalize_sheet(variant))
                    .collect();
                (entry.canonical.to_owned(), variants)
            })
            .collect();
        SheetMatcher { candidates, scorer, threshold }
    }

    pub(crate) fn best_match(&self, sheet_name: &str) -> TaxonomyMatch<'_> {
        let name = normalize_sheet(sheet_name);
        let mut best = None::<(&str, f64)>;
        for (canonical, variants) in &self.candidates {
            for variant in variants {
                let score = self.scorer.score(&name, variant);
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((canonical.as_str(), score));
                }
            }
        }
        match best.filter(|(_, score)| *score >= self.threshold) {
            Some((canonical, score)) => TaxonomyMatch::matched(canonical, score, MatchRule::SynonymGate),
            None => TaxonomyMatch::no_match(),
        }
    }
}
