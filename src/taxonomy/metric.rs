use crate::facts::unit::Unit;
use crate::taxonomy::scorer::Scorer;
use crate::taxonomy::scorer::TokenSetScorer;
use crate::taxonomy::MatchRule;
use crate::taxonomy::Taxonomy;
use crate::taxonomy::TaxonomyMatch;
use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-_]+").expect("Hardcode regex pattern"));
static UNKNOWN_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9 %/().,&]").expect("Hardcode regex pattern"));

const METRICS: &[(&str, &[&str])] = &[
    ("Reported EBITDA", &["reported ebitda", "ebitda (reported)", "ebitda - reported", "ebitda reported", "ebitda"]),
    ("Reported EBITDA %", &["reported ebitda %", "ebitda margin", "ebitda %", "ebitda % of sales", "ebitda percentage"]),
    ("Net Sales", &["net sales", "sales", "revenue", "net revenues", "total revenue", "net turnover"]),
    ("Gross Profit", &["gross profit", "gross income", "gross earnings", "profit (gross)", "gross result"]),
    ("Net Profit", &["net profit", "net income", "net earnings", "earnings", "profit after tax", "pat", "profit (net)"]),
    ("Gross Margin", &["gross margin", "gross margin %", "gross profit %", "gm%", "gross margin percent", "gross profit margin"]),
    ("Operating Expense %", &["operating expense %", "opex %", "operating expenses as % of sales", "opex ratio", "operating expense percentage"]),
    ("Adjusted EBITDA", &["adjusted ebitda", "ebitda (adj.)", "ebitda adjusted", "normalized ebitda", "adj. ebitda"]),
    ("Adjusted EBITDA %", &["adjusted ebitda %", "adj. ebitda %", "adjusted ebitda margin", "adj. ebitda margin", "adjusted ebitda percentage"]),
    ("Total Adjustments", &["total adjustments", "adjustments", "ebitda adjustments", "total adj.", "sum of adjustments"]),
    ("Adjusted Working Capital", &["adjusted working capital", "adj. working capital", "working capital (adj.)", "working capital adjusted"]),
    ("Reported Working Capital", &["reported working capital", "working capital", "reported wc", "wc reported"]),
];

/// Built-in canonical metric names with their synonyms.
pub(crate) fn default_metrics() -> Taxonomy {
    Taxonomy::from_static(METRICS)
}

/// Lower case, separators collapsed to one space, only `a-z 0-9 % / ( ) . , &` kept.
pub(crate) fn normalize_metric(text: &str) -> String {
    let lower = text.to_lowercase();
    let spaced = SEPARATORS.replace_all(&lower, " ");
    UNKNOWN_CHARACTERS.replace_all(&spaced, "").trim().to_owned()
}

/// Percent metrics end with `%` or mention a percentage or margin.
fn is_percent_metric(canonical: &str) -> bool {
    let lower = canonical.to_lowercase();
    canonical.ends_with('%') || lower.contains("percent") || lower.contains("margin")
}

struct Candidate {
    canonical: String,
    is_percent: bool,
    variants: Vec<String>,
}

/// Maps a fact's row header and unit to a canonical metric.
///
/// The unit picks the percent or non-percent bucket first; when nothing there
/// reaches the threshold the other bucket is tried.
pub(crate) struct MetricMatcher<S: Scorer = TokenSetScorer> {
    candidates: Vec<Candidate>,
    scorer: S,
    threshold: f64,
}

impl MetricMatcher<TokenSetScorer> {
    pub(crate) fn new(threshold: f64) -> Self {
        Self::with_scorer(&default_metrics(), TokenSetScorer, threshold)
    }
}

impl<S: Scorer> MetricMatcher<S> {
    pub(crate) fn with_scorer(taxonomy: &Taxonomy, scorer: S, threshold: f64) -> Self {
        let candidates = taxonomy
            .entries
            .iter()
            .map(|entry| Candidate {
                canonical: entry.canonical.to_owned(),
                is_percent: is_percent_metric(&entry.canonical),
                variants: entry.synonyms.iter().map(|synonym| normalize_metric(synonym)).collect(),
            })
            .collect();
        MetricMatcher { candidates, scorer, threshold }
    }

    pub(crate) fn best_match(&self, row_header: &str, unit: Unit) -> TaxonomyMatch<'_> {
        let header = normalize_metric(row_header);
        let is_percent = unit == Unit::Percent || header.contains('%') || header.contains("percent");

        let mut best = None::<(&str, f64)>;
        self.scan(&header, is_percent, &mut best);
        if let Some((canonical, score)) = best.filter(|(_, score)| *score >= self.threshold) {
            let rule = if is_percent { MatchRule::PercentGate } else { MatchRule::Unitless };
            return TaxonomyMatch::matched(canonical, score, rule);
        }

        // the unit may be mis-tagged
        self.scan(&header, !is_percent, &mut best);
        match best.filter(|(_, score)| *score >= self.threshold) {
            Some((canonical, score)) => TaxonomyMatch::matched(canonical, score, MatchRule::FallbackOtherBucket),
            None => TaxonomyMatch::no_match(),
        }
    }

    /// Raises `best` with any variant of the bucket scoring strictly higher.
    fn scan<'a>(&'a self, header: &str, is_percent: bool, best: &mut Option<(&'a str, f64)>) {
        for candidate in self.candidates.iter().filter(|candidate| candidate.is_percent == is_percent) {
            for variant in &candidate.variants {
                let score = self.scorer.score(header, variant);
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    *best = Some((candidate.canonical.as_str(), score));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(normalize_metric("  EBITDA - Reported "), "ebitda reported");
        assert_eq!(normalize_metric("Adj._EBITDA  %"), "adj. ebitda %");
        assert_eq!(normalize_metric("Net sales | FY21*"), "net sales  fy21");
    }

    #[test]
    fn percent_buckets() {
        assert!(is_percent_metric("Reported EBITDA %"));
        assert!(is_percent_metric("Gross Margin"));
        assert!(!is_percent_metric("Net Sales"));
    }

    #[test]
    fn unitless_match() {
        let matcher = MetricMatcher::new(83.0);
        let found = matcher.best_match("Net sales", Unit::Usd);
        assert_eq!(found.canonical, Some("Net Sales"));
        assert_eq!(found.score, 100.0);
        assert_eq!(found.rule, MatchRule::Unitless);
    }

    #[test]
    fn percent_gate() {
        let matcher = MetricMatcher::new(83.0);
        let found = matcher.best_match("EBITDA margin", Unit::Percent);
        assert_eq!(found.canonical, Some("Reported EBITDA %"));
        assert_eq!(found.rule, MatchRule::PercentGate);
    }

    #[test]
    fn fallback_to_other_bucket() {
        let matcher = MetricMatcher::new(83.0);
        let found = matcher.best_match("Gross margin", Unit::None);
        assert_eq!(found.canonical, Some("Gross Margin"));
        assert_eq!(found.rule, MatchRule::FallbackOtherBucket);
    }

    #[test]
    fn below_threshold() {
        let matcher = MetricMatcher::new(83.0);
        let found = matcher.best_match("Headcount", Unit::None);
        assert_eq!(found, TaxonomyMatch::no_match());
        assert_eq!(found.rule.as_str(), "no_match");
    }

    struct ExactScorer;

    impl Scorer for ExactScorer {
        fn score(&self, query: &str, candidate: &str) -> f64 {
            if query == candidate { 100.0 } else { 0.0 }
        }
    }

    #[test]
    fn pluggable_scorer_and_taxonomy() {
        const TABLE: &[(&str, &[&str])] = &[("Revenue", &["turnover"]), ("Margin", &["gm", "gross margin"])];
        let taxonomy = Taxonomy::from_static(TABLE);
        let matcher = MetricMatcher::with_scorer(&taxonomy, ExactScorer, 50.0);
        assert_eq!(matcher.best_match("Turnover", Unit::None).canonical, Some("Revenue"));
        assert_eq!(matcher.best_match("GM", Unit::Percent).rule, MatchRule::PercentGate);
        assert_eq!(matcher.best_match("turn over", Unit::None).canonical, None);
    }
}
