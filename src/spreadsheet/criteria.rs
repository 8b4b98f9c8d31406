use glob::Pattern;

/// Selects the sheets of a workbook to extract facts from.
#[derive(Clone, Debug, Default)]
pub(crate) struct SheetCriteria {
    /// Sheet name patterns; every sheet is accepted when absent.
    pub(crate) sheet_name_patterns: Option<Vec<Pattern>>,
}

impl SheetCriteria {
    /// Criteria from a comma separated list of glob patterns.
    pub(crate) fn parse(patterns: Option<&str>) -> Result<Self, glob::PatternError> {
        let sheet_name_patterns = patterns
            .map(|patterns| {
                patterns
                    .split(',')
                    .map(str::trim)
                    .filter(|pattern| !pattern.is_empty())
                    .map(Pattern::new)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        Ok(SheetCriteria { sheet_name_patterns })
    }

    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
