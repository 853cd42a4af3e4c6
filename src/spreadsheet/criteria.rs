use glob::Pattern;

/// Criteria for selecting which sheets of a workbook are read.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Sheet name patterns; a sheet is read when it matches any of them.
    pub sheet_name_patterns: Option<Vec<Pattern>>,
}

impl Criteria {
    /// Builds criteria from glob strings such as `公司*` or `Sheet?`; no globs selects every sheet.
    pub fn from_globs(globs: &[String]) -> Result<Self, glob::PatternError> {
        let sheet_name_patterns = if globs.is_empty() {
            None
        } else {
            Some(globs.iter().map(|glob| Pattern::new(glob)).collect::<Result<Vec<_>, _>>()?)
        };
        Ok(Criteria { sheet_name_patterns })
    }

    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
