//! Candidate model variables.

/// Variable selected when nothing else was chosen.
pub const DEFAULT_VARIABLE: &str = "Calidad_Agua";

/// Prefix of output-stage variables, listed after the others.
pub const OUTPUT_PREFIX: &str = "O_";

/// Sorted list of modelable variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelVariables {
    names: Vec<String>,
}

impl ModelVariables {
    /// Parse one name per line. Blank lines are skipped, duplicates dropped.
    pub fn parse(content: &str) -> Self {
        Self::from_names(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from),
        )
    }

    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort_by(|a, b| {
            (a.starts_with(OUTPUT_PREFIX), a).cmp(&(b.starts_with(OUTPUT_PREFIX), b))
        });
        names.dedup();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// `preferred` if listed, else the first entry.
    pub fn default_selection(&self, preferred: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|n| *n == preferred)
            .or_else(|| self.names.first())
            .map(String::as_str)
    }
}
