//! Catalog search.
//!
//! Filters run in a fixed order (status, category, tags, difficulty,
//! specialties, then free text) and each one narrows the previous set.
//! An unset filter matches everything.

use calc_model::{CalculatorModule, Difficulty, Status};
use serde::{Deserialize, Serialize};

/// Status filter; published-only unless overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Is(Status),
    Any,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::Is(Status::Published)
    }
}

impl StatusFilter {
    /// `published`, `draft`, `deprecated` or `any`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("any") {
            return Some(Self::Any);
        }
        Status::parse(s).map(Self::Is)
    }

    pub fn accepts(&self, status: Status) -> bool {
        match self {
            Self::Is(wanted) => *wanted == status,
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Case-insensitive substring over name, description and tags.
    pub text: Option<String>,
    pub category: Option<String>,
    /// Matches when the module carries any of these tags.
    pub tags: Vec<String>,
    pub difficulty: Option<Difficulty>,
    /// Matches when the module lists any of these specialties.
    pub specialties: Vec<String>,
    pub status: StatusFilter,
}

impl SearchQuery {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialties.push(specialty.into());
        self
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Whether `module` passes every filter.
    pub fn matches(&self, module: &CalculatorModule) -> bool {
        let config = &module.config;

        if !self.status.accepts(config.status) {
            return false;
        }
        if let Some(category) = &self.category
            && !config.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| config.has_tag(t)) {
            return false;
        }
        if let Some(difficulty) = self.difficulty
            && config.difficulty != difficulty
        {
            return false;
        }
        if !self.specialties.is_empty()
            && !self.specialties.iter().any(|wanted| {
                config
                    .medical
                    .specialties
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(wanted))
            })
        {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                config.name.contains_ignore_case(&needle)
                    || config.description.contains_ignore_case(&needle)
                    || config.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            }
        }
    }

    /// Modules from `modules` that pass every filter, in input order.
    pub fn apply<'a>(
        &self,
        modules: impl IntoIterator<Item = &'a CalculatorModule>,
    ) -> Vec<&'a CalculatorModule> {
        modules.into_iter().filter(|m| self.matches(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use calc_modules::{amoxicillin, bmi, egfr};

    use super::*;

    fn modules() -> Vec<CalculatorModule> {
        [bmi::module, egfr::module, amoxicillin::module]
            .iter()
            .map(|f| f().expect("module"))
            .collect()
    }

    fn ids(found: &[&CalculatorModule]) -> Vec<String> {
        found.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn empty_query_returns_published() {
        let modules = modules();
        assert_eq!(SearchQuery::default().apply(&modules).len(), modules.len());
    }

    #[test]
    fn text_matches_any_locale() {
        let modules = modules();
        let found = SearchQuery::default().text("腎").apply(&modules);
        assert_eq!(ids(&found), ["egfr"]);

        let found = SearchQuery::default().text("  BODY mass ").apply(&modules);
        assert_eq!(ids(&found), ["bmi"]);
    }

    #[test]
    fn filters_narrow_each_other() {
        let modules = modules();
        let found = SearchQuery::default()
            .category("pediatrics")
            .difficulty(Difficulty::Basic)
            .apply(&modules);
        assert!(found.is_empty());

        let found = SearchQuery::default()
            .category("Pediatrics")
            .difficulty(Difficulty::Intermediate)
            .apply(&modules);
        assert_eq!(ids(&found), ["amoxicillin-clavulanate-dose"]);
    }

    #[test]
    fn status_filter_parses() {
        assert_eq!(StatusFilter::parse("any"), Some(StatusFilter::Any));
        assert_eq!(
            StatusFilter::parse("Draft"),
            Some(StatusFilter::Is(Status::Draft))
        );
        assert_eq!(StatusFilter::parse("retired"), None);
        assert!(!StatusFilter::default().accepts(Status::Draft));
    }
}
