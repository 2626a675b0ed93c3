//! Search and suggestion filters.
//!
//! Both filters are pure functions of (query, dataset): a case-insensitive
//! substring scan that keeps the dataset order and stops at a cap. The
//! [`Catalog`](crate::catalog::Catalog) wraps them with a small query cache.

use crate::config::SearchConfig;
use crate::types::Medicine;

/// Thresholds shared by the search and suggestion filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Trimmed queries shorter than this (in characters) produce nothing.
    pub min_query_chars: usize,
    /// Cap on search results.
    pub max_results: usize,
    /// Cap on name suggestions.
    pub max_suggestions: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchLimits {
    fn from(config: &SearchConfig) -> Self {
        Self {
            min_query_chars: config.min_query_chars,
            max_results: config.max_results,
            max_suggestions: config.max_suggestions,
        }
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults<'a> {
    /// Matching records in dataset order, at most `max_results`.
    pub hits: Vec<&'a Medicine>,
    /// `false` when the query was too short to search at all.
    pub initiated: bool,
}

impl SearchResults<'_> {
    /// Result for a query below the minimum length.
    #[must_use]
    pub fn not_initiated() -> Self {
        Self {
            hits: Vec::new(),
            initiated: false,
        }
    }

    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether no record matched (or no search ran).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Trim and lowercase `query`, or `None` if it is too short to search.
#[must_use]
pub fn normalize_query(query: &str, limits: &SearchLimits) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.chars().count() < limits.min_query_chars {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Name first, then any use case. `needle` must already be lowercase.
#[must_use]
pub fn matches_name_or_use(medicine: &Medicine, needle: &str) -> bool {
    matches_name(medicine, needle)
        || medicine
            .uses
            .iter()
            .any(|use_case| use_case.to_lowercase().contains(needle))
}

/// Name only. `needle` must already be lowercase.
#[must_use]
pub fn matches_name(medicine: &Medicine, needle: &str) -> bool {
    medicine.name.to_lowercase().contains(needle)
}

/// Indices of matching records, in order, capped at `cap`.
pub(crate) fn matching_indices<F>(medicines: &[Medicine], cap: usize, test: F) -> Vec<usize>
where
    F: Fn(&Medicine) -> bool,
{
    medicines
        .iter()
        .enumerate()
        .filter(|(_, medicine)| test(medicine))
        .map(|(index, _)| index)
        .take(cap)
        .collect()
}

/// Search by name or use case.
#[must_use]
pub fn search<'a>(medicines: &'a [Medicine], query: &str, limits: &SearchLimits) -> SearchResults<'a> {
    let Some(needle) = normalize_query(query, limits) else {
        return SearchResults::not_initiated();
    };
    let hits = medicines
        .iter()
        .filter(|medicine| matches_name_or_use(medicine, &needle))
        .take(limits.max_results)
        .collect();
    SearchResults {
        hits,
        initiated: true,
    }
}

/// Name suggestions while typing a reminder's medicine.
#[must_use]
pub fn suggest<'a>(medicines: &'a [Medicine], partial: &str, limits: &SearchLimits) -> Vec<&'a Medicine> {
    let Some(needle) = normalize_query(partial, limits) else {
        return Vec::new();
    };
    medicines
        .iter()
        .filter(|medicine| matches_name(medicine, &needle))
        .take(limits.max_suggestions)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Vec<Medicine> {
        vec![
            Medicine::named(1, "Paracetamol").with_uses(["Fever", "Pain"]),
            Medicine::named(2, "Ibuprofen").with_uses(["Pain", "Inflammation"]),
            Medicine::named(3, "Cetirizine").with_uses(["Allergy"]),
            Medicine::named(4, "Feverall Junior").with_uses(["Fever in children"]),
        ]
    }

    fn names<'a>(hits: &[&'a Medicine]) -> Vec<&'a str> {
        hits.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn short_queries_do_not_search() {
        let data = dataset();
        let limits = SearchLimits::default();
        for query in ["", " ", "p", "  p  "] {
            let results = search(&data, query, &limits);
            assert!(results.is_empty());
            assert!(!results.initiated, "query {query:?} should not initiate");
        }
    }

    #[test]
    fn matches_use_case_case_insensitively() {
        let data = dataset();
        let results = search(&data, "fever", &SearchLimits::default());
        assert!(results.initiated);
        assert_eq!(names(&results.hits), vec!["Paracetamol", "Feverall Junior"]);
    }

    #[test]
    fn matches_name_and_keeps_dataset_order() {
        let data = dataset();
        let results = search(&data, "  CET ", &SearchLimits::default());
        assert_eq!(names(&results.hits), vec!["Paracetamol", "Cetirizine"]);
    }

    #[test]
    fn no_match_is_initiated_but_empty() {
        let data = dataset();
        let results = search(&data, "xyz", &SearchLimits::default());
        assert!(results.initiated);
        assert!(results.is_empty());
    }

    #[test]
    fn results_are_capped() {
        let data: Vec<Medicine> = (0..120)
            .map(|i| Medicine::named(i, format!("Painkiller {i}")))
            .collect();
        let results = search(&data, "pain", &SearchLimits::default());
        assert_eq!(results.len(), 50);
        assert_eq!(results.hits[0].id, 0);
        assert_eq!(results.hits[49].id, 49);
    }

    #[test]
    fn suggestions_match_names_only() {
        let data = dataset();
        let limits = SearchLimits::default();
        // "Pain" is a use case of two records but in no name.
        assert!(suggest(&data, "pain", &limits).is_empty());
        assert_eq!(names(&suggest(&data, "ibu", &limits)), vec!["Ibuprofen"]);
        assert!(suggest(&data, "i", &limits).is_empty());
    }

    #[test]
    fn suggestions_are_capped_at_ten() {
        let data: Vec<Medicine> = (0..25)
            .map(|i| Medicine::named(i, format!("Amoxicillin {i}")))
            .collect();
        let got = suggest(&data, "amox", &SearchLimits::default());
        assert_eq!(got.len(), 10);
        assert_eq!(got[9].id, 9);
    }

    #[test]
    fn unicode_length_counts_characters() {
        let data = vec![Medicine::named(1, "Éxample")];
        let limits = SearchLimits::default();
        // One character, two bytes: still too short.
        assert!(!search(&data, "é", &limits).initiated);
        assert_eq!(search(&data, "éx", &limits).len(), 1);
    }
}
