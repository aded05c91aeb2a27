//! Advisory vocabulary matches for a column name.
//!
//! Matching favours recall: any shared word is enough. Suggestions are only
//! ever shown to the operator, never applied on their own.

use crate::vocabulary::{VocabularyIndex, spaced_lower, spaced_title, tokenize};

/// True when `candidate` reads as a spelling of `canonical`: the same words in
/// lower or title case, or at least one whitespace-separated word of
/// `candidate` equal (ignoring case) to a sub-word of `canonical`.
pub fn is_variation(candidate: &str, canonical: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }
    if candidate.eq_ignore_ascii_case(canonical) {
        return true;
    }
    let tokens = tokenize(canonical);
    if tokens.is_empty() {
        return false;
    }
    if candidate == spaced_lower(&tokens) || candidate == spaced_title(&tokens) {
        return true;
    }
    let lowered = tokens
        .iter()
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>();
    candidate
        .split_whitespace()
        .map(str::to_lowercase)
        .any(|word| lowered.contains(&word))
}

pub struct MatchSuggester<'a> {
    index: &'a VocabularyIndex,
}

impl<'a> MatchSuggester<'a> {
    pub fn new(index: &'a VocabularyIndex) -> Self {
        Self { index }
    }

    /// Canonical terms plausibly meant by `candidate`, in discovery order: the
    /// exact spelling hit first, then canonical terms, then alias rows.
    pub fn suggest(&self, candidate: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut push = |term: &str| {
            if !found.iter().any(|existing| existing == term) {
                found.push(term.to_string());
            }
        };

        if let Some(term) = self.index.lookup(candidate) {
            push(term);
        }
        for term in self.index.terms() {
            if is_variation(candidate, term) {
                push(term);
            }
        }
        for row in self.index.alias_rows() {
            if row[1..].iter().any(|variant| is_variation(candidate, variant)) {
                push(&row[0]);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn title_and_lower_spellings_are_variations() {
        assert!(is_variation("Scientific Name", "scientificName"));
        assert!(is_variation("scientific name", "scientificName"));
        assert!(is_variation("SCIENTIFICNAME", "scientificName"));
    }

    #[test]
    fn unrelated_words_are_not_variations() {
        assert!(!is_variation("unrelatedWord", "scientificName"));
        assert!(!is_variation("", "scientificName"));
        assert!(!is_variation("   ", "scientificName"));
    }

    #[test]
    fn a_shared_word_is_enough() {
        assert!(is_variation("Catalogue number", "catalogNumber"));
        assert!(is_variation("Collection date", "eventDate"));
        assert!(!is_variation("Catalogue", "catalogNumber"));
    }

    #[test]
    fn suggestions_merge_terms_and_alias_rows() {
        let index = VocabularyIndex::build(
            strings(&["catalogNumber", "recordNumber", "locality", "order"]),
            vec![strings(&["locality", "Site", "Collection site"])],
        );
        let suggester = MatchSuggester::new(&index);

        assert_eq!(
            suggester.suggest("Catalogue number"),
            vec!["catalogNumber", "recordNumber"]
        );
        assert_eq!(suggester.suggest("site"), vec!["locality"]);
        assert_eq!(suggester.suggest("Order"), vec!["order"]);
        assert!(suggester.suggest("gnawing_damage").is_empty());
    }
}
