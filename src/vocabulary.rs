//! Canonical term list plus a spelling-variant index.
//!
//! Every term (and every externally supplied alias) is split into camel-case
//! sub-words and registered under several spellings: joined, space-joined,
//! lower-cased, title-cased, and each sub-word on its own. A spelling keeps the
//! first term registered for it unless a more specific registration arrives
//! later, so alias rows (folded first) win ties and a canonical term always
//! owns its own exact name.

use std::collections::HashMap;

use heck::{ToTitleCase, ToUpperCamelCase};
use itertools::Itertools;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Specificity {
    SubWord,
    Spelling,
    Canonical,
}

#[derive(Debug, Clone)]
struct Variant {
    term: String,
    specificity: Specificity,
}

#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    terms: Vec<String>,
    variants: HashMap<String, Variant>,
    alias_rows: Vec<Vec<String>>,
}

/// Splits an identifier into sub-words at lower->upper and letter<->digit
/// transitions, and before the last capital of an acronym run
/// (`HTTPStatus` -> `HTTP`, `Status`). Any non-alphanumeric character is a
/// separator and is dropped. Casing is preserved.
pub fn tokenize(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (idx, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next = chars.get(idx + 1).copied();
            let boundary = (prev.is_lowercase() && ch.is_uppercase())
                || (prev.is_numeric() != ch.is_numeric())
                || (prev.is_uppercase()
                    && ch.is_uppercase()
                    && next.is_some_and(char::is_lowercase));
            if boundary {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Lower-cased, space-joined form (`scientificName` -> `scientific name`).
pub(crate) fn spaced_lower(tokens: &[String]) -> String {
    tokens.iter().map(|token| token.to_lowercase()).join(" ")
}

/// Title-cased, space-joined form (`scientificName` -> `Scientific Name`).
pub(crate) fn spaced_title(tokens: &[String]) -> String {
    spaced_lower(tokens).to_title_case()
}

impl VocabularyIndex {
    /// Builds the index from the canonical term list and alias rows of the form
    /// `[term, variant, variant, ...]`. Blank fields are ignored.
    pub fn build(terms: Vec<String>, alias_rows: Vec<Vec<String>>) -> Self {
        let terms = terms
            .into_iter()
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .unique()
            .collect::<Vec<_>>();
        let alias_rows = alias_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|field| field.trim().to_string())
                    .filter(|field| !field.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|row| row.len() >= 2)
            .collect::<Vec<_>>();

        let mut index = Self {
            terms,
            variants: HashMap::new(),
            alias_rows,
        };

        let alias_rows = std::mem::take(&mut index.alias_rows);
        for row in &alias_rows {
            let term = &row[0];
            for variant in &row[1..] {
                index.register_spellings(term, variant);
            }
        }
        index.alias_rows = alias_rows;

        let terms = std::mem::take(&mut index.terms);
        for term in &terms {
            index.register(term.clone(), term, Specificity::Canonical);
            index.register_spellings(term, term);
        }
        index.terms = terms;

        debug!(
            "Vocabulary index holds {} term(s), {} alias row(s), {} spelling(s)",
            index.terms.len(),
            index.alias_rows.len(),
            index.variants.len()
        );
        index
    }

    fn register_spellings(&mut self, term: &str, variant: &str) {
        let tokens = tokenize(variant);
        if tokens.is_empty() {
            return;
        }
        let joined = tokens.concat();
        let spaced = tokens.join(" ");
        let spellings = [
            variant.trim().to_string(),
            joined.to_lowercase(),
            spaced.to_lowercase(),
            spaced_title(&tokens),
            joined.to_upper_camel_case(),
            joined,
            spaced,
        ];
        for spelling in spellings {
            self.register(spelling, term, Specificity::Spelling);
        }
        for token in &tokens {
            self.register(token.to_lowercase(), term, Specificity::SubWord);
            self.register(token.clone(), term, Specificity::SubWord);
        }
    }

    fn register(&mut self, spelling: String, term: &str, specificity: Specificity) {
        if spelling.is_empty() {
            return;
        }
        match self.variants.get(&spelling) {
            Some(existing) if existing.specificity >= specificity => {}
            _ => {
                self.variants.insert(
                    spelling,
                    Variant {
                        term: term.to_string(),
                        specificity,
                    },
                );
            }
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn alias_rows(&self) -> &[Vec<String>] {
        &self.alias_rows
    }

    /// Canonical term registered for this exact spelling, if any.
    pub fn lookup(&self, spelling: &str) -> Option<&str> {
        self.variants
            .get(spelling.trim())
            .map(|variant| variant.term.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn tokenize_splits_camel_case() {
        assert_eq!(
            tokenize("scientificNameAuthorship"),
            vec!["scientific", "Name", "Authorship"]
        );
    }

    #[test]
    fn tokenize_handles_acronyms_digits_and_separators() {
        assert_eq!(tokenize("verbatimSRS"), vec!["verbatim", "SRS"]);
        assert_eq!(tokenize("HTTPStatus"), vec!["HTTP", "Status"]);
        assert_eq!(tokenize("field2Name"), vec!["field", "2", "Name"]);
        assert_eq!(tokenize("gnawing_damage"), vec!["gnawing", "damage"]);
        assert_eq!(tokenize("Catalogue  number"), vec!["Catalogue", "number"]);
        assert!(tokenize(" _- ").is_empty());
    }

    #[test]
    fn spelling_forms() {
        let tokens = tokenize("scientificName");
        assert_eq!(spaced_lower(&tokens), "scientific name");
        assert_eq!(spaced_title(&tokens), "Scientific Name");
    }

    #[test]
    fn canonical_terms_alias_themselves() {
        let index = VocabularyIndex::build(strings(&["scientificName", "catalogNumber"]), Vec::new());
        assert_eq!(index.lookup("scientificName"), Some("scientificName"));
        assert_eq!(index.lookup("Scientific Name"), Some("scientificName"));
        assert_eq!(index.lookup("scientific name"), Some("scientificName"));
        assert_eq!(index.lookup("catalognumber"), Some("catalogNumber"));
        assert_eq!(index.lookup("ScientificName"), Some("scientificName"));
        assert_eq!(index.lookup("catalog"), Some("catalogNumber"));
        assert_eq!(index.lookup("Number"), Some("catalogNumber"));
        assert!(index.terms().iter().any(|term| term == "catalogNumber"));
        assert_eq!(index.lookup("locality"), None);
    }

    #[test]
    fn alias_rows_win_ties_but_not_exact_terms() {
        let index = VocabularyIndex::build(
            strings(&["recordNumber", "catalogNumber"]),
            vec![strings(&["catalogNumber", "Catalogue number", "  "])],
        );
        assert_eq!(index.lookup("Catalogue number"), Some("catalogNumber"));
        assert_eq!(index.lookup("catalogue number"), Some("catalogNumber"));
        // "number" is a sub-word of both terms; the alias row was folded first.
        assert_eq!(index.lookup("number"), Some("catalogNumber"));
        assert_eq!(index.lookup("recordNumber"), Some("recordNumber"));
        assert_eq!(index.alias_rows().len(), 1);
    }

    #[test]
    fn short_alias_rows_and_blank_terms_are_dropped() {
        let index = VocabularyIndex::build(
            strings(&["locality", " ", "locality"]),
            vec![strings(&["locality"]), strings(&["locality", ""])],
        );
        assert_eq!(index.terms(), &["locality".to_string()]);
        assert!(index.alias_rows().is_empty());
    }
}
