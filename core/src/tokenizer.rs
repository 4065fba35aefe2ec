use crate::stem::stem;
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "the", "is", "a", "an", "and", "or", "in", "on", "at", "to", "of", "for", "with",
            "by", "from", "that", "this", "it", "as", "are", "be", "was", "were", "which",
            "but", "not", "have", "has", "had", "i", "you", "he", "she", "they", "we", "me",
            "him", "her", "them", "my", "your", "our", "their",
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Maps a stemmed synonym to its stemmed canonical term. The canonical term
/// maps to itself, so chained lookups are stable. Both sides of a lookup live
/// in stem space: entries are stemmed when the table is built, and the
/// normalizer consults the table with already-stemmed tokens.
#[derive(Debug, Default, Clone)]
pub struct SynonymTable {
    map: HashMap<String, String>,
}

impl SynonymTable {
    /// Build from `(canonical, synonyms)` records, lowercasing and stemming
    /// every entry.
    pub fn build(records: &[(String, Vec<String>)]) -> Self {
        let mut map = HashMap::new();
        for (canonical, synonyms) in records {
            let canon = stem(&canonical.to_lowercase());
            for synonym in synonyms {
                map.insert(stem(&synonym.to_lowercase()), canon.clone());
            }
            map.insert(canon.clone(), canon);
        }
        Self { map }
    }

    pub fn canonical(&self, term: &str) -> Option<&str> {
        self.map.get(term).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Normalize text into an ordered sequence of canonical term stems:
/// lowercase, strip ASCII punctuation, drop one-character tokens and
/// stopwords, stem, then substitute through the synonym table. Duplicates
/// are kept; term frequency is counted downstream.
pub fn normalize(text: &str, synonyms: Option<&SynonymTable>) -> Vec<String> {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        let cleaned: String = word.chars().filter(|c| !c.is_ascii_punctuation()).collect();
        let token = cleaned.to_lowercase();
        if token.chars().count() <= 1 {
            continue;
        }
        if is_stopword(&token) {
            continue;
        }
        let mut term = stem(&token);
        if let Some(table) = synonyms {
            if let Some(canon) = table.canonical(&term) {
                term = canon.to_string();
            }
        }
        if term.chars().count() <= 1 {
            continue;
        }
        out.push(term);
    }
    out
}

/// Contiguous space-joined n-grams over a token sequence. Empty when the
/// sequence is shorter than `n`.
pub fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|window| window.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let terms = normalize("Running, runner's run!", None);
        assert!(terms.iter().any(|t| t == "run"));
    }

    #[test]
    fn filters_stopwords_and_short_tokens() {
        let terms = normalize("the cat is on a mat", None);
        assert_eq!(terms, vec!["cat".to_string(), "mat".to_string()]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let terms = normalize("cats cats dogs cats", None);
        assert_eq!(terms, vec!["cat", "cat", "dog", "cat"]);
    }

    #[test]
    fn synonym_substitution_on_stems() {
        let table = SynonymTable::build(&[("automobile".to_string(), vec!["car".to_string()])]);
        let terms = normalize("my car broke", Some(&table));
        assert_eq!(terms[0], stem("automobile"));
    }

    #[test]
    fn canonical_maps_to_itself() {
        let table = SynonymTable::build(&[("automobile".to_string(), vec!["car".to_string()])]);
        let canon = stem("automobile");
        assert_eq!(table.canonical(&canon), Some(canon.as_str()));
    }

    #[test]
    fn ngram_windows() {
        let tokens: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ngrams(&tokens, 2), vec!["a b", "b c"]);
        assert_eq!(ngrams(&tokens, 3), vec!["a b c"]);
        assert!(ngrams(&tokens, 4).is_empty());
    }
}
