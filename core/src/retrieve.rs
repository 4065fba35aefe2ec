use crate::index::CorpusIndex;
use crate::DocId;
use std::collections::{HashMap, HashSet};

/// Candidates below this n-gram score are dropped, unless the filter would
/// empty the result entirely.
pub const MIN_NGRAM_MATCH: i64 = 2;
/// Hard cap on the candidate set handed to the scorer.
pub const MAX_CANDIDATES: usize = 200;

const TRIGRAM_HIT: i64 = 4;
const BIGRAM_HIT: i64 = 2;

/// Cheap difference count between two terms: mismatched characters over the
/// shared prefix plus the length delta beyond it. Not edit distance; a
/// transposition counts as two differences. Kept deliberately cheap so the
/// near-miss fallback stays a linear vocabulary scan.
pub fn difference_count(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let shared = a.len().min(b.len());
    let mismatches = a[..shared].iter().zip(&b[..shared]).filter(|(x, y)| x != y).count();
    mismatches + (a.len().max(b.len()) - shared)
}

/// Near-match test used by both candidate fallback and fuzzy coverage:
/// lengths within 2 and at most one counted difference.
pub fn near_match(a: &str, b: &str) -> bool {
    let delta = (a.len() as i64 - b.len() as i64).abs();
    delta <= 2 && difference_count(a, b) <= 1
}

/// Score documents by query n-gram overlap: each posting hit earns +4 per
/// trigram and +2 per bigram. When no document scores at all, a fallback
/// pass scans the vocabulary for near-miss terms and gives every document
/// containing one a single point. The result is filtered by
/// [`MIN_NGRAM_MATCH`] (kept unfiltered if that empties it), sorted
/// descending, and truncated to [`MAX_CANDIDATES`].
pub fn find_candidates(
    index: &CorpusIndex,
    query_bigrams: &[String],
    query_trigrams: &[String],
    query_tokens: &[String],
) -> Vec<(DocId, i64)> {
    let mut scores: HashMap<DocId, i64> = HashMap::new();
    for trigram in query_trigrams {
        if let Some(ids) = index.trigram_postings.get(trigram) {
            for &id in ids {
                *scores.entry(id).or_insert(0) += TRIGRAM_HIT;
            }
        }
    }
    for bigram in query_bigrams {
        if let Some(ids) = index.bigram_postings.get(bigram) {
            for &id in ids {
                *scores.entry(id).or_insert(0) += BIGRAM_HIT;
            }
        }
    }

    if scores.is_empty() {
        let mut near_docs: HashSet<DocId> = HashSet::new();
        for token in query_tokens {
            for term in index.doc_freq.keys() {
                if !near_match(term, token) {
                    continue;
                }
                for doc in &index.docs {
                    if doc.term_counts.contains_key(term) {
                        near_docs.insert(doc.id);
                    }
                }
            }
        }
        if !near_docs.is_empty() {
            tracing::debug!(docs = near_docs.len(), "near-miss fallback produced candidates");
        }
        for id in near_docs {
            *scores.entry(id).or_insert(0) += 1;
        }
    }

    let mut out: Vec<(DocId, i64)> = scores
        .iter()
        .filter(|(_, &score)| score >= MIN_NGRAM_MATCH)
        .map(|(&id, &score)| (id, score))
        .collect();
    if out.is_empty() {
        out = scores.into_iter().collect();
    }
    out.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    out.truncate(MAX_CANDIDATES);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{ngrams, normalize};

    fn build_index(questions: &[&str]) -> CorpusIndex {
        let mut index = CorpusIndex::new();
        let records = questions
            .iter()
            .map(|q| (q.to_string(), vec!["answer".to_string()]))
            .collect();
        index.replace(records, None);
        index
    }

    fn query_parts(text: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
        let tokens = normalize(text, None);
        let bigrams = ngrams(&tokens, 2);
        let trigrams = ngrams(&tokens, 3);
        (bigrams, trigrams, tokens)
    }

    #[test]
    fn difference_counting() {
        assert_eq!(difference_count("cat", "cat"), 0);
        assert_eq!(difference_count("cat", "car"), 1);
        assert_eq!(difference_count("cat", "cats"), 1);
        assert_eq!(difference_count("cat", "dog"), 3);
        // transpositions count per mismatched position, not as one edit
        assert_eq!(difference_count("form", "from"), 2);
    }

    #[test]
    fn trigrams_outscore_bigrams() {
        let index = build_index(&[
            "green tea brewing temperature guide",
            "green tea history",
        ]);
        let (bigrams, trigrams, tokens) = query_parts("green tea brewing temperature");
        let candidates = find_candidates(&index, &bigrams, &trigrams, &tokens);
        assert_eq!(candidates[0].0, 0);
        assert!(candidates[0].1 > candidates.get(1).map_or(0, |c| c.1));
    }

    #[test]
    fn threshold_filters_weak_matches() {
        let index = build_index(&["solar panel installation cost", "wind turbine blade design"]);
        let (bigrams, trigrams, tokens) = query_parts("solar panel installation");
        let candidates = find_candidates(&index, &bigrams, &trigrams, &tokens);
        assert!(candidates.iter().all(|&(_, score)| score >= MIN_NGRAM_MATCH));
        assert!(candidates.iter().all(|&(id, _)| id == 0));
    }

    #[test]
    fn near_miss_fallback_fires_without_ngram_overlap() {
        let index = build_index(&["quantum computing basics"]);
        // single misspelled token: no bigrams, no trigram or bigram overlap
        let tokens = vec!["quantun".to_string()];
        let candidates = find_candidates(&index, &[], &[], &tokens);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0], (0, 1));
    }

    #[test]
    fn candidate_cap_holds() {
        let questions: Vec<String> = (0..250)
            .map(|i| format!("common question number variant{i}"))
            .collect();
        let refs: Vec<&str> = questions.iter().map(String::as_str).collect();
        let index = build_index(&refs);
        let (bigrams, trigrams, tokens) = query_parts("common question number");
        let candidates = find_candidates(&index, &bigrams, &trigrams, &tokens);
        assert_eq!(candidates.len(), MAX_CANDIDATES);
    }
}
