use crate::index::{CorpusIndex, Document};
use crate::retrieve::near_match;
use crate::DocId;
use std::collections::{HashMap, HashSet};

/// Okapi BM25 tuning constants.
pub const K1: f64 = 1.5;
pub const B: f64 = 0.75;

const EPS: f64 = 1e-9;

const W_BM25: f64 = 0.6;
const W_COSINE: f64 = 0.22;
const W_NGRAM: f64 = 0.08;
const W_JACCARD: f64 = 0.06;
const W_FUZZY: f64 = 0.04;

/// Per-candidate signal breakdown plus the fused ranking score.
#[derive(Debug, Clone)]
pub struct Scored {
    pub doc_id: DocId,
    pub combined: f64,
    pub bm25: f64,
    pub cosine: f64,
    pub ngram: f64,
    pub jaccard: f64,
    pub fuzzy: f64,
}

/// Score every candidate with the five relevance signals and fuse them with
/// fixed weights. Returns candidates sorted by descending combined score.
pub fn rank(index: &CorpusIndex, candidates: &[(DocId, i64)], query_tokens: &[String]) -> Vec<Scored> {
    let query_weights = query_tfidf(index, query_tokens);
    let mut query_counts: HashMap<&str, u32> = HashMap::new();
    for token in query_tokens {
        *query_counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let mut scored = Vec::with_capacity(candidates.len());
    for &(id, ngram_score) in candidates {
        let Some(doc) = index.doc(id) else { continue };
        let bm25 = bm25(index, doc, &query_counts);
        let cosine = cosine(index, doc, &query_weights);
        let jaccard = jaccard(doc, query_tokens);
        let fuzzy = fuzzy_coverage(doc, query_tokens);
        let ngram = ngram_score as f64;
        let combined =
            W_BM25 * bm25 + W_COSINE * cosine + W_NGRAM * ngram + W_JACCARD * jaccard + W_FUZZY * fuzzy;
        scored.push(Scored { doc_id: id, combined, bm25, cosine, ngram, jaccard, fuzzy });
    }
    scored.sort_by(|a, b| b.combined.partial_cmp(&a.combined).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Bounded confidence in (0, 1): compresses large fused scores toward 1
/// without a hard cap.
pub fn confidence(combined: f64) -> f64 {
    combined / (combined + 1.0)
}

/// TF-IDF vector of the query: term frequency over query length, weighted by
/// corpus IDF. Terms outside the vocabulary contribute nothing.
fn query_tfidf(index: &CorpusIndex, tokens: &[String]) -> HashMap<String, f64> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    let len = tokens.len() as f64;
    let mut weights = HashMap::new();
    for (term, count) in counts {
        if let Some(idf) = index.idf.get(term) {
            weights.insert(term.to_string(), (f64::from(count) / len) * idf);
        }
    }
    weights
}

fn bm25(index: &CorpusIndex, doc: &Document, query_counts: &HashMap<&str, u32>) -> f64 {
    let mut score = 0.0;
    for (term, query_freq) in query_counts {
        let Some(idf) = index.idf.get(*term) else { continue };
        let tf = doc.term_counts.get(*term).copied().unwrap_or(0);
        if tf == 0 {
            continue;
        }
        let tf = f64::from(tf);
        let denom =
            tf + K1 * (1.0 - B + B * (f64::from(doc.length) / (index.avg_doc_len + EPS)));
        score += idf * (tf * (K1 + 1.0)) / (denom + EPS) * f64::from(*query_freq);
    }
    score
}

fn cosine(index: &CorpusIndex, doc: &Document, query_weights: &HashMap<String, f64>) -> f64 {
    let mut doc_weights: HashMap<&str, f64> = HashMap::new();
    for (term, tf) in &doc.tf_norm {
        if let Some(idf) = index.idf.get(term) {
            doc_weights.insert(term.as_str(), tf * idf);
        }
    }
    let mut dot = 0.0;
    let mut query_norm = 0.0;
    let mut doc_norm = 0.0;
    for (term, weight) in query_weights {
        query_norm += weight * weight;
        if let Some(doc_weight) = doc_weights.get(term.as_str()) {
            dot += weight * doc_weight;
        }
    }
    for weight in doc_weights.values() {
        doc_norm += weight * weight;
    }
    if query_norm <= 0.0 || doc_norm <= 0.0 {
        return 0.0;
    }
    dot / (query_norm.sqrt() * doc_norm.sqrt())
}

fn jaccard(doc: &Document, query_tokens: &[String]) -> f64 {
    let query: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();
    let intersection = query.iter().filter(|t| doc.term_counts.contains_key(**t)).count();
    let union = query.len() + doc.term_counts.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Fraction of query tokens present in the document verbatim or through the
/// near-match heuristic.
fn fuzzy_coverage(doc: &Document, query_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let matched = query_tokens
        .iter()
        .filter(|token| {
            doc.term_counts.contains_key(token.as_str())
                || doc.term_counts.keys().any(|term| near_match(term, token))
        })
        .count();
    matched as f64 / query_tokens.len() as f64
}
