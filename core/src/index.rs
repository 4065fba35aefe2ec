use crate::tokenizer::{ngrams, normalize, SynonymTable};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One question/answer record with everything derived from its question text
/// at construction time. Field order matters for the cache encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub question: String,
    /// Order-significant; the selector biases toward earlier variants.
    pub answers: Vec<String>,
    pub tokens: Vec<String>,
    pub bigrams: HashSet<String>,
    pub trigrams: HashSet<String>,
    pub term_counts: HashMap<String, u32>,
    pub tf_norm: HashMap<String, f64>,
    pub length: u32,
}

impl Document {
    pub fn new(id: DocId, question: &str, answers: Vec<String>, synonyms: Option<&SynonymTable>) -> Self {
        let tokens = normalize(question, synonyms);
        let length = tokens.len() as u32;
        let bigrams: HashSet<String> = ngrams(&tokens, 2).into_iter().collect();
        let trigrams: HashSet<String> = ngrams(&tokens, 3).into_iter().collect();
        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *term_counts.entry(token.clone()).or_insert(0) += 1;
        }
        let mut tf_norm: HashMap<String, f64> = HashMap::new();
        if length > 0 {
            for (term, count) in &term_counts {
                tf_norm.insert(term.clone(), f64::from(*count) / f64::from(length));
            }
        }
        Self {
            id,
            question: question.to_string(),
            answers,
            tokens,
            bigrams,
            trigrams,
            term_counts,
            tf_norm,
            length,
        }
    }
}

/// Training state of the index. Querying is permitted in `Dirty`, using the
/// aggregates from the last completed training pass; only an empty corpus
/// refuses to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainState {
    Empty,
    Built,
    Dirty,
}

impl TrainState {
    pub fn as_str(self) -> &'static str {
        match self {
            TrainState::Empty => "empty",
            TrainState::Built => "built",
            TrainState::Dirty => "dirty",
        }
    }
}

/// The in-memory corpus index: owned documents plus the aggregates derived
/// from them. Replaced wholesale on reload, never partially rolled back.
#[derive(Debug)]
pub struct CorpusIndex {
    pub docs: Vec<Document>,
    pub bigram_postings: HashMap<String, Vec<DocId>>,
    pub trigram_postings: HashMap<String, Vec<DocId>>,
    pub doc_freq: HashMap<String, u32>,
    pub idf: HashMap<String, f64>,
    /// Lower-cased original question text to document id; last write wins.
    pub exact: HashMap<String, DocId>,
    pub avg_doc_len: f64,
    state: TrainState,
}

impl Default for CorpusIndex {
    fn default() -> Self {
        Self {
            docs: Vec::new(),
            bigram_postings: HashMap::new(),
            trigram_postings: HashMap::new(),
            doc_freq: HashMap::new(),
            idf: HashMap::new(),
            exact: HashMap::new(),
            avg_doc_len: 0.0,
            state: TrainState::Empty,
        }
    }
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with the given records and train.
    pub fn replace(&mut self, records: Vec<(String, Vec<String>)>, synonyms: Option<&SynonymTable>) {
        self.docs.clear();
        self.exact.clear();
        for (question, answers) in records {
            let id = self.docs.len() as DocId;
            self.exact.insert(question.to_lowercase(), id);
            self.docs.push(Document::new(id, &question, answers, synonyms));
        }
        self.train();
    }

    /// Append one document without retraining. Aggregates go stale until the
    /// next [`CorpusIndex::train`] call.
    pub fn push(&mut self, question: &str, answers: Vec<String>, synonyms: Option<&SynonymTable>) -> DocId {
        let id = self.docs.len() as DocId;
        self.exact.insert(question.to_lowercase(), id);
        self.docs.push(Document::new(id, question, answers, synonyms));
        self.state = TrainState::Dirty;
        id
    }

    /// Rebuild every index-wide aggregate from the current document set:
    /// document frequencies, IDF weights, average length, and the n-gram
    /// postings. Documents themselves are not touched.
    pub fn train(&mut self) {
        self.bigram_postings.clear();
        self.trigram_postings.clear();
        self.doc_freq.clear();
        self.idf.clear();

        let n = self.docs.len();
        for doc in &self.docs {
            let distinct: HashSet<&String> = doc.tokens.iter().collect();
            for term in distinct {
                *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        self.avg_doc_len = if n == 0 {
            0.0
        } else {
            self.docs.iter().map(|d| f64::from(d.length)).sum::<f64>() / n as f64
        };
        for (term, df) in &self.doc_freq {
            let df = f64::from(*df);
            self.idf
                .insert(term.clone(), ((n as f64 - df + 0.5) / (df + 0.5) + 1.0).ln());
        }
        for doc in &self.docs {
            for bigram in &doc.bigrams {
                self.bigram_postings.entry(bigram.clone()).or_default().push(doc.id);
            }
            for trigram in &doc.trigrams {
                self.trigram_postings.entry(trigram.clone()).or_default().push(doc.id);
            }
        }
        self.state = if n == 0 { TrainState::Empty } else { TrainState::Built };
        tracing::debug!(
            docs = n,
            vocab = self.doc_freq.len(),
            bigrams = self.bigram_postings.len(),
            trigrams = self.trigram_postings.len(),
            avg_doc_len = self.avg_doc_len,
            "index trained"
        );
    }

    /// Reassemble an index from cached parts, rebuilding the n-gram postings
    /// from the per-document sets.
    pub fn from_parts(
        docs: Vec<Document>,
        avg_doc_len: f64,
        doc_freq: HashMap<String, u32>,
        idf: HashMap<String, f64>,
        exact: HashMap<String, DocId>,
    ) -> Self {
        let mut index = Self {
            docs,
            bigram_postings: HashMap::new(),
            trigram_postings: HashMap::new(),
            doc_freq,
            idf,
            exact,
            avg_doc_len,
            state: TrainState::Empty,
        };
        for doc in &index.docs {
            for bigram in &doc.bigrams {
                index.bigram_postings.entry(bigram.clone()).or_default().push(doc.id);
            }
            for trigram in &doc.trigrams {
                index.trigram_postings.entry(trigram.clone()).or_default().push(doc.id);
            }
        }
        index.state = if index.docs.is_empty() { TrainState::Empty } else { TrainState::Built };
        index
    }

    pub fn doc(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn state(&self) -> TrainState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, answer: &str) -> (String, Vec<String>) {
        (question.to_string(), vec![answer.to_string()])
    }

    #[test]
    fn document_invariants() {
        let doc = Document::new(0, "cats chase other cats quickly", vec![], None);
        let total: u32 = doc.term_counts.values().sum();
        assert_eq!(doc.length, total);
        assert_eq!(doc.length as usize, doc.tokens.len());
    }

    #[test]
    fn zero_token_document_is_retained() {
        let mut index = CorpusIndex::new();
        index.replace(vec![record("??", "nothing")], None);
        assert_eq!(index.len(), 1);
        assert!(index.docs[0].tokens.is_empty());
        assert!(index.bigram_postings.is_empty());
        // still reachable through the exact-match table
        assert_eq!(index.exact.get("??"), Some(&0));
    }

    #[test]
    fn idf_and_avg_len() {
        let mut index = CorpusIndex::new();
        index.replace(
            vec![record("cats purr", "yes"), record("dogs bark loudly", "yes")],
            None,
        );
        assert_eq!(index.state(), TrainState::Built);
        assert!((index.avg_doc_len - 2.5).abs() < 1e-9);
        // term in one of two docs: ln((2 - 1 + 0.5)/(1 + 0.5) + 1) = ln 2
        let idf = index.idf.get("purr").copied().unwrap();
        assert!((idf - 2.0f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn push_marks_dirty_and_keeps_ids_stable() {
        let mut index = CorpusIndex::new();
        index.replace(vec![record("cats purr", "yes")], None);
        let id = index.push("dogs bark", vec!["woof".to_string()], None);
        assert_eq!(id, 1);
        assert_eq!(index.state(), TrainState::Dirty);
        index.train();
        assert_eq!(index.state(), TrainState::Built);
        assert_eq!(index.doc(1).map(|d| d.question.as_str()), Some("dogs bark"));
    }

    #[test]
    fn duplicate_question_text_last_write_wins() {
        let mut index = CorpusIndex::new();
        index.replace(
            vec![record("same question", "first"), record("same question", "second")],
            None,
        );
        assert_eq!(index.exact.get("same question"), Some(&1));
    }

    #[test]
    fn postings_hold_each_doc_at_most_once() {
        let mut index = CorpusIndex::new();
        index.replace(vec![record("red fish blue fish red fish", "fish")], None);
        for ids in index.bigram_postings.values() {
            let distinct: HashSet<&DocId> = ids.iter().collect();
            assert_eq!(distinct.len(), ids.len());
        }
    }
}
