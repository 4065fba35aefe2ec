use crate::index::{CorpusIndex, TrainState};
use crate::persist::{self, CacheSnapshot};
use crate::retrieve::find_candidates;
use crate::score::{self, confidence};
use crate::select::AnswerPicker;
use crate::tokenizer::{ngrams, normalize, SynonymTable};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

/// Fallback replies for the degraded query paths. None of these conditions
/// is an error; the engine always produces a reply.
pub const REPLY_EMPTY_CORPUS: &str = "No questions loaded, the system cannot answer yet.";
pub const REPLY_UNPARSEABLE: &str = "Could not parse the question, please rephrase.";
pub const REPLY_NO_CANDIDATES: &str = "No similar questions found, please be more specific.";
pub const REPLY_NO_ANSWER: &str = "No answer available.";

/// The outcome of a query: the answer text and a confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub confidence: f64,
}

impl Reply {
    fn fallback(text: &str) -> Self {
        Self { text: text.to_string(), confidence: 0.0 }
    }
}

/// Snapshot of engine counters for status output.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub documents: usize,
    pub vocabulary: usize,
    pub bigram_entries: usize,
    pub trigram_entries: usize,
    pub avg_doc_len: f64,
    pub synonyms: usize,
    pub state: &'static str,
}

/// Retrieval engine facade: owns the corpus index, the synonym table, and
/// the answer picker. Single-threaded by design; all mutation happens
/// between queries, never during one.
pub struct QaEngine {
    index: CorpusIndex,
    synonyms: SynonymTable,
    picker: AnswerPicker,
    token_cache: HashMap<String, Vec<String>>,
}

impl QaEngine {
    /// `seed` drives answer selection only; retrieval and ranking are fully
    /// deterministic.
    pub fn new(seed: u64) -> Self {
        Self {
            index: CorpusIndex::new(),
            synonyms: SynonymTable::default(),
            picker: AnswerPicker::from_seed(seed),
            token_cache: HashMap::new(),
        }
    }

    /// Rebuild the synonym table from `(canonical, synonyms)` records.
    /// Call before loading the corpus so document tokens pick the mapping up.
    pub fn load_synonyms(&mut self, records: &[(String, Vec<String>)]) {
        self.synonyms = SynonymTable::build(records);
        self.token_cache.clear();
    }

    /// Replace the whole corpus from `(question, answers)` records and train.
    pub fn load_corpus(&mut self, records: Vec<(String, Vec<String>)>) {
        self.index.replace(records, Some(&self.synonyms));
        self.token_cache.clear();
        tracing::info!(docs = self.index.len(), "corpus loaded");
    }

    /// Append one record without retraining; the index goes dirty and keeps
    /// answering with stale aggregates until [`QaEngine::retrain`].
    pub fn add_document(&mut self, question: &str, answers: Vec<String>) {
        let id = self.index.push(question, answers, Some(&self.synonyms));
        tracing::debug!(id, "document added, index dirty until retrain");
    }

    pub fn retrain(&mut self) {
        self.index.train();
        self.token_cache.clear();
    }

    /// Answer a free-text question. An exact (case-insensitive) question
    /// match short-circuits at confidence 1.0; otherwise candidates are
    /// retrieved over the n-gram postings, scored, and the winner's answer
    /// variants go through weighted-random selection.
    pub fn answer(&mut self, question: &str) -> Reply {
        if self.index.is_empty() {
            return Reply::fallback(REPLY_EMPTY_CORPUS);
        }

        let lowered = question.to_lowercase();
        if let Some(&id) = self.index.exact.get(&lowered) {
            let text = self
                .index
                .doc(id)
                .and_then(|doc| doc.answers.first())
                .map_or(REPLY_NO_ANSWER, String::as_str);
            return Reply { text: text.to_string(), confidence: 1.0 };
        }

        let tokens = self.normalized(question);
        if tokens.is_empty() {
            return Reply::fallback(REPLY_UNPARSEABLE);
        }
        let bigrams = ngrams(&tokens, 2);
        let trigrams = ngrams(&tokens, 3);

        let candidates = find_candidates(&self.index, &bigrams, &trigrams, &tokens);
        if candidates.is_empty() {
            return Reply::fallback(REPLY_NO_CANDIDATES);
        }

        let scored = score::rank(&self.index, &candidates, &tokens);
        let Some(best) = scored.first() else {
            return Reply::fallback(REPLY_NO_CANDIDATES);
        };
        let confidence = confidence(best.combined);
        tracing::debug!(
            doc_id = best.doc_id,
            combined = best.combined,
            bm25 = best.bm25,
            cosine = best.cosine,
            ngram = best.ngram,
            jaccard = best.jaccard,
            fuzzy = best.fuzzy,
            candidates = candidates.len(),
            "query ranked"
        );

        let Some(doc) = self.index.doc(best.doc_id) else {
            return Reply::fallback(REPLY_NO_CANDIDATES);
        };
        let text = self
            .picker
            .pick(&doc.answers, best.combined)
            .map_or(REPLY_NO_ANSWER, |answer| answer)
            .to_string();
        Reply { text, confidence }
    }

    /// Persist the built index keyed to the given source hashes.
    pub fn save_cache(&self, path: &Path, corpus_hash: &str, synonym_hash: &str) -> Result<()> {
        let snapshot =
            CacheSnapshot::capture(&self.index, corpus_hash.to_string(), synonym_hash.to_string());
        persist::save_cache(path, &snapshot)
    }

    /// Adopt a cached index if it matches the given source hashes. Returns
    /// whether the cache was used; a rejected or missing cache leaves the
    /// engine untouched.
    pub fn try_load_cache(&mut self, path: &Path, corpus_hash: &str, synonym_hash: &str) -> bool {
        match persist::load_cache(path, corpus_hash, synonym_hash) {
            Some(snapshot) => {
                self.index = snapshot.restore();
                self.token_cache.clear();
                tracing::info!(docs = self.index.len(), path = %path.display(), "index loaded from cache");
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            documents: self.index.len(),
            vocabulary: self.index.doc_freq.len(),
            bigram_entries: self.index.bigram_postings.len(),
            trigram_entries: self.index.trigram_postings.len(),
            avg_doc_len: self.index.avg_doc_len,
            synonyms: self.synonyms.len(),
            state: self.index.state().as_str(),
        }
    }

    pub fn state(&self) -> TrainState {
        self.index.state()
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    fn normalized(&mut self, text: &str) -> Vec<String> {
        if let Some(tokens) = self.token_cache.get(text) {
            return tokens.clone();
        }
        let tokens = normalize(text, Some(&self.synonyms));
        self.token_cache.insert(text.to_string(), tokens.clone());
        tokens
    }
}
