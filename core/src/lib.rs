//! Retrieval and ranking engine for question answering over a fixed corpus:
//! term normalization and stemming, an in-memory n-gram index, a
//! multi-signal relevance scorer, weighted answer selection, and a binary
//! cache keyed to the source files' content hashes.

pub mod engine;
pub mod index;
pub mod persist;
pub mod retrieve;
pub mod score;
pub mod select;
pub mod stem;
pub mod tokenizer;

pub type DocId = u32;

pub use engine::{QaEngine, Reply};
pub use index::{CorpusIndex, Document, TrainState};
pub use tokenizer::SynonymTable;
