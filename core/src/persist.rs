use crate::index::{CorpusIndex, Document};
use crate::DocId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Fixed 9-byte tag at the start of every cache file.
pub const CACHE_MAGIC: &[u8; 9] = b"QACACHEv1";

/// Hex sha1 digest of a source file's bytes, used to key the cache to the
/// exact corpus/synonym pair it was built from.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Loss-free snapshot of a built [`CorpusIndex`]. The n-gram postings are not
/// stored; they are rebuilt from the per-document sets on load. Encoded with
/// bincode's fixed little-endian layout after the magic tag, which settles
/// the format's byte order across hosts.
///
/// Field order is the on-disk layout: the average length precedes the
/// document records, whose count rides as bincode's length prefix. Reordering
/// fields invalidates existing cache files.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub corpus_hash: String,
    pub synonym_hash: String,
    pub avg_doc_len: f64,
    pub docs: Vec<Document>,
    pub doc_freq: HashMap<String, u32>,
    pub idf: HashMap<String, f64>,
    pub exact: HashMap<String, DocId>,
}

impl CacheSnapshot {
    pub fn capture(index: &CorpusIndex, corpus_hash: String, synonym_hash: String) -> Self {
        Self {
            corpus_hash,
            synonym_hash,
            avg_doc_len: index.avg_doc_len,
            docs: index.docs.clone(),
            doc_freq: index.doc_freq.clone(),
            idf: index.idf.clone(),
            exact: index.exact.clone(),
        }
    }

    /// Reassemble the index, bypassing every build step including
    /// normalization.
    pub fn restore(self) -> CorpusIndex {
        CorpusIndex::from_parts(self.docs, self.avg_doc_len, self.doc_freq, self.idf, self.exact)
    }
}

pub fn save_cache(path: &Path, snapshot: &CacheSnapshot) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(CACHE_MAGIC)?;
    let bytes = bincode::serialize(snapshot)?;
    f.write_all(&bytes)?;
    Ok(())
}

/// Load a snapshot if, and only if, the file exists, carries the magic tag,
/// decodes cleanly, and both stored content hashes match the current source
/// bytes. Every failure mode means "cache absent", never an error: the
/// caller falls back to a full rebuild.
pub fn load_cache(path: &Path, corpus_hash: &str, synonym_hash: &str) -> Option<CacheSnapshot> {
    let buf = std::fs::read(path).ok()?;
    if buf.len() < CACHE_MAGIC.len() || &buf[..CACHE_MAGIC.len()] != CACHE_MAGIC {
        tracing::debug!(path = %path.display(), "cache rejected: bad magic");
        return None;
    }
    let snapshot: CacheSnapshot = match bincode::deserialize(&buf[CACHE_MAGIC.len()..]) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "cache rejected: decode failed");
            return None;
        }
    };
    if snapshot.corpus_hash != corpus_hash || snapshot.synonym_hash != synonym_hash {
        tracing::debug!(path = %path.display(), "cache rejected: source hash mismatch");
        return None;
    }
    Some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn build_index() -> CorpusIndex {
        let mut index = CorpusIndex::new();
        index.replace(
            vec![
                ("What is the capital of France".to_string(), vec!["Paris".to_string()]),
                (
                    "How many legs does a spider have".to_string(),
                    vec!["Eight".to_string(), "8".to_string()],
                ),
            ],
            None,
        );
        index
    }

    #[test]
    fn round_trip_preserves_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qa_cache.bin");
        let index = build_index();
        let snapshot = CacheSnapshot::capture(&index, "ch".into(), "sh".into());
        save_cache(&path, &snapshot).unwrap();

        let restored = load_cache(&path, "ch", "sh").unwrap().restore();
        assert_eq!(restored.len(), index.len());
        assert_eq!(restored.doc_freq, index.doc_freq);
        assert_eq!(restored.idf, index.idf);
        assert_eq!(restored.exact, index.exact);
        assert_eq!(restored.avg_doc_len, index.avg_doc_len);
        for (a, b) in restored.docs.iter().zip(&index.docs) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.question, b.question);
            assert_eq!(a.answers, b.answers);
            assert_eq!(a.tokens, b.tokens);
            assert_eq!(a.bigrams, b.bigrams);
            assert_eq!(a.trigrams, b.trigrams);
        }
        // postings rebuilt from documents
        assert_eq!(restored.bigram_postings, index.bigram_postings);
        assert_eq!(restored.trigram_postings, index.trigram_postings);
    }

    #[test]
    fn hash_mismatch_rejects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qa_cache.bin");
        let index = build_index();
        save_cache(&path, &CacheSnapshot::capture(&index, "ch".into(), "sh".into())).unwrap();
        assert!(load_cache(&path, "other", "sh").is_none());
        assert!(load_cache(&path, "ch", "other").is_none());
    }

    #[test]
    fn bad_magic_rejects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qa_cache.bin");
        std::fs::write(&path, b"NOTACACHE rest of file").unwrap();
        assert!(load_cache(&path, "ch", "sh").is_none());
    }

    #[test]
    fn truncated_blob_rejects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qa_cache.bin");
        let index = build_index();
        save_cache(&path, &CacheSnapshot::capture(&index, "ch".into(), "sh".into())).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(load_cache(&path, "ch", "sh").is_none());
    }

    #[test]
    fn missing_file_is_absent() {
        let dir = tempdir().unwrap();
        assert!(load_cache(&dir.path().join("nope.bin"), "ch", "sh").is_none());
    }

    #[test]
    fn content_hash_is_stable_and_discriminating() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        assert_eq!(content_hash(b"abc").len(), 40);
    }
}
