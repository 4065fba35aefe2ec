use qa_core::stem::stem;
use qa_core::tokenizer::{normalize, SynonymTable};

#[test]
fn it_normalizes_and_stems() {
    let terms = normalize("Running Runners RUN! The menu.", None);
    assert!(terms.contains(&"run".to_string()));
    assert!(terms.contains(&"menu".to_string()));
    assert!(!terms.contains(&"the".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let terms = normalize("The fox and the dog were not in it", None);
    assert_eq!(terms, vec!["fox".to_string(), "dog".to_string()]);
}

#[test]
fn stemming_matches_between_corpus_and_query() {
    // whatever the stemmer produces, documents and queries must agree
    for text in ["capital cities", "capitals", "city capital"] {
        for term in normalize(text, None) {
            assert_eq!(stem(&term), term, "token {term} from {text} is not a fixed point");
        }
    }
}

#[test]
fn synonyms_apply_to_both_sides() {
    let records = vec![("automobile".to_string(), vec!["car".to_string(), "vehicle".to_string()])];
    let table = SynonymTable::build(&records);
    let from_synonym = normalize("car insurance", Some(&table));
    let from_canonical = normalize("automobile insurance", Some(&table));
    assert_eq!(from_synonym, from_canonical);
}

#[test]
fn all_stopword_input_yields_no_tokens() {
    assert!(normalize("the and of is", None).is_empty());
    assert!(normalize("!!! ??? ...", None).is_empty());
}
