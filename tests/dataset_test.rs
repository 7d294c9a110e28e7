//! Integration tests for instance file loading.

mod common;

use common::WordCodec;
use squash_qgen::core::dataset::{parse_raw_instances, tokenize_instances};
use squash_qgen::{load_instances, Error, QuestionClass};

const INSTANCES: &str = r#"[
    {"para_index": 0, "paragraph": "the cat sat", "answer": "cat", "class": "general", "algorithm": "rule"},
    {"para_index": 0, "paragraph": "the cat sat", "answer": "sat", "class": "specific", "algorithm": "ner"},
    {"para_index": 1, "paragraph": "the dog ran", "answer": "dog", "class": "general", "algorithm": "rule"}
]"#;

#[test]
fn test_parse_raw_instances() {
    let raw = parse_raw_instances(INSTANCES).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw[1].class, QuestionClass::Specific);
    assert_eq!(raw[1].algorithm, "ner");
    assert_eq!(raw[2].para_index, 1);
}

#[test]
fn test_tokenize_keeps_order() {
    let codec = WordCodec::new();
    let raw = parse_raw_instances(INSTANCES).unwrap();
    let instances = tokenize_instances(&raw, &codec).unwrap();

    assert_eq!(instances.len(), 3);
    assert_eq!(instances[0].paragraph, codec.ids("the cat sat"));
    assert_eq!(instances[1].answer, codec.ids("sat"));
    assert_eq!(instances[2].para_index, 1);
}

#[test]
fn test_unknown_class_is_rejected() {
    let json = r#"[{"para_index": 0, "paragraph": "a", "answer": "a", "class": "yes-no", "algorithm": "x"}]"#;
    assert!(matches!(parse_raw_instances(json), Err(Error::Json(_))));
}

#[test]
fn test_tokenizer_errors_propagate() {
    let codec = WordCodec::new();
    let json = r#"[{"para_index": 0, "paragraph": "zebra", "answer": "zebra", "class": "general", "algorithm": "x"}]"#;
    let raw = parse_raw_instances(json).unwrap();
    assert!(matches!(
        tokenize_instances(&raw, &codec),
        Err(Error::Tokenization(_))
    ));
}

#[test]
fn test_load_instances_from_file() {
    let codec = WordCodec::new();
    let path = std::env::temp_dir().join(format!("squash-qgen-instances-{}.json", std::process::id()));
    std::fs::write(&path, INSTANCES).unwrap();

    let instances = load_instances(&path, &codec).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(instances.len(), 3);
    assert_eq!(instances[0].class, QuestionClass::General);
}

#[test]
fn test_missing_file_is_io_error() {
    let codec = WordCodec::new();
    let result = load_instances("/nonexistent/squash-qgen/instances.json", &codec);
    assert!(matches!(result, Err(Error::Io(_))));
}
