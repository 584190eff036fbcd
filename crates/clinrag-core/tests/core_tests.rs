use std::fs;
use tempfile::TempDir;

use clinrag_core::config::{Config, Settings};
use clinrag_core::types::{KnowledgeChunk, TokenBudget};
use clinrag_core::{Corpus, Error};

fn chunk(id: &str, doc: &str, index: u32, content: &str) -> KnowledgeChunk {
    KnowledgeChunk {
        id: id.to_string(),
        document_id: doc.to_string(),
        chunk_index: index,
        content: content.to_string(),
        question: None,
        answer: None,
        source_file_name: format!("{doc}.csv"),
        category: "general".to_string(),
        confidence: Default::default(),
    }
}

#[test]
fn load_dir_reads_json_and_jsonl() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(
        dir.join("points.json"),
        r#"[{"id":"a","documentId":"points","chunkIndex":0,"content":"LI4 clears the face","sourceFileName":"tcm_points.csv"}]"#,
    )
    .unwrap();
    fs::create_dir(dir.join("qa")).unwrap();
    fs::write(
        dir.join("qa/entries.jsonl"),
        concat!(
            r#"{"id":"b","documentId":"qa","chunkIndex":0,"question":"What is ST36 for?","answer":"Tonifies qi.","sourceFileName":"QA_Professional.csv","confidence":"high"}"#,
            "\n\n",
            r#"{"id":"c","documentId":"qa","chunkIndex":1,"content":"SP6 nourishes yin","sourceFileName":"QA_Professional.csv"}"#,
            "\n"
        ),
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let corpus = Corpus::load_dir(dir).expect("load");

    assert_eq!(corpus.len(), 3);
    assert_eq!(corpus.document_count(), 2);
    let b = corpus.get("b").expect("b present");
    assert_eq!(b.category, "general", "category defaults");
    assert_eq!(b.body().as_deref(), Some("Q: What is ST36 for?\nA: Tonifies qi."));
}

#[test]
fn load_dir_reports_bad_json_with_path() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.json"), "{not json").unwrap();

    let err = Corpus::load_dir(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Corpus { ref path, .. } if path.ends_with("broken.json")), "{err}");
}

#[test]
fn empty_dir_is_empty_snapshot() {
    let tmp = TempDir::new().unwrap();
    let corpus = Corpus::load_dir(tmp.path()).expect("load");
    assert!(corpus.is_empty());
}

#[test]
fn duplicate_ids_and_positions_are_skipped() {
    let corpus = Corpus::from_chunks(vec![
        chunk("a", "doc", 0, "first"),
        chunk("a", "doc", 1, "same id"),
        chunk("b", "doc", 0, "same position"),
        chunk("c", "doc", 1, "ok"),
    ]);
    let ids: Vec<_> = corpus.chunks().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn chunk_body_and_malformed_reason() {
    let mut qa = chunk("q", "doc", 0, "");
    qa.question = Some("Where is LI4?".into());
    assert_eq!(qa.malformed_reason(), Some("question without answer and no content"));
    qa.answer = Some("  ".into());
    assert!(qa.body().is_none());
    qa.content = "fallback content".into();
    assert_eq!(qa.body().as_deref(), Some("fallback content"));
    assert!(qa.malformed_reason().is_none());
    assert_eq!(qa.preview(5), "Where");

    let empty = chunk("e", "doc", 1, "   ");
    assert_eq!(empty.malformed_reason(), Some("missing content, question and answer"));
}

#[test]
fn token_budget_percentage_rounds() {
    assert_eq!(TokenBudget::new(50, 60).percentage, 83);
    assert_eq!(TokenBudget::new(0, 60).percentage, 0);
    assert_eq!(TokenBudget::new(0, 0).percentage, 0);
    assert_eq!(TokenBudget::new(1, 200).percentage, 1);
}

#[test]
fn settings_default_when_keys_missing() {
    let settings = Config::from_toml_str("").settings().expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.retrieval.budget.chars_per_token, 4);
    assert_eq!(settings.retrieval.scoring.keyword_only_weight, 1.0);
}

#[test]
fn settings_override_from_toml() {
    let config = Config::from_toml_str(
        r#"
        [data]
        corpus_dir = "/srv/corpus"

        [retrieval.budget]
        max_tokens = 600
        max_per_source = 2

        [synonyms]
        "four gates" = "LI4"
        "#,
    );
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.budget.max_tokens, 600);
    assert_eq!(settings.retrieval.budget.max_per_source, Some(2));
    assert_eq!(settings.retrieval.budget.preview_chars, 100, "untouched keys keep defaults");
    assert_eq!(settings.synonyms.get("four gates").map(String::as_str), Some("LI4"));
    assert_eq!(settings.corpus_dir(std::path::Path::new("/tmp")), std::path::PathBuf::from("/srv/corpus"));

    let max_tokens: usize = config.get("retrieval.budget.max_tokens").expect("get");
    assert_eq!(max_tokens, 600);
}

#[test]
fn settings_validation_rejects_bad_values() {
    let zero_cpt = Config::from_toml_str("[retrieval.budget]\nchars_per_token = 0\n").settings();
    assert!(matches!(zero_cpt, Err(Error::InvalidConfig(_))));

    let negative = Config::from_toml_str("[retrieval.scoring]\nquestion_boost = -0.1\n").settings();
    assert!(matches!(negative, Err(Error::InvalidConfig(_))));

    let similarity = Config::from_toml_str("[retrieval.scoring]\nquestion_similarity = 1.5\n").settings();
    assert!(matches!(similarity, Err(Error::InvalidConfig(_))));
}
