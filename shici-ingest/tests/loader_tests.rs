//! Corpus loader tests against the fixture corpus

use shici_common::catalog::{collections, find_collection};
use shici_ingest::CorpusLoader;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus")
}

// ============================================================================
// Collection loading
// ============================================================================

#[test]
fn test_tang_collection_applies_prefix_and_skips_broken_file() {
    let loader = CorpusLoader::new(fixture_root());
    let works = loader.load_collection(find_collection("quantangshi").unwrap());

    // poet.song.* is excluded, poet.tang.2000 is unparseable, one record is empty
    assert_eq!(works.len(), 7);
    assert!(works.iter().all(|w| w.dynasty == "唐"));
    assert!(works.iter().all(|w| w.category == "quantangshi"));
    assert!(!works.iter().any(|w| w.author == "王安石"));
}

#[test]
fn test_corpus_order_is_file_then_record_order() {
    let loader = CorpusLoader::new(fixture_root());
    let works = loader.load_collection(find_collection("quantangshi").unwrap());
    let titles: Vec<&str> = works.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["静夜思", "将进酒", "月下独酌", "春望", "天末怀人", "登鹳雀楼", "春晓"]
    );
    // No source id: synthesized from file stem and position
    assert_eq!(works[2].id, "poet.tang.0-2");
}

#[test]
fn test_lossy_file_still_loads() {
    let loader = CorpusLoader::new(fixture_root());
    let works = loader.load_collection(find_collection("songci").unwrap());
    assert_eq!(works.len(), 2);

    let ruyi = works.iter().find(|w| w.title == "如梦令").unwrap();
    assert_eq!(ruyi.paragraphs, vec!["昨夜雨疏风骤，浓睡不消残酒。".to_string()]);
    assert_eq!(ruyi.dynasty, "宋");
}

#[test]
fn test_missing_collection_directory_is_empty() {
    let loader = CorpusLoader::new(fixture_root());
    assert!(loader.load_collection(find_collection("nalan").unwrap()).is_empty());
}

// ============================================================================
// Cache behavior
// ============================================================================

#[test]
fn test_collection_cached_after_first_load() {
    let loader = CorpusLoader::new(fixture_root());
    let tang = find_collection("quantangshi").unwrap();

    assert_eq!(loader.cached_collections(), 0);
    let first = loader.load_collection(tang);
    let second = loader.load_collection(tang);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.cached_collections(), 1);
}

#[test]
fn test_concurrent_first_loads_agree() {
    let loader = Arc::new(CorpusLoader::new(fixture_root()));
    let tang = find_collection("quantangshi").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            std::thread::spawn(move || loader.load_collection(tang))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for r in &results {
        assert_eq!(r.as_slice(), results[0].as_slice());
    }
    assert_eq!(loader.cached_collections(), 1);
}

#[test]
fn test_warm_up_loads_everything() {
    let loader = CorpusLoader::new(fixture_root());
    assert!(!loader.is_warm());
    assert_eq!(loader.warm_up(), 14);
    assert_eq!(loader.cached_collections(), collections().len());
    assert!(loader.is_warm());
}

#[test]
fn test_partial_load_is_not_warm() {
    let loader = CorpusLoader::new(fixture_root());
    for collection in collections() {
        loader.load_collection(collection);
    }
    assert_eq!(loader.cached_collections(), collections().len());
    assert!(!loader.is_warm());
}

// ============================================================================
// Biographies
// ============================================================================

#[test]
fn test_biographies_loaded_per_collection() {
    let loader = CorpusLoader::new(fixture_root());

    let tang = loader.load_biographies(find_collection("quantangshi").unwrap());
    assert_eq!(tang.get("李白").map(String::as_str), Some("字太白，号青莲居士。"));

    let song = loader.load_biographies(find_collection("songci").unwrap());
    assert_eq!(song.get("苏轼").map(String::as_str), Some("字子瞻，号东坡居士。"));

    assert!(loader
        .load_biographies(find_collection("yuanqu").unwrap())
        .is_empty());
}
