//! Behavior every entity store must share, run against both backends over
//! the same fixture corpus

mod helpers;

use helpers::{both_stores, fixture_root, memory_store, sqlite_store};
use shici_common::{Error, PageRequest};
use shici_ingest::CorpusLoader;
use shici_server::query::QueryService;
use shici_server::store::{EntityStore, MemoryStore};
use std::collections::HashSet;
use std::sync::Arc;

const TOTAL_WORKS: usize = 14;

#[tokio::test]
async fn test_pagination_metadata() {
    for store in both_stores().await {
        let first = store.list_works(PageRequest::new(1, 5), None).await.unwrap();
        assert_eq!(first.total, TOTAL_WORKS, "{}", store.backend());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), 5);

        let last = store.list_works(PageRequest::new(3, 5), None).await.unwrap();
        assert_eq!(last.items.len(), 4);

        let beyond = store.list_works(PageRequest::new(9, 5), None).await.unwrap();
        assert!(beyond.items.is_empty(), "{}", store.backend());
        assert_eq!(beyond.total, TOTAL_WORKS);
        assert_eq!(beyond.page, 9);

        let far = PageRequest::new(100_000_000_000_000_000, 100);
        let listed = store.list_works(far, None).await.unwrap();
        assert!(listed.items.is_empty(), "{}", store.backend());
        assert_eq!(listed.total, TOTAL_WORKS);

        let found = store.search("李白", far).await.unwrap();
        assert!(found.items.is_empty(), "{}", store.backend());
        assert_eq!(found.total, 4);
    }
}

#[tokio::test]
async fn test_memory_store_warms_cold_loader_before_first_query() {
    let loader = Arc::new(CorpusLoader::new(fixture_root()));
    let store = MemoryStore::new(Arc::clone(&loader));
    assert!(!loader.is_warm());

    let page = store.list_works(PageRequest::new(1, 5), Some("quantangshi")).await.unwrap();
    assert!(!page.items.is_empty());
    assert!(loader.is_warm());
}

#[tokio::test]
async fn test_pages_partition_the_corpus() {
    for store in both_stores().await {
        let mut seen = Vec::new();
        for page in 1..=4 {
            let p = store.list_works(PageRequest::new(page, 4), None).await.unwrap();
            seen.extend(p.items.into_iter().map(|w| w.id));
        }
        assert_eq!(seen.len(), TOTAL_WORKS);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), TOTAL_WORKS);
    }
}

#[tokio::test]
async fn test_category_filter_in_corpus_order() {
    for store in both_stores().await {
        let tang = store
            .list_works(PageRequest::new(1, 100), Some("quantangshi"))
            .await
            .unwrap();
        let titles: Vec<&str> = tang.items.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(
            titles,
            ["静夜思", "将进酒", "月下独酌", "春望", "天末怀人", "登鹳雀楼", "春晓"],
            "{}",
            store.backend()
        );
        assert!(tang.items.iter().all(|w| w.category == "quantangshi" && w.dynasty == "唐"));

        let empty = store
            .list_works(PageRequest::default(), Some("nalan"))
            .await
            .unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.total_pages, 0);
    }
}

#[tokio::test]
async fn test_work_by_id_round_trip() {
    for store in both_stores().await {
        let page = store.list_works(PageRequest::new(1, 100), None).await.unwrap();
        for work in &page.items {
            let fetched = store.work_by_id(&work.id).await.unwrap();
            assert_eq!(&fetched, work, "{}", store.backend());
        }

        let synthesized = store.work_by_id("poet.tang.0-2").await.unwrap();
        assert_eq!(synthesized.title, "月下独酌");

        let missing = store.work_by_id("no-such-poem").await;
        assert!(matches!(missing, Err(Error::NotFound(_))), "{}", store.backend());
    }
}

#[tokio::test]
async fn test_random_without_replacement() {
    for store in both_stores().await {
        for _ in 0..20 {
            let works = store.random_works(5, None).await.unwrap();
            assert_eq!(works.len(), 5);
            let ids: HashSet<_> = works.iter().map(|w| w.id.clone()).collect();
            assert_eq!(ids.len(), 5, "{}", store.backend());
        }

        // Pool smaller than the request: the whole pool, no padding
        let songci = store.random_works(10, Some("songci")).await.unwrap();
        assert_eq!(songci.len(), 2, "{}", store.backend());
        let ids: HashSet<_> = songci.iter().map(|w| w.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(songci.iter().all(|w| w.category == "songci"));
    }
}

#[tokio::test]
async fn test_search_counts_every_matching_work() {
    for store in both_stores().await {
        // Three by author, one by a body line
        let libai = store.search("李白", PageRequest::default()).await.unwrap();
        assert_eq!(libai.total, 4, "{}", store.backend());
        assert!(libai.items.iter().any(|w| w.title == "天末怀人"));

        let moon = store.search("明月", PageRequest::default()).await.unwrap();
        assert_eq!(moon.total, 3, "{}", store.backend());

        let paged = store.search("李白", PageRequest::new(2, 3)).await.unwrap();
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.total_pages, 2);

        let none = store.search("不存在的句子", PageRequest::default()).await.unwrap();
        assert_eq!(none.total, 0);
    }
}

#[tokio::test]
async fn test_author_aggregation() {
    for store in both_stores().await {
        let authors = store.list_authors(PageRequest::new(1, 100), None).await.unwrap();
        let names: Vec<&str> = authors.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            ["孟子", "曹操", "李白", "杜甫", "王之涣", "孟浩然", "苏轼", "李清照", "马致远", "张潮"],
            "{}",
            store.backend()
        );

        // Counts sum to the corpus size
        let sum: usize = authors.items.iter().map(|a| a.poem_count).sum();
        assert_eq!(sum, TOTAL_WORKS);

        let libai = store.author_by_name("李白").await.unwrap();
        assert_eq!(libai.poem_count, 3);
        assert_eq!(libai.dynasty, "唐");
        assert_eq!(libai.biography.as_deref(), Some("字太白，号青莲居士。"));

        let caocao = store.author_by_name("曹操").await.unwrap();
        assert_eq!(caocao.dynasty, "汉魏");

        // Biography without works is not an author of the corpus
        assert!(matches!(store.author_by_name("无作品者").await, Err(Error::NotFound(_))));
    }
}

#[tokio::test]
async fn test_author_dynasty_filter() {
    for store in both_stores().await {
        let tang = store.list_authors(PageRequest::default(), Some("唐")).await.unwrap();
        let names: Vec<&str> = tang.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["李白", "杜甫", "王之涣", "孟浩然"], "{}", store.backend());

        let song = store.list_authors(PageRequest::default(), Some("宋")).await.unwrap();
        assert_eq!(song.total, 2);
    }
}

#[tokio::test]
async fn test_works_by_author_exact_match() {
    for store in both_stores().await {
        let dufu = store.works_by_author("杜甫", PageRequest::default()).await.unwrap();
        assert_eq!(dufu.total, 2, "{}", store.backend());
        assert_eq!(dufu.items[0].title, "春望");

        // Exact, not substring
        let partial = store.works_by_author("杜", PageRequest::default()).await.unwrap();
        assert_eq!(partial.total, 0);
    }
}

#[tokio::test]
async fn test_backends_return_identical_results() {
    let memory = memory_store();
    let sqlite = sqlite_store().await;

    let all = PageRequest::new(1, 100);
    assert_eq!(
        memory.list_works(all, None).await.unwrap(),
        sqlite.list_works(all, None).await.unwrap()
    );
    assert_eq!(
        memory.list_authors(all, None).await.unwrap(),
        sqlite.list_authors(all, None).await.unwrap()
    );
    assert_eq!(
        memory.search("月", all).await.unwrap(),
        sqlite.search("月", all).await.unwrap()
    );
}

#[tokio::test]
async fn test_comments_survive_both_backends() {
    for store in both_stores().await {
        let page = store
            .list_works(PageRequest::default(), Some("youmengying"))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        let first = &page.items[0];
        assert_eq!(first.author, "张潮");
        assert_eq!(first.comments.len(), 2, "{}", store.backend());
        assert_eq!(first.comments[0].commenter.as_deref(), Some("张竹坡"));
        assert_eq!(first.comments[0].content, "此言甚妙。");
    }
}

#[tokio::test]
async fn test_query_service_sanitizes_requests() {
    for store in both_stores().await {
        let service = QueryService::new(store);

        // Clamped, not rejected
        let page = service.list_works(0, 1000, None).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 100);
        assert_eq!(page.items.len(), TOTAL_WORKS);

        // Category by display name and directory
        assert_eq!(service.list_works(1, 20, Some("全唐诗")).await.unwrap().total, 7);
        assert_eq!(service.list_works(1, 20, Some("宋词")).await.unwrap().total, 2);
        // Unknown category is an empty page
        assert_eq!(service.list_works(1, 20, Some("汉赋")).await.unwrap().total, 0);

        assert_eq!(service.random_works(0, None).await.unwrap().len(), 1);
        assert_eq!(service.random_works(99, None).await.unwrap().len(), 10);

        // Dynasty by id
        assert_eq!(service.list_authors(1, 20, Some("tang")).await.unwrap().total, 4);

        assert!(matches!(service.search("  ", 1, 20).await, Err(Error::InvalidInput(_))));
        let result = service.search("李白", 1, 20).await.unwrap();
        assert_eq!(result.query, "李白");
        assert_eq!(result.results.total, 4);
    }
}
