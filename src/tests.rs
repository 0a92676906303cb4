use std::sync::Arc;

use axum::{routing::get, Json, Router};
use reqwest::Url;
use serde_json::json;
use tokio::net::TcpListener;

use crate::{
    api,
    config::LoaderConfig,
    fetch::{HttpFetcher, QueryStyle, StoreFetcher},
    loader::{FetchOutcome, PageLoader},
    state::{Phase, SkipReason},
    store::{demo_files, FileStore},
    LoaderError,
};

/// Serve `app` on an ephemeral port, returning the listing url
async fn spawn(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move { axum::serve(listener, app).await });
    Url::parse(&format!("http://{addr}/api/files")).unwrap()
}

async fn drain<F: crate::FetchPage>(loader: &PageLoader<F>) -> Vec<FetchOutcome> {
    let mut outcomes = vec![loader.initialize(20).await.unwrap()];
    while let Some(FetchOutcome::Appended { .. }) = outcomes.last() {
        outcomes.push(loader.request_next_page().await.unwrap());
    }
    outcomes
}

#[tokio::test]
async fn http_listing_loads_to_the_end() {
    let store = Arc::new(FileStore::with_records(demo_files(67)));
    let url = spawn(api::router(store)).await;

    for style in [QueryStyle::Skip, QueryStyle::Page] {
        let loader = PageLoader::new(HttpFetcher::new(url.clone()).style(style), LoaderConfig::default());
        let outcomes = drain(&loader).await;
        assert_eq!(
            outcomes,
            vec![
                FetchOutcome::Appended { received: 20 },
                FetchOutcome::Appended { received: 20 },
                FetchOutcome::Appended { received: 20 },
                FetchOutcome::Appended { received: 7 },
                FetchOutcome::Skipped(SkipReason::Exhausted),
            ]
        );
        let state = loader.state();
        assert_eq!(state.records.len(), 67);
        assert_eq!(state.total, 67);
        assert_eq!(state.records[66]["name"], "file-0066.docx");
    }
}

#[tokio::test]
async fn inserts_show_up_after_reset() {
    let store = Arc::new(FileStore::with_records(demo_files(20)));
    let url = spawn(api::router(Arc::clone(&store))).await;
    let loader = PageLoader::new(HttpFetcher::new(url.clone()), LoaderConfig::default());

    let _ = drain(&loader).await;
    assert_eq!(loader.state().records.len(), 20);
    assert_eq!(loader.state().phase(), Phase::Exhausted);

    let resp = reqwest::Client::new()
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(json!({ "_id": "new", "name": "late.txt" }).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    // Exhausted stays exhausted until the listing is initialized again
    assert_eq!(
        loader.request_next_page().await.unwrap(),
        FetchOutcome::Skipped(SkipReason::Exhausted)
    );
    let _ = drain(&loader).await;
    assert_eq!(loader.state().records.len(), 21);
}

#[tokio::test]
async fn malformed_payload_is_an_error() {
    let app = Router::new().route(
        "/api/files",
        get(|| async { Json(json!({ "data": [{ "_id": "a" }], "total": 1 })) }),
    );
    let url = spawn(app).await;
    let loader = PageLoader::new(HttpFetcher::new(url), LoaderConfig::default());

    assert_eq!(loader.initialize(20).await.unwrap(), FetchOutcome::Failed);
    let state = loader.state();
    assert_eq!(state.phase(), Phase::Error);
    assert!(state.records.is_empty());
    assert!(state.error.unwrap().starts_with("unknown response format"));

    // Not sticky: another request is allowed and fails the same way
    assert_eq!(loader.request_next_page().await.unwrap(), FetchOutcome::Failed);
}

#[tokio::test]
async fn error_status_is_reported() {
    let app = Router::new().route(
        "/api/files",
        get(|| async { crate::HttpErr::Err(anyhow::anyhow!("database down")) }),
    );
    let url = spawn(app).await;
    let fetcher = HttpFetcher::new(url);
    let err = crate::FetchPage::fetch_page(&fetcher, crate::PageRequest::new(0, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::Status(s) if s == reqwest::StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn retarget_to_another_endpoint() {
    let small = spawn(api::router(Arc::new(FileStore::with_records(demo_files(5))))).await;
    let large = Arc::new(FileStore::with_records(demo_files(67)));

    let loader = PageLoader::new(HttpFetcher::new(small), LoaderConfig::default());
    assert_eq!(loader.initialize(20).await.unwrap(), FetchOutcome::Appended { received: 5 });

    let large_url = spawn(api::router(Arc::clone(&large))).await;
    let outcome = loader.retarget(HttpFetcher::new(large_url), 20).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Appended { received: 20 });
    assert!(loader.state().has_more);

    // Same listing straight from the store
    let direct = PageLoader::new(StoreFetcher::new(large), LoaderConfig::default());
    let outcomes = drain(&direct).await;
    assert_eq!(outcomes.len(), 5);
    assert_eq!(*direct.state().records, demo_files(67));
    assert_eq!(direct.state().records[..20], loader.state().records[..]);
}
