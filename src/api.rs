//! Http handlers of the file listing.

use crate::{error::HttpErr, page::FilesPage, page::Record, pagination::Pagination, store::FileStore};
use axum::{
    body::Body,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response, Result as HttpResult},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared store handed to every handler
pub type StoreState = Arc<FileStore>;
/// Result of a handler
pub type HttpResponse = HttpResult<Response<Body>, HttpErr>;

/// Compose the routes over `store`
pub fn router(store: StoreState) -> Router {
    Router::new()
        .route("/api/files", get(files_index).post(files_insert))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Handler to return a page of files, addressed by `skip` or by `page`
pub async fn files_index(
    pagination: Option<Query<Pagination>>,
    State(store): State<StoreState>,
) -> HttpResponse {
    let Query(pagination) = pagination.unwrap_or_default();
    let window = pagination.window().ok_or(StatusCode::BAD_REQUEST)?;

    let (files, total) = store.find(window.skip, window.limit)?;
    tracing::debug!(
        skip = window.skip,
        limit = window.limit,
        returned = files.len(),
        total,
        "files page"
    );

    Ok(Json(FilesPage {
        files,
        total_records: total,
        current_page: Some(window.current_page()),
        total_pages: Some(window.total_pages(total)),
    })
    .into_response())
}

/// Handler to insert a new file document
pub async fn files_insert(State(store): State<StoreState>, file: Json<Record>) -> HttpResponse {
    store.insert(file.0)?;

    Ok(StatusCode::CREATED.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::demo_files;

    fn store() -> StoreState {
        Arc::new(FileStore::with_records(demo_files(67)))
    }

    async fn page(pagination: Pagination) -> (StatusCode, Option<FilesPage>) {
        let resp = match files_index(Some(Query(pagination)), State(store())).await {
            Ok(resp) => resp,
            Err(e) => e.into_response(),
        };
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, FilesPage::decode(&body).ok())
    }

    #[tokio::test]
    async fn skip_and_limit() {
        let (status, body) = page(Pagination { skip: Some(60), page: None, limit: Some(20) }).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body.files.len(), 7);
        assert_eq!(body.total_records, 67);
        assert_eq!(body.current_page, Some(4));
        assert_eq!(body.total_pages, Some(4));
    }

    #[tokio::test]
    async fn page_and_limit() {
        let (_, body) = page(Pagination { skip: None, page: Some(2), limit: Some(20) }).await;
        let body = body.unwrap();
        assert_eq!(body.files[0]["name"], "file-0020.pdf");
        assert_eq!(body.current_page, Some(2));
    }

    #[tokio::test]
    async fn missing_query_uses_defaults() {
        let resp = files_index(None, State(store())).await.unwrap();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = FilesPage::decode(&body).unwrap();
        assert_eq!(body.files.len(), 20);
    }

    #[tokio::test]
    async fn zero_limit_is_bad_request() {
        let (status, body) = page(Pagination { skip: None, page: None, limit: Some(0) }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn skip_past_the_end_is_empty() {
        let (status, body) = page(Pagination { skip: Some(usize::MAX), page: None, limit: Some(1) }).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert!(body.files.is_empty());
        assert_eq!(body.total_records, 67);
        assert_eq!(body.current_page, Some(usize::MAX));
    }

    #[tokio::test]
    async fn insert_grows_the_listing() {
        let store = store();
        let file = demo_files(1).remove(0);
        let resp = files_insert(State(Arc::clone(&store)), Json(file)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(store.count().unwrap(), 68);
    }
}
