//! Error types of the loader and of the http service.

use thiserror::Error;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Errors a page fetch can end with.
///
/// All of them are recoverable: the loader records the message in its state
/// and accepts another request afterwards.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Network or protocol failure while talking to the endpoint
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered with a non success status
    #[error("endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    /// The body is not a `files` payload
    #[error("unknown response format: {0}")]
    UnknownFormat(#[source] serde_json::Error),
    /// Page style queries need a cursor on a page boundary
    #[error("cursor {cursor} is not a multiple of page size {page_size}")]
    MisalignedCursor {
        /// Requested offset
        cursor: usize,
        /// Requested page size
        page_size: usize,
    },
    /// Failure reported by a custom fetch capability
    #[error("{0}")]
    Fetch(String),
    /// A lock guarding loader or store state was poisoned
    #[error("state lock poisoned: {0}")]
    Poisoned(String),
}

/// Server side error, rendered as an http response.
#[derive(Error, Debug)]
pub enum HttpErr {
    /// a generic error
    #[error("generic")]
    Err(#[from] anyhow::Error),
    /// An http status
    #[error("status code")]
    Status(StatusCode),
}

// Tell axum how to convert `HttpErr` into a response.
impl IntoResponse for HttpErr {
    fn into_response(self) -> Response {
        match self {
            Self::Err(e) => {
                tracing::error!("Error fetching files: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Failed to fetch files" })),
                )
                    .into_response()
            }
            Self::Status(sc) => sc.into_response(),
        }
    }
}

// This enables using `?` on functions that return `Result<_, StatusCode>` to turn them into
// `Result<_, HttpErr>`.
impl From<StatusCode> for HttpErr {
    fn from(sc: StatusCode) -> Self {
        Self::Status(sc)
    }
}

impl From<LoaderError> for HttpErr {
    fn from(e: LoaderError) -> Self {
        Self::Err(anyhow::Error::new(e))
    }
}
