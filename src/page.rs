//! Page data model and the `files` wire payload.

use serde::{Deserialize, Serialize};

use crate::error::LoaderError;

/// One document of the listing. The loader never looks inside it.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Offset based request for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// Number of records already materialized client side
    pub cursor: usize,
    /// Maximum number of records wanted, never zero
    pub page_size: usize,
}

impl PageRequest {
    /// Build a request, a zero page size is clamped to one
    #[must_use]
    pub fn new(cursor: usize, page_size: usize) -> Self {
        Self { cursor, page_size: page_size.max(1) }
    }
}

/// What a fetch capability hands back for one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    /// Records in server order
    pub records: Vec<Record>,
    /// Server side count of all matching records at query time
    pub total: usize,
    /// Explicit "more pages" signal, when the server provides one
    pub has_more: Option<bool>,
}

/// Json body of `GET /api/files`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesPage {
    /// Documents of the requested window
    pub files: Vec<Record>,
    /// Count of the whole collection
    pub total_records: usize,
    /// 1-based page index of the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    /// Number of pages of `limit` records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

impl FilesPage {
    /// Strict decode of a response body.
    ///
    /// Anything that is not an object carrying `files` and `totalRecords`
    /// is rejected instead of being read as an empty page.
    pub fn decode(body: &[u8]) -> Result<Self, LoaderError> {
        serde_json::from_slice(body).map_err(LoaderError::UnknownFormat)
    }
}

impl From<FilesPage> for PageResponse {
    fn from(page: FilesPage) -> Self {
        let has_more = match (page.current_page, page.total_pages) {
            (Some(current), Some(pages)) => Some(current < pages),
            _ => None,
        };
        Self { records: page.files, total: page.total_records, has_more }
    }
}
