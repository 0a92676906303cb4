//! Fetch capabilities the loader pulls pages through.

use std::sync::Arc;

use reqwest::{Client, Url};

use crate::{
    error::LoaderError,
    page::{FilesPage, PageRequest, PageResponse},
    store::FileStore,
};

/// Capability the loader pulls pages through
#[allow(async_fn_in_trait, reason = "loader futures stay on the calling task")]
pub trait FetchPage {
    /// Fetch `request.page_size` records starting at `request.cursor`
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse, LoaderError>;
}

/// How the offset is put on the query string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryStyle {
    /// `?skip=<cursor>&limit=<page_size>`
    #[default]
    Skip,
    /// `?page=<cursor / page_size + 1>&limit=<page_size>`
    Page,
}

/// Fetches pages from a `GET <endpoint>?skip=&limit=` listing
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    endpoint: Url,
    style: QueryStyle,
}

impl HttpFetcher {
    /// Fetcher for `endpoint` with a default client
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Fetcher sharing an existing client
    #[must_use]
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint, style: QueryStyle::Skip }
    }

    /// Use another query style
    #[must_use]
    pub fn style(mut self, style: QueryStyle) -> Self {
        self.style = style;
        self
    }

    /// Endpoint url of `request`
    pub fn url_for(&self, request: PageRequest) -> Result<Url, LoaderError> {
        let PageRequest { cursor, page_size } = request;
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            match self.style {
                QueryStyle::Skip => {
                    let _ = pairs.append_pair("skip", &cursor.to_string());
                }
                QueryStyle::Page => {
                    if cursor.checked_rem(page_size) != Some(0) {
                        return Err(LoaderError::MisalignedCursor { cursor, page_size });
                    }
                    let _ = pairs.append_pair("page", &(cursor / page_size + 1).to_string());
                }
            }
            let _ = pairs.append_pair("limit", &page_size.to_string());
        }
        Ok(url)
    }
}

impl FetchPage for HttpFetcher {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse, LoaderError> {
        let url = self.url_for(request)?;
        tracing::debug!(%url, "fetching page");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoaderError::Status(status));
        }
        let body = resp.bytes().await?;
        Ok(FilesPage::decode(&body)?.into())
    }
}

/// Reads pages straight out of a shared [`FileStore`]
#[derive(Debug, Clone)]
pub struct StoreFetcher {
    store: Arc<FileStore>,
}

impl StoreFetcher {
    /// Fetcher over `store`
    #[must_use]
    pub const fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

impl FetchPage for StoreFetcher {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse, LoaderError> {
        let (records, total) = self.store.find(request.cursor, request.page_size)?;
        Ok(PageResponse { records, total, has_more: None })
    }
}
