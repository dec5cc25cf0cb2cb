use crate::core::query::{QueryDocument, APPLICATIONS_INDEX};
use crate::core::{Record, SearchBackend};
use crate::utils::error::Result;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 10_000;
pub const DEFAULT_LEASE: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollSettings {
    pub index: String,
    pub page_size: usize,
    /// How long the backend keeps the scroll context alive after each request.
    pub lease: Duration,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            index: APPLICATIONS_INDEX.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            lease: DEFAULT_LEASE,
        }
    }
}

enum ScrollState {
    NotStarted,
    Open { scroll_id: String },
    Exhausted,
}

/// Lazy, finite sequence of result pages for one query.
///
/// The first call to [`ScrollPages::next_page`] issues the search, later calls
/// follow the scroll handle. The sequence ends at the first empty page and
/// cannot be restarted; build a new one to re-run the query.
pub struct ScrollPages<'a, B: SearchBackend + ?Sized> {
    backend: &'a B,
    query: &'a QueryDocument,
    settings: &'a ScrollSettings,
    state: ScrollState,
    pages_fetched: usize,
    requests: usize,
}

impl<'a, B: SearchBackend + ?Sized> ScrollPages<'a, B> {
    pub fn new(backend: &'a B, query: &'a QueryDocument, settings: &'a ScrollSettings) -> Self {
        Self {
            backend,
            query,
            settings,
            state: ScrollState::NotStarted,
            pages_fetched: 0,
            requests: 0,
        }
    }

    /// Next non-empty page, or `None` once the backend returns an empty one.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Record>>> {
        let page = match &self.state {
            ScrollState::Exhausted => return Ok(None),
            ScrollState::NotStarted => {
                tracing::debug!(
                    "🔎 Opening scroll on '{}' (size {}, lease {:?})",
                    self.settings.index,
                    self.settings.page_size,
                    self.settings.lease
                );
                self.requests += 1;
                self.backend
                    .search(
                        &self.settings.index,
                        self.query,
                        self.settings.page_size,
                        self.settings.lease,
                    )
                    .await?
            }
            ScrollState::Open { scroll_id } => {
                self.requests += 1;
                self.backend.scroll(scroll_id, self.settings.lease).await?
            }
        };

        if page.is_empty() {
            tracing::debug!("🔎 Scroll exhausted after {} requests", self.requests);
            self.state = ScrollState::Exhausted;
            return Ok(None);
        }

        self.pages_fetched += 1;
        tracing::debug!(
            "🔎 Page {}: {} hits",
            self.pages_fetched,
            page.len()
        );
        self.state = ScrollState::Open {
            scroll_id: page.scroll_id,
        };
        Ok(Some(page.hits))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ScrollState::Exhausted)
    }

    /// Requests issued so far, including the one that returned the empty page.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

/// Drains every page of `query` into one batch, in arrival order.
///
/// Any backend failure aborts the scroll and the records gathered so far are dropped.
pub async fn fetch_all<B: SearchBackend + ?Sized>(
    backend: &B,
    query: &QueryDocument,
    settings: &ScrollSettings,
) -> Result<Vec<Record>> {
    let mut pages = ScrollPages::new(backend, query, settings);
    let mut records = Vec::new();

    while let Some(hits) = pages.next_page().await? {
        records.extend(hits);
    }

    tracing::info!(
        "📥 Fetched {} records from '{}' in {} requests",
        records.len(),
        settings.index,
        pages.requests()
    );
    Ok(records)
}
