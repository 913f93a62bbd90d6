use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::fetch::PageFetcher;
use crate::highlight::{canonical_query, highlight_markup};
use crate::html::parse_document;
use crate::{Error, Result};

pub const DEFAULT_PAGES: [&str; 4] = [
    "index.html",
    "services.html",
    "about.html",
    "contact.html",
];

// Element kinds scanned for matches on every page.
const SEARCHED_TAGS: [&str; 2] = ["h2", "p"];

// One matching element: the page it came from and its inner markup with
// highlight spans inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub page: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: String,
    pub message: String,
}

// Outcome of one search round, rebuilt from scratch on every call. Results
// are in page-list order, then document order within a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub failures: Vec<PageFailure>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

pub struct CrossPageSearch<F> {
    fetcher: Arc<F>,
    pages: Vec<String>,
    fetch_timeout: Option<Duration>,
}

impl<F> CrossPageSearch<F>
where
    F: PageFetcher + 'static,
{
    pub fn new(fetcher: F) -> Self {
        Self::with_pages(fetcher, &DEFAULT_PAGES)
    }

    pub fn with_pages(fetcher: F, pages: &[&str]) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            pages: pages.iter().map(|page| page.to_string()).collect(),
            fetch_timeout: None,
        }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    // Bounds every page fetch of a round. Unset by default.
    pub fn set_fetch_timeout(&mut self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::Search(
                "set_fetch_timeout requires a non-zero duration".into(),
            ));
        }
        self.fetch_timeout = Some(timeout);
        Ok(())
    }

    // One search round: fetch every page concurrently, wait for all of
    // them, then scan in page-list order. A page that cannot be fetched or
    // parsed is reported and skipped, never aborting the rest. An empty
    // canonical query still performs the fetch round and reports zero
    // matches.
    pub async fn search(&self, raw_query: &str) -> Result<SearchReport> {
        let query = canonical_query(raw_query);
        debug!(
            "cross-page search for {query:?} across {} page(s)",
            self.pages.len()
        );

        let mut handles = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let fetcher = Arc::clone(&self.fetcher);
            let fetch_timeout = self.fetch_timeout;
            let task_page = page.clone();
            let handle = tokio::spawn(async move {
                match fetch_timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, fetcher.fetch(&task_page)).await {
                            Ok(outcome) => outcome,
                            Err(_) => Err(Error::Fetch {
                                page: task_page.clone(),
                                message: format!(
                                    "fetch timed out after {}ms",
                                    limit.as_millis()
                                ),
                            }),
                        }
                    }
                    None => fetcher.fetch(&task_page).await,
                }
            });
            handles.push((page.clone(), handle));
        }

        // Settle every task before touching results. Awaiting the handles in
        // spawn order keeps the outcomes aligned with the page list no matter
        // which fetch finishes first.
        let mut fetched = Vec::with_capacity(handles.len());
        for (page, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => Err(Error::Fetch {
                    page: page.clone(),
                    message: format!("fetch task failed: {err}"),
                }),
            };
            fetched.push((page, outcome));
        }

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (page, outcome) in fetched {
            let markup = match outcome {
                Ok(markup) => markup,
                Err(err) => {
                    warn!("cross-page search dropped {page}: {err}");
                    failures.push(PageFailure {
                        page,
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            if query.is_empty() {
                continue;
            }
            match scan_page(&page, &markup, &query) {
                Ok(mut page_results) => results.append(&mut page_results),
                Err(err) => {
                    warn!("cross-page search dropped {page}: {err}");
                    failures.push(PageFailure {
                        page,
                        message: err.to_string(),
                    });
                }
            }
        }

        debug!(
            "cross-page search for {query:?} matched {} element(s), {} page failure(s)",
            results.len(),
            failures.len()
        );
        Ok(SearchReport {
            query,
            results,
            failures,
        })
    }
}

fn scan_page(page: &str, markup: &str, query: &str) -> Result<Vec<SearchResult>> {
    let dom = parse_document(markup)?;
    let root = dom.root();
    let mut results = Vec::new();
    for element in dom.elements_by_tag_names(root, &SEARCHED_TAGS) {
        let text = dom.text_content(element);
        if !text.to_lowercase().contains(query) {
            continue;
        }
        let inner = dom.inner_html(element)?;
        let snippet = highlight_markup(&inner, query)?;
        results.push(SearchResult {
            page: page.to_string(),
            snippet,
        });
    }
    Ok(results)
}
