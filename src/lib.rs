use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Dom(String),
    Regex(String),
    Search(String),
    Fetch { page: String, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::Regex(msg) => write!(f, "regex error: {msg}"),
            Self::Search(msg) => write!(f, "search error: {msg}"),
            Self::Fetch { page, message } => write!(f, "failed to fetch {page}: {message}"),
        }
    }
}

impl StdError for Error {}

pub mod dom;
pub mod fetch;
pub mod highlight;
pub mod html;
pub mod matcher;
pub mod render;
pub mod search;
pub mod ui;

pub use dom::{Dom, Element, NodeId};
pub use fetch::{DirFetcher, HttpFetcher, InMemoryFetcher, PageFetcher};
pub use highlight::{
    apply_highlights, canonical_query, clear_highlights, highlight_markup, search_in_page,
    HIGHLIGHT_CLASS,
};
pub use html::{parse_document, parse_fragment};
pub use matcher::Matcher;
pub use render::{render_report, ERROR_CLASS};
pub use search::{
    CrossPageSearch, PageFailure, SearchReport, SearchResult, DEFAULT_PAGES,
};
pub use ui::{toggle_menu, toggle_search_bar, ACTIVE_CLASS, MOBILE_BREAKPOINT_PX};
