use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use site_search::{
    parse_document, render_report, CrossPageSearch, Error, InMemoryFetcher, PageFetcher, Result,
    DEFAULT_PAGES, ERROR_CLASS,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn site_fetcher() -> InMemoryFetcher {
    let mut fetcher = InMemoryFetcher::new();
    fetcher.insert(
        "index.html",
        "<h1>Welcome</h1><h2>What we do</h2><p>We design and host static sites.</p>",
    );
    fetcher.insert(
        "services.html",
        "<h2>Our Services</h2><p>Hosting, design, and migration services.</p>",
    );
    fetcher.insert(
        "about.html",
        "<h2>About us</h2><p>A small team that loves the web.</p>",
    );
    fetcher.insert(
        "contact.html",
        "<h2>Contact</h2><p>Write to hello@example.com.</p>",
    );
    fetcher
}

// Serves each page after its configured delay, so completion order can be
// forced to disagree with the page list.
struct StaggeredFetcher {
    pages: HashMap<String, (Duration, String)>,
}

impl StaggeredFetcher {
    fn new(pages: &[(&str, Duration, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(page, delay, markup)| {
                    (page.to_string(), (*delay, markup.to_string()))
                })
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for StaggeredFetcher {
    async fn fetch(&self, page: &str) -> Result<String> {
        match self.pages.get(page) {
            Some((delay, markup)) => {
                tokio::time::sleep(*delay).await;
                Ok(markup.clone())
            }
            None => Err(Error::Fetch {
                page: page.to_string(),
                message: "page not registered".to_string(),
            }),
        }
    }
}

// Fetcher whose task dies outright, to exercise join-failure containment.
struct PanickingFetcher;

#[async_trait]
impl PageFetcher for PanickingFetcher {
    async fn fetch(&self, page: &str) -> Result<String> {
        if page == "boom.html" {
            panic!("fetcher died");
        }
        Ok("<p>survivor page</p>".to_string())
    }
}

#[tokio::test]
async fn results_follow_the_page_list_not_completion_order() -> Result<()> {
    init_logs();
    // The first page in the list finishes last.
    let fetcher = StaggeredFetcher::new(&[
        ("index.html", Duration::from_millis(60), "<p>shared term one</p>"),
        ("services.html", Duration::from_millis(30), "<p>shared term two</p>"),
        ("about.html", Duration::from_millis(0), "<p>shared term three</p>"),
    ]);
    let engine =
        CrossPageSearch::with_pages(fetcher, &["index.html", "services.html", "about.html"]);

    let report = engine.search("shared term").await?;
    let pages: Vec<&str> = report.results.iter().map(|r| r.page.as_str()).collect();
    assert_eq!(pages, ["index.html", "services.html", "about.html"]);
    assert!(report.failures.is_empty());
    Ok(())
}

#[tokio::test]
async fn hung_fetch_is_bounded_by_the_configured_timeout() -> Result<()> {
    init_logs();
    let fetcher = StaggeredFetcher::new(&[
        ("fast.html", Duration::from_millis(0), "<p>needle here</p>"),
        ("hung.html", Duration::from_secs(30), "<p>needle never seen</p>"),
    ]);
    let mut engine = CrossPageSearch::with_pages(fetcher, &["fast.html", "hung.html"]);
    engine.set_fetch_timeout(Duration::from_millis(40))?;

    let report = engine.search("needle").await?;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].page, "fast.html");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, "hung.html");
    assert!(
        report.failures[0].message.contains("timed out"),
        "unexpected failure message: {}",
        report.failures[0].message
    );
    Ok(())
}

#[tokio::test]
async fn a_dead_fetch_task_is_contained() -> Result<()> {
    init_logs();
    let engine =
        CrossPageSearch::with_pages(PanickingFetcher, &["boom.html", "steady.html"]);

    let report = engine.search("survivor").await?;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].page, "steady.html");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, "boom.html");
    assert!(report.failures[0].message.contains("fetch task failed"));
    Ok(())
}

#[tokio::test]
async fn matches_aggregate_across_pages_in_order() -> Result<()> {
    init_logs();
    let engine = CrossPageSearch::new(site_fetcher());
    let configured: Vec<&str> = engine.pages().iter().map(String::as_str).collect();
    assert_eq!(configured, DEFAULT_PAGES);

    let report = engine.search("design").await?;
    let pages: Vec<&str> = report.results.iter().map(|r| r.page.as_str()).collect();
    assert_eq!(pages, ["index.html", "services.html"]);
    assert_eq!(
        report.results[0].snippet,
        "We <span class=\"highlight\">design</span> and host static sites."
    );
    Ok(())
}

#[tokio::test]
async fn search_and_render_end_to_end() -> Result<()> {
    init_logs();
    let engine = CrossPageSearch::new(site_fetcher());
    let report = engine.search("  Services ").await?;

    let mut dom = parse_document("<div id=\"search-results\"></div>")?;
    let container = dom.by_id("search-results").unwrap();
    render_report(&mut dom, container, &report)?;

    assert_eq!(
        dom.inner_html(container)?,
        "<p><strong>Result from services.html:</strong> Our <span class=\"highlight\">Services</span></p>\
         <p><strong>Result from services.html:</strong> Hosting, design, and migration <span class=\"highlight\">services</span>.</p>"
    );
    Ok(())
}

#[tokio::test]
async fn entity_text_survives_search_and_render() -> Result<()> {
    init_logs();
    let mut fetcher = InMemoryFetcher::new();
    fetcher.insert(
        "pricing.html",
        "<h2>Pricing</h2><p>plans cost &lt; $50 with hosting included</p>",
    );
    let engine = CrossPageSearch::with_pages(fetcher, &["pricing.html"]);
    let report = engine.search("hosting").await?;
    assert_eq!(
        report.results[0].snippet,
        "plans cost &lt; $50 with <span class=\"highlight\">hosting</span> included"
    );

    let mut dom = parse_document("<div id=\"search-results\"></div>")?;
    let container = dom.by_id("search-results").unwrap();
    render_report(&mut dom, container, &report)?;
    assert_eq!(
        dom.text_content(container),
        "Result from pricing.html: plans cost < $50 with hosting included"
    );
    Ok(())
}

#[tokio::test]
async fn query_hitting_inline_markup_still_renders() -> Result<()> {
    init_logs();
    // A one-letter query lands inside the <a> start tag of the snippet
    // markup; rendering must tolerate the mangled fragment.
    let mut fetcher = InMemoryFetcher::new();
    fetcher.insert(
        "index.html",
        "<p>Read our <a href=\"/about.html\">about page</a> today</p>",
    );
    let engine = CrossPageSearch::with_pages(fetcher, &["index.html"]);
    let report = engine.search("a").await?;
    assert_eq!(report.results.len(), 1);
    assert!(report.failures.is_empty());

    let mut dom = parse_document("<div id=\"search-results\"></div>")?;
    let container = dom.by_id("search-results").unwrap();
    render_report(&mut dom, container, &report)?;
    assert!(dom.text_content(container).contains("Result from index.html:"));
    Ok(())
}

#[tokio::test]
async fn no_results_renders_the_exact_message() -> Result<()> {
    init_logs();
    let engine = CrossPageSearch::new(site_fetcher());
    let report = engine.search("zebra").await?;
    assert!(report.is_empty());

    let mut dom = parse_document("<div id=\"search-results\"></div>")?;
    let container = dom.by_id("search-results").unwrap();
    render_report(&mut dom, container, &report)?;

    assert_eq!(dom.text_content(container), "No results found for: zebra");
    Ok(())
}

#[tokio::test]
async fn unreachable_pages_are_flagged_in_the_rendering() -> Result<()> {
    init_logs();
    let mut fetcher = InMemoryFetcher::new();
    fetcher.insert("index.html", "<p>the term lives here</p>");
    let engine = CrossPageSearch::with_pages(fetcher, &["index.html", "offline.html"]);
    let report = engine.search("term").await?;

    let mut dom = parse_document("<div id=\"search-results\"></div>")?;
    let container = dom.by_id("search-results").unwrap();
    render_report(&mut dom, container, &report)?;

    let children = dom.children(container).to_vec();
    assert_eq!(children.len(), 2);
    assert!(dom.class_contains(children[1], ERROR_CLASS)?);
    assert_eq!(
        dom.text_content(children[1]),
        "Some pages were unreachable: offline.html"
    );
    Ok(())
}
