use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::html::parse_fragment;
use crate::search::SearchReport;
use crate::Result;

pub const ERROR_CLASS: &str = "search-error";

// Replaces the contents of the container with the rendered report: one
// paragraph per result in report order, or the no-results message when the
// report is empty. Pages dropped from the round are named in one trailing
// paragraph so partial results are never mistaken for complete ones.
pub fn render_report(dom: &mut Dom, container: NodeId, report: &SearchReport) -> Result<()> {
    dom.set_text_content(container, "")?;

    if report.is_empty() {
        let p = dom.create_element(container, "p", HashMap::new());
        dom.create_text(p, format!("No results found for: {}", report.query));
    } else {
        for result in &report.results {
            let markup = format!(
                "<p><strong>Result from {}:</strong> {}</p>",
                result.page, result.snippet
            );
            match parse_fragment(&markup) {
                Ok(fragment) => dom.append_fragment(container, &fragment)?,
                // A snippet the fragment grammar cannot recover is shown as
                // plain text rather than aborting the whole report.
                Err(_) => {
                    let p = dom.create_element(container, "p", HashMap::new());
                    let strong = dom.create_element(p, "strong", HashMap::new());
                    dom.create_text(strong, format!("Result from {}:", result.page));
                    dom.create_text(p, format!(" {}", result.snippet));
                }
            }
        }
    }

    if !report.failures.is_empty() {
        let pages: Vec<&str> = report
            .failures
            .iter()
            .map(|failure| failure.page.as_str())
            .collect();
        let p = dom.create_element(container, "p", HashMap::new());
        dom.class_add(p, ERROR_CLASS)?;
        dom.create_text(
            p,
            format!("Some pages were unreachable: {}", pages.join(", ")),
        );
    }

    Ok(())
}
