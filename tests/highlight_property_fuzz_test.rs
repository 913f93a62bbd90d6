use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;
use site_search::{
    apply_highlights, clear_highlights, parse_document, search_in_page, HIGHLIGHT_CLASS,
};

fn page_markup(paragraphs: &[String]) -> String {
    let mut out = String::from("<div id=\"content\"><h2>Fuzz page</h2>");
    for paragraph in paragraphs {
        out.push_str("<p>");
        out.push_str(paragraph);
        out.push_str("</p>");
    }
    out.push_str("</div>");
    out
}

fn assert_round_trip(paragraphs: &[String], query: &str) -> TestCaseResult {
    let markup = page_markup(paragraphs);
    let mut dom = parse_document(&markup).expect("generated markup parses");
    let root = dom.root();
    let original_text = dom.text_content(root);

    apply_highlights(&mut dom, root, query).expect("apply succeeds");
    prop_assert_eq!(
        dom.text_content(root),
        original_text.clone(),
        "wrapping must not change the text"
    );

    clear_highlights(&mut dom, root).expect("clear succeeds");
    prop_assert_eq!(
        dom.text_content(root),
        original_text,
        "stripping markers must restore the text"
    );
    prop_assert_eq!(dom.elements_with_class(root, HIGHLIGHT_CLASS).len(), 0);
    Ok(())
}

fn assert_marker_count_matches_naive_scan(paragraphs: &[String], query: &str) -> TestCaseResult {
    let markup = page_markup(paragraphs);
    let mut dom = parse_document(&markup).expect("generated markup parses");
    let root = dom.root();

    // Disjoint left-to-right occurrences per leaf, the count the wrapped
    // markers must reproduce. The generated alphabet is ASCII, so folding
    // both sides with to_lowercase matches the engine's case-insensitivity.
    let expected: usize = dom
        .text_leaves_in(root)
        .iter()
        .filter_map(|leaf| dom.text(*leaf))
        .map(|text| text.to_lowercase().matches(query).count())
        .sum();

    apply_highlights(&mut dom, root, query).expect("apply succeeds");
    let markers = dom.elements_with_class(root, HIGHLIGHT_CLASS);
    prop_assert_eq!(markers.len(), expected);
    for marker in markers {
        prop_assert_eq!(dom.text_content(marker).to_lowercase(), query.to_string());
    }
    Ok(())
}

fn assert_repeated_search_is_stable(paragraphs: &[String], query: &str) -> TestCaseResult {
    let markup = page_markup(paragraphs);
    let mut dom = parse_document(&markup).expect("generated markup parses");
    let root = dom.root();

    search_in_page(&mut dom, root, query).expect("first search succeeds");
    let markers_after_first = dom.elements_with_class(root, HIGHLIGHT_CLASS).len();
    let text_after_first = dom.text_content(root);

    search_in_page(&mut dom, root, query).expect("second search succeeds");
    prop_assert_eq!(
        dom.elements_with_class(root, HIGHLIGHT_CLASS).len(),
        markers_after_first,
        "a repeated search must not accumulate markers"
    );
    prop_assert_eq!(dom.text_content(root), text_after_first);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn stripping_markers_restores_the_original_text(
        paragraphs in vec("[a-dA-D !.]{0,24}", 1..=6),
        query in "[a-d]{1,3}",
    ) {
        assert_round_trip(&paragraphs, &query)?;
    }

    #[test]
    fn marker_count_matches_a_naive_scan(
        paragraphs in vec("[a-dA-D !.]{0,24}", 1..=6),
        query in "[a-d]{1,3}",
    ) {
        assert_marker_count_matches_naive_scan(&paragraphs, &query)?;
    }

    #[test]
    fn repeated_searches_are_stable(
        paragraphs in vec("[a-dA-D !.]{0,24}", 1..=6),
        query in "[a-d]{1,3}",
    ) {
        assert_repeated_search_is_stable(&paragraphs, &query)?;
    }
}
