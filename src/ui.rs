use crate::dom::{Dom, NodeId};
use crate::Result;

// Viewport width at or below which the site behaves as mobile.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

pub const ACTIVE_CLASS: &str = "active";

pub fn toggle_menu(dom: &mut Dom, nav: NodeId) -> Result<bool> {
    dom.class_toggle(nav, ACTIVE_CLASS)
}

// Above the breakpoint the search bar is always visible, so the call leaves
// the tree alone and returns None.
pub fn toggle_search_bar(
    dom: &mut Dom,
    container: NodeId,
    viewport_width: u32,
) -> Result<Option<bool>> {
    if viewport_width > MOBILE_BREAKPOINT_PX {
        return Ok(None);
    }
    dom.class_toggle(container, ACTIVE_CLASS).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_document;

    #[test]
    fn menu_toggle_round_trips() -> Result<()> {
        let mut dom = parse_document("<nav><ul id=\"menu\"><li>Home</li></ul></nav>")?;
        let menu = dom.by_id("menu").unwrap();

        assert!(toggle_menu(&mut dom, menu)?);
        assert!(dom.class_contains(menu, ACTIVE_CLASS)?);
        assert!(!toggle_menu(&mut dom, menu)?);
        assert!(!dom.class_contains(menu, ACTIVE_CLASS)?);
        Ok(())
    }

    #[test]
    fn search_bar_ignores_desktop_viewports() -> Result<()> {
        let mut dom = parse_document("<div class=\"search-container\"></div>")?;
        let bar = dom.first_with_class(dom.root(), "search-container").unwrap();

        assert_eq!(toggle_search_bar(&mut dom, bar, 1024)?, None);
        assert!(!dom.class_contains(bar, ACTIVE_CLASS)?);
        Ok(())
    }

    #[test]
    fn search_bar_toggles_at_and_below_the_breakpoint() -> Result<()> {
        let mut dom =
            parse_document("<div id=\"bar\" class=\"search-container\"></div>")?;
        let bar = dom.by_id("bar").unwrap();

        assert_eq!(toggle_search_bar(&mut dom, bar, MOBILE_BREAKPOINT_PX)?, Some(true));
        assert!(dom.class_contains(bar, "search-container")?);
        assert!(dom.class_contains(bar, ACTIVE_CLASS)?);
        assert_eq!(toggle_search_bar(&mut dom, bar, 500)?, Some(false));
        assert!(!dom.class_contains(bar, ACTIVE_CLASS)?);
        Ok(())
    }

    #[test]
    fn toggling_a_text_node_is_an_error() -> Result<()> {
        let mut dom = parse_document("<p>just text</p>")?;
        let p = dom.elements_by_tag_names(dom.root(), &["p"])[0];
        let leaf = dom.children(p)[0];
        assert!(toggle_menu(&mut dom, leaf).is_err());
        Ok(())
    }
}
