use crate::parsers::{class_contains, element_text, selector};
use crate::session::ElementTarget;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// XPath matching every pagination control on the live page.
///
/// Must select the same elements, in the same order, as [`CONTROLS`] so that a
/// control's position can be used to click it.
pub const CONTROLS_XPATH: &str =
    "//ul[contains(@class, 'list-none')]//li[contains(@class, 'h-8 w-8')]";

static CONTROLS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"ul[class*="list-none"] li[class*="h-8 w-8"]"#));

/// Class marking the page currently shown
pub const ACTIVE_CLASS: &str = "bg-green-700";

/// Highlighted text, only used on the active control
pub const HIGHLIGHT_CLASS: &str = "text-white";

/// Class present on controls that accept clicks
pub const CLICKABLE_CLASS: &str = "cursor-pointer";

/// Class of the trailing arrow icon
pub const ARROW_ICON_CLASS: &str = "ml-2";

/// One entry of the pagination control as rendered at snapshot time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationControl {
    /// 1-based position among all controls
    pub position: usize,
    /// Trimmed text, empty for icon-only controls
    pub label: String,
    pub active: bool,
    pub highlighted: bool,
    pub visible: bool,
    pub clickable: bool,
    /// Holds the trailing "next" arrow icon
    pub has_arrow: bool,
    /// Holds any icon at all
    pub has_icon: bool,
}

impl PaginationControl {
    /// Page number if the label is a plain decimal number
    pub fn page_number(&self) -> Option<u32> {
        if self.label.is_empty() || !self.label.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        self.label.parse().ok()
    }

    /// Locator for this control on the live page
    pub fn target(&self) -> ElementTarget {
        ElementTarget::nth(CONTROLS_XPATH, self.position)
    }
}

/// Snapshot of every pagination control in the markup, in document order
pub fn parse_controls(markup: &str) -> Vec<PaginationControl> {
    let doc = Html::parse_document(markup);

    doc.select(&CONTROLS)
        .enumerate()
        .map(|(index, li)| {
            let icons: Vec<ElementRef> = li
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "svg")
                .collect();

            PaginationControl {
                position: index + 1,
                label: element_text(&li),
                active: class_contains(&li, ACTIVE_CLASS),
                highlighted: class_contains(&li, HIGHLIGHT_CLASS),
                visible: is_visible(&li),
                clickable: class_contains(&li, CLICKABLE_CLASS),
                has_arrow: icons.iter().any(|svg| class_contains(svg, ARROW_ICON_CLASS)),
                has_icon: !icons.is_empty(),
            }
        })
        .collect()
}

/// Display utilities that bring back an element hidden at smaller breakpoints
const DISPLAY_CLASSES: &[&str] =
    &["flex", "block", "inline", "inline-flex", "inline-block", "grid"];

/// Best-effort visibility check from markup alone.
///
/// The live session decides for real; this only seeds the snapshot. A
/// breakpoint variant such as `md:flex` overrides a plain `hidden`, and
/// `md:visible` overrides `invisible`, since the crawl runs at desktop width.
fn is_visible(element: &ElementRef) -> bool {
    let el = element.value();
    if el.attr("hidden").is_some() || el.attr("aria-hidden") == Some("true") {
        return false;
    }

    let classes: Vec<&str> = el.attr("class").unwrap_or_default().split_whitespace().collect();
    if classes.contains(&"hidden") && !has_breakpoint_variant(&classes, DISPLAY_CLASSES) {
        return false;
    }
    if classes.contains(&"invisible") && !has_breakpoint_variant(&classes, &["visible"]) {
        return false;
    }

    let style = el
        .attr("style")
        .map(|s| s.replace(' ', "").to_lowercase())
        .unwrap_or_default();
    !(style.contains("display:none") || style.contains("visibility:hidden"))
}

fn has_breakpoint_variant(classes: &[&str], utilities: &[&str]) -> bool {
    classes
        .iter()
        .filter_map(|class| class.rsplit_once(':'))
        .any(|(_, utility)| utilities.contains(&utility))
}
