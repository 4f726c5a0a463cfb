pub mod biography;
pub mod candidates;
pub mod races;

use scraper::{ElementRef, Selector};

/// Compile a static CSS selector. Only called from `LazyLock` initializers
/// with literal selectors.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Concatenated, trimmed text content.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Class attribute split into tokens, document order preserved.
pub(crate) fn class_tokens<'a>(el: ElementRef<'a>) -> Vec<&'a str> {
    el.value()
        .attr("class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default()
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    class_tokens(el).contains(&class)
}

/// Direct element children, skipping text and comment nodes.
pub(crate) fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children().filter_map(ElementRef::wrap)
}
