// ABOUTME: DOM query and terminal extraction helpers over scraper element references.
// ABOUTME: Text is whitespace-normalized, markup is the element's outer HTML, attributes are trimmed.

//! Query and extraction primitives.
//!
//! Key behaviors:
//! - Queries search the descendants of a scope element and yield matches in
//!   document order. Only a document-level query also considers the scope.
//! - Text extraction concatenates the element's text nodes and collapses
//!   whitespace runs, so `"  Hello   World  "` becomes `"Hello World"` and
//!   `Hel<b>lo</b>` stays `"Hello"`.
//! - Markup extraction returns the element's serialized outer HTML, tag included.

use scraper::{ElementRef, Selector};

use crate::selectors::definition::SelectorDefinition;

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element: its text nodes concatenated as
/// they appear, then whitespace-collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

/// Text content of an element with one line per non-blank text fragment.
pub fn element_lines(el: ElementRef<'_>) -> String {
    el.text()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// All descendants of `scope` matching `selector`, in document order.
pub fn query<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope.select(selector).collect()
}

/// Like [`query`], but `scope` itself is a candidate too. Used at the top of
/// a document so `html` and `:root` can match the root element.
pub fn query_inclusive<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    let mut found = Vec::new();
    if selector.matches(&scope) {
        found.push(scope);
    }
    found.extend(scope.select(selector));
    found
}

/// How a leaf selector turns a matched element into a string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Capture {
    /// Whitespace-collapsed, trimmed text content.
    #[default]
    Text,
    /// Serialized outer markup.
    Html,
    /// Trimmed value of the named attribute.
    Attr(String),
}

impl Capture {
    /// The capture policy a definition asks for.
    pub fn for_definition(def: &SelectorDefinition) -> Self {
        if def.preserve_html {
            Capture::Html
        } else if let Some(attr) = &def.attr {
            Capture::Attr(attr.clone())
        } else {
            Capture::Text
        }
    }

    /// Extracts from one element. `None` when the element has nothing to give.
    pub fn apply(&self, el: ElementRef<'_>) -> Option<String> {
        let captured = match self {
            Capture::Text => element_text(el),
            Capture::Html => el.html(),
            Capture::Attr(name) => el.value().attr(name)?.trim().to_string(),
        };
        if captured.is_empty() {
            None
        } else {
            Some(captured)
        }
    }
}
