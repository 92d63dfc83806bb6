// src/metadata/document.rs
// =============================================================================
// This module turns a fetched page into something we can query.
//
// We use the `scraper` crate, which sits on html5ever (the browser-grade HTML
// parser). html5ever never gives up on bad markup: unclosed tags, stray end
// tags and garbage all end up as *some* tree. That's exactly what we want for
// pages we don't control.
//
// The rest of the pipeline only needs three questions answered, so that's
// all Document exposes:
// - first_attr: "what's attribute X of the first <tag> matching this filter?"
// - first_text: "what's the text of the first <tag>?"
// - for_each_element: "walk the elements in order, I'll say when to stop"
// =============================================================================

use std::ops::ControlFlow;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::{ExtractError, Result};

/// How an element's attributes have to look to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrFilter<'a> {
    /// Every element of the tag matches
    Any,
    /// `name` is present and exactly equal to the value
    Equals(&'a str, &'a str),
    /// Like Equals, ignoring ASCII case of the value
    EqualsIgnoreCase(&'a str, &'a str),
    /// `name` is present and contains the substring
    Contains(&'a str, &'a str),
}

impl AttrFilter<'_> {
    fn matches(&self, element: &Element<'_>) -> bool {
        match *self {
            AttrFilter::Any => true,
            AttrFilter::Equals(name, value) => element.attr(name) == Some(value),
            AttrFilter::EqualsIgnoreCase(name, value) => element
                .attr(name)
                .is_some_and(|v| v.eq_ignore_ascii_case(value)),
            AttrFilter::Contains(name, needle) => {
                element.attr(name).is_some_and(|v| v.contains(needle))
            }
        }
    }
}

/// A read-only view of one element.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub fn tag(&self) -> &'a str {
        self.inner.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    /// All text in the subtree, concatenated as-is
    pub fn text(&self) -> String {
        self.inner.text().collect()
    }
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses raw text into a document.
    ///
    /// Malformed markup is fine. The only failure is ending up without any
    /// root element at all, which html5ever doesn't normally produce.
    pub fn parse(raw: &str) -> Result<Document> {
        let html = Html::parse_document(raw);

        if !html.errors.is_empty() {
            debug!(recovered = html.errors.len(), "document parsed with markup errors");
        }

        let document = Document { html };
        if document.root().is_none() {
            return Err(ExtractError::ParseFailure {
                message: "document has no root element".to_string(),
            });
        }
        Ok(document)
    }

    fn root(&self) -> Option<ElementRef<'_>> {
        self.html.tree.root().children().find_map(ElementRef::wrap)
    }

    // Elements with the given tag, in document order.
    //
    // Selecting from the root element walks the tree depth-first, which is
    // the order a reader sees the markup in.
    fn elements_by_tag<'a>(&'a self, tag: &str) -> Vec<Element<'a>> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        let selector = match Selector::parse(tag) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(tag, error = ?e, "invalid tag selector");
                return Vec::new();
            }
        };

        let mut found = Vec::new();
        // The root itself isn't included by select()
        if root.value().name() == tag {
            found.push(Element { inner: root });
        }
        found.extend(root.select(&selector).map(|inner| Element { inner }));
        found
    }

    /// Attribute `attr` of the first `<tag>` that passes `filter`.
    ///
    /// Mirrors what a selector engine returns for "first match, then read
    /// the attribute": if the first matching element lacks `attr`, the
    /// answer is None even when a later element has it.
    pub fn first_attr(&self, tag: &str, filter: AttrFilter<'_>, attr: &str) -> Option<String> {
        self.elements_by_tag(tag)
            .into_iter()
            .find(|el| filter.matches(el))
            .and_then(|el| el.attr(attr).map(str::to_string))
    }

    /// Text content of the first `<tag>`.
    pub fn first_text(&self, tag: &str) -> Option<String> {
        self.elements_by_tag(tag).first().map(Element::text)
    }

    /// Visits every element accepted by `predicate`, in document order,
    /// until `visitor` breaks.
    pub fn for_each_element<'a, P, V, B>(&'a self, mut predicate: P, mut visitor: V) -> Option<B>
    where
        P: FnMut(&Element<'a>) -> bool,
        V: FnMut(Element<'a>) -> ControlFlow<B>,
    {
        let root = self.root()?;
        for node in root.descendants() {
            let Some(inner) = ElementRef::wrap(node) else {
                continue;
            };
            let element = Element { inner };
            if !predicate(&element) {
                continue;
            }
            if let ControlFlow::Break(value) = visitor(element) {
                return Some(value);
            }
        }
        None
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is an ElementRef?
//    - scraper stores the page as a tree of nodes (elements, text, comments)
//    - ElementRef is a borrowed handle to one element node in that tree
//    - ElementRef::wrap(node) returns None for non-element nodes (text etc.)
//
// 2. Why wrap ElementRef in our own Element type?
//    - The rest of the crate only needs tag(), attr() and text()
//    - Keeping scraper types inside this file means swapping parsers later
//      only touches this file
//
// 3. What do the lifetimes ('a) mean here?
//    - An Element borrows from the Document it came from
//    - `Element<'a>` can't outlive the `&'a Document`, so the compiler
//      stops us from using an element after the page is dropped
//
// 4. Why select from the root element instead of Html::select?
//    - Walking from the root is a depth-first traversal: document order
//    - "First <img> on the page" has to mean first as written in the markup
//
// 5. Why is Selector::parse handled instead of unwrapped?
//    - Tag names are constants, so it never fails in practice
//    - Logging and returning nothing keeps the "never panic on a page" rule
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attr_exact_match() {
        let doc = Document::parse(
            r#"<head>
                <meta name="description" content="desc">
                <meta property="og:title" content="First">
                <meta property="og:title" content="Second">
            </head>"#,
        )
        .unwrap();

        let title = doc.first_attr("meta", AttrFilter::Equals("property", "og:title"), "content");
        assert_eq!(title.as_deref(), Some("First"));
    }

    #[test]
    fn test_first_attr_first_match_without_attribute() {
        let doc = Document::parse(
            r#"<meta property="og:image"><meta property="og:image" content="b.png">"#,
        )
        .unwrap();

        let image = doc.first_attr("meta", AttrFilter::Equals("property", "og:image"), "content");
        assert_eq!(image, None);
    }

    #[test]
    fn test_first_attr_ignore_case() {
        let doc = Document::parse(r#"<meta name="DC.Title" content="Dublin">"#).unwrap();
        let title = doc.first_attr(
            "meta",
            AttrFilter::EqualsIgnoreCase("name", "dc.title"),
            "content",
        );
        assert_eq!(title.as_deref(), Some("Dublin"));
    }

    #[test]
    fn test_first_attr_contains() {
        let doc = Document::parse(r#"<link rel="shortcut icon" href="/favicon.ico">"#).unwrap();
        let href = doc.first_attr("link", AttrFilter::Contains("rel", "icon"), "href");
        assert_eq!(href.as_deref(), Some("/favicon.ico"));
    }

    #[test]
    fn test_first_text_collects_subtree() {
        let doc = Document::parse("<body><h1>Hello <em>there</em></h1><h1>Later</h1></body>").unwrap();
        assert_eq!(doc.first_text("h1").as_deref(), Some("Hello there"));
        assert_eq!(doc.first_text("h2"), None);
    }

    #[test]
    fn test_for_each_element_stops_early() {
        let doc = Document::parse(r#"<p id="a"></p><p id="b"></p><p id="c"></p>"#).unwrap();

        let mut seen = Vec::new();
        let stopped_at = doc.for_each_element(
            |el| el.tag() == "p",
            |el| {
                let id = el.attr("id").unwrap_or_default();
                seen.push(id.to_string());
                if id == "b" {
                    ControlFlow::Break(id.to_string())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );

        assert_eq!(stopped_at.as_deref(), Some("b"));
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_markup_still_parses() {
        let doc = Document::parse("<html><head><title>Broken</title><body><div><p>unclosed <b><i>mis</b>nested</i> <img src=x.png>").unwrap();
        assert!(doc.first_text("title").is_some());
        assert_eq!(
            doc.first_attr("img", AttrFilter::Any, "src").as_deref(),
            Some("x.png")
        );
    }

    #[test]
    fn test_non_html_body_parses_to_empty_tree() {
        let doc = Document::parse("{\"json\": true}").unwrap();
        assert_eq!(doc.first_text("title"), None);
        assert_eq!(doc.first_attr("meta", AttrFilter::Any, "content"), None);
    }
}
