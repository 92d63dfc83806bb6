// src/metadata/candidates.rs
// =============================================================================
// This module decides *where* to look for a title and a preview image.
//
// Every place we look is a "tier". The tier tables below are the whole
// priority order: earlier entries beat later ones. Reordering a row here
// changes which title/image a page gets, so the tests pin the order down.
//
// Nothing here touches the network and nothing here can fail. A tag that
// isn't there just produces an empty candidate.
// =============================================================================

use std::ops::ControlFlow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::document::{AttrFilter, Document};

/// Where a candidate value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    // Titles
    OgTitle,
    TwitterTitle,
    ItempropName,
    MetaTitle,
    DublinCoreTitle,
    DocumentTitle,
    FirstHeading,

    // Images
    OgImage,
    OgImageSecureUrl,
    TwitterImage,
    TwitterImageSrc,
    LinkImageSrc,
    ThumbnailUrl,
    ItempropImage,
    MsTileImage,
    CssBackground,
    FirstImg,
}

/// A raw value from one document location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub value: String,
    pub source: CandidateSource,
}

impl Candidate {
    fn new(source: CandidateSource, value: Option<String>) -> Self {
        Candidate {
            value: value.unwrap_or_default(),
            source,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Everything the resolver gets to choose from.
///
/// `titles` and `images` always hold one entry per tier, in priority order,
/// even when the entry is empty. The two image fallbacks are kept apart
/// because they are only consulted after the meta tiers come up short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub titles: Vec<Candidate>,
    pub images: Vec<Candidate>,
    pub css_background: Candidate,
    pub first_img: Candidate,
}

// One location of the form <tag filter... attr="value">
struct Lookup {
    tag: &'static str,
    filter: AttrFilter<'static>,
    attr: &'static str,
}

const fn meta(key: &'static str, value: &'static str) -> Lookup {
    Lookup {
        tag: "meta",
        filter: AttrFilter::Equals(key, value),
        attr: "content",
    }
}

// Title tiers, highest priority first. <title> and <h1> are text lookups
// and are appended after these in `extract_titles`.
const TITLE_META_TIERS: &[(CandidateSource, Lookup)] = &[
    (CandidateSource::OgTitle, meta("property", "og:title")),
    (CandidateSource::TwitterTitle, meta("name", "twitter:title")),
    (CandidateSource::ItempropName, meta("itemprop", "name")),
    (CandidateSource::MetaTitle, meta("name", "title")),
    (
        CandidateSource::DublinCoreTitle,
        Lookup {
            tag: "meta",
            filter: AttrFilter::EqualsIgnoreCase("name", "dc.title"),
            attr: "content",
        },
    ),
];

// Image tiers, highest priority first. A tier may list several lookups;
// within a tier the first non-empty lookup wins.
const IMAGE_TIERS: &[(CandidateSource, &[Lookup])] = &[
    (CandidateSource::OgImage, &[meta("property", "og:image")]),
    (
        CandidateSource::OgImageSecureUrl,
        &[meta("property", "og:image:secure_url")],
    ),
    (CandidateSource::TwitterImage, &[meta("name", "twitter:image")]),
    (
        CandidateSource::TwitterImageSrc,
        &[meta("name", "twitter:image:src")],
    ),
    (
        CandidateSource::LinkImageSrc,
        &[Lookup {
            tag: "link",
            filter: AttrFilter::Equals("rel", "image_src"),
            attr: "href",
        }],
    ),
    (
        CandidateSource::ThumbnailUrl,
        &[
            meta("property", "thumbnailUrl"),
            meta("name", "thumbnailUrl"),
            meta("itemprop", "thumbnailUrl"),
        ],
    ),
    (CandidateSource::ItempropImage, &[meta("itemprop", "image")]),
    (
        CandidateSource::MsTileImage,
        &[meta("name", "msapplication-TileImage")],
    ),
];

// url(...) inside an inline style, with or without quotes
#[allow(clippy::expect_used)]
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")\s]+)['"]?\s*\)"#).expect("CSS_URL regex")
});

/// Builds the full candidate set for a parsed page.
pub fn extract_candidates(document: &Document) -> CandidateSet {
    CandidateSet {
        titles: extract_titles(document),
        images: extract_images(document),
        css_background: Candidate::new(
            CandidateSource::CssBackground,
            css_background_url(document),
        ),
        first_img: Candidate::new(
            CandidateSource::FirstImg,
            document.first_attr("img", AttrFilter::Any, "src"),
        ),
    }
}

fn lookup(document: &Document, lookup: &Lookup) -> Option<String> {
    document.first_attr(lookup.tag, lookup.filter, lookup.attr)
}

fn extract_titles(document: &Document) -> Vec<Candidate> {
    let mut titles: Vec<Candidate> = TITLE_META_TIERS
        .iter()
        .map(|(source, p)| Candidate::new(*source, lookup(document, p)))
        .collect();

    titles.push(Candidate::new(
        CandidateSource::DocumentTitle,
        document.first_text("title"),
    ));
    titles.push(Candidate::new(
        CandidateSource::FirstHeading,
        document.first_text("h1"),
    ));
    titles
}

fn extract_images(document: &Document) -> Vec<Candidate> {
    IMAGE_TIERS
        .iter()
        .map(|(source, lookups)| {
            let value = lookups
                .iter()
                .filter_map(|p| lookup(document, p))
                .find(|v| !v.trim().is_empty());
            Candidate::new(*source, value)
        })
        .collect()
}

// First url(...) in a style attribute mentioning "background", scanning
// elements in document order. Inline data: URIs are skipped; they can't be
// stored as a link preview.
fn css_background_url(document: &Document) -> Option<String> {
    document.for_each_element(
        |el| el.attr("style").is_some_and(|s| s.contains("background")),
        |el| {
            let style = el.attr("style").unwrap_or_default();
            let found = CSS_URL
                .captures_iter(style)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .find(|url| !url.starts_with("data:"));

            match found {
                Some(url) => ControlFlow::Break(url.to_string()),
                None => ControlFlow::Continue(()),
            }
        },
    )
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why tables instead of a chain of if/else?
//    - The priority order *is* the feature: og:title beats twitter:title
//      beats <title>, and so on
//    - As a `const` slice the order is data you can read top to bottom
//    - The tests can compare the order directly against a list
//
// 2. Why keep empty candidates around?
//    - Every tier always has a slot, so index 0 is always the OG tier
//    - The `candidates` CLI command can show "-" for tiers that were missing
//    - The resolver skips blanks anyway (see first_non_empty)
//
// 3. What is LazyLock?
//    - A static that is built the first time it's used, then reused
//    - Compiling a regex is slow; doing it once per process is enough
//    - .expect() is fine here: the pattern is a constant, if it were broken
//      every test would fail immediately
//
// 4. Why ControlFlow in css_background_url?
//    - for_each_element walks the whole page unless told to stop
//    - ControlFlow::Break(url) means "found it, stop and hand this back"
//    - ControlFlow::Continue(()) means "keep looking"
//
// 5. What does `const fn meta(...)` do?
//    - It's a helper that can run at compile time
//    - That's what lets us call it inside the `const` tier tables
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(html: &str) -> CandidateSet {
        extract_candidates(&Document::parse(html).unwrap())
    }

    fn value(list: &[Candidate], source: CandidateSource) -> &str {
        list.iter()
            .find(|c| c.source == source)
            .map(|c| c.value.as_str())
            .unwrap()
    }

    #[test]
    fn test_title_tier_order() {
        let set = candidates("");
        let order: Vec<_> = set.titles.iter().map(|c| c.source).collect();
        assert_eq!(
            order,
            vec![
                CandidateSource::OgTitle,
                CandidateSource::TwitterTitle,
                CandidateSource::ItempropName,
                CandidateSource::MetaTitle,
                CandidateSource::DublinCoreTitle,
                CandidateSource::DocumentTitle,
                CandidateSource::FirstHeading,
            ]
        );
        assert!(set.titles.iter().all(Candidate::is_empty));
    }

    #[test]
    fn test_image_tier_order() {
        let set = candidates("");
        let order: Vec<_> = set.images.iter().map(|c| c.source).collect();
        assert_eq!(
            order,
            vec![
                CandidateSource::OgImage,
                CandidateSource::OgImageSecureUrl,
                CandidateSource::TwitterImage,
                CandidateSource::TwitterImageSrc,
                CandidateSource::LinkImageSrc,
                CandidateSource::ThumbnailUrl,
                CandidateSource::ItempropImage,
                CandidateSource::MsTileImage,
            ]
        );
        assert!(set.css_background.is_empty());
        assert!(set.first_img.is_empty());
    }

    #[test]
    fn test_every_title_location_is_read() {
        let set = candidates(
            r#"<html><head>
                <meta property="og:title" content="og">
                <meta name="twitter:title" content="tw">
                <meta itemprop="name" content="schema">
                <meta name="title" content="generic">
                <meta name="DC.title" content="dublin">
                <title> doc </title>
            </head><body><h1>heading</h1></body></html>"#,
        );

        assert_eq!(value(&set.titles, CandidateSource::OgTitle), "og");
        assert_eq!(value(&set.titles, CandidateSource::TwitterTitle), "tw");
        assert_eq!(value(&set.titles, CandidateSource::ItempropName), "schema");
        assert_eq!(value(&set.titles, CandidateSource::MetaTitle), "generic");
        assert_eq!(value(&set.titles, CandidateSource::DublinCoreTitle), "dublin");
        // Stored raw, trimming is the resolver's job
        assert_eq!(value(&set.titles, CandidateSource::DocumentTitle), " doc ");
        assert_eq!(value(&set.titles, CandidateSource::FirstHeading), "heading");
    }

    #[test]
    fn test_every_image_location_is_read() {
        let set = candidates(
            r#"<html><head>
                <meta property="og:image" content="/og.png">
                <meta property="og:image:secure_url" content="https://s.example/og.png">
                <meta name="twitter:image" content="tw.png">
                <meta name="twitter:image:src" content="tw-src.png">
                <link rel="image_src" href="/link.png">
                <meta itemprop="thumbnailUrl" content="/thumb.png">
                <meta itemprop="image" content="/schema.png">
                <meta name="msapplication-TileImage" content="/tile.png">
            </head><body>
                <div style="background: url('/bg.jpg') no-repeat"></div>
                <img src="/first.png"><img src="/second.png">
            </body></html>"#,
        );

        assert_eq!(value(&set.images, CandidateSource::OgImage), "/og.png");
        assert_eq!(
            value(&set.images, CandidateSource::OgImageSecureUrl),
            "https://s.example/og.png"
        );
        assert_eq!(value(&set.images, CandidateSource::TwitterImage), "tw.png");
        assert_eq!(value(&set.images, CandidateSource::TwitterImageSrc), "tw-src.png");
        assert_eq!(value(&set.images, CandidateSource::LinkImageSrc), "/link.png");
        assert_eq!(value(&set.images, CandidateSource::ThumbnailUrl), "/thumb.png");
        assert_eq!(value(&set.images, CandidateSource::ItempropImage), "/schema.png");
        assert_eq!(value(&set.images, CandidateSource::MsTileImage), "/tile.png");
        assert_eq!(set.css_background.value, "/bg.jpg");
        assert_eq!(set.first_img.value, "/first.png");
    }

    #[test]
    fn test_thumbnail_variants_in_order() {
        let set = candidates(
            r#"<meta itemprop="thumbnailUrl" content="/itemprop.png">
               <meta name="thumbnailUrl" content="/name.png">"#,
        );
        // name beats itemprop even though itemprop comes first in the markup
        assert_eq!(value(&set.images, CandidateSource::ThumbnailUrl), "/name.png");

        let set = candidates(
            r#"<meta property="thumbnailUrl" content="">
               <meta itemprop="thumbnailUrl" content="/itemprop.png">"#,
        );
        assert_eq!(value(&set.images, CandidateSource::ThumbnailUrl), "/itemprop.png");
    }

    #[test]
    fn test_css_background_scans_in_document_order() {
        let set = candidates(
            r#"<body>
                <div style="color: red"></div>
                <div style="background-color: #fff"></div>
                <section style="background-image: url(&quot;https://cdn.example/hero.jpg&quot;)"></section>
                <div style="background: url(/later.jpg)"></div>
            </body>"#,
        );
        assert_eq!(set.css_background.value, "https://cdn.example/hero.jpg");
    }

    #[test]
    fn test_css_background_skips_data_uri() {
        let set = candidates(
            r#"<div style="background: url(data:image/gif;base64,R0lGOD)"></div>
               <div style="background:url('img/real.png')"></div>"#,
        );
        assert_eq!(set.css_background.value, "img/real.png");
    }

    #[test]
    fn test_missing_attribute_is_empty_candidate() {
        let set = candidates(r#"<meta property="og:title"><img alt="no src">"#);
        assert!(set.titles[0].is_empty());
        assert!(set.first_img.is_empty());
    }
}
