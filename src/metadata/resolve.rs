// src/metadata/resolve.rs
// =============================================================================
// This module picks the final title and image out of a CandidateSet.
//
// Titles are easy: first non-empty candidate, trimmed.
//
// Images take one network round trip. The best meta-tag image is only
// trusted after a HEAD request says it exists. If it doesn't (or there was
// no meta image at all) we fall back to the first CSS background image, and
// after that the first <img>. Fallbacks are taken as they are, without
// another HEAD.
// =============================================================================

use tracing::{debug, info, warn};
use url::Url;

use super::candidates::{Candidate, CandidateSet};
use super::fetch::HttpTransport;

/// How the final image was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDecision {
    /// A meta-tag image that answered the HEAD with 2xx
    Verified(String),
    /// The first inline CSS background image
    CssFallback(String),
    /// The first <img> on the page
    ImgFallback(String),
    /// Nothing usable anywhere
    None,
}

impl ImageDecision {
    pub fn into_url(self) -> Option<String> {
        match self {
            ImageDecision::Verified(url)
            | ImageDecision::CssFallback(url)
            | ImageDecision::ImgFallback(url) => Some(url),
            ImageDecision::None => None,
        }
    }
}

/// The one reducer every tier list goes through: the first candidate
/// that isn't blank.
pub fn first_non_empty(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().find(|c| !c.is_empty())
}

pub fn resolve_title(set: &CandidateSet) -> String {
    first_non_empty(&set.titles)
        .map(|c| c.value.trim().to_string())
        .unwrap_or_default()
}

/// Picks the preview image for a page.
///
/// `page_url` is the URL the caller asked for; relative candidates are
/// resolved against it, not against wherever redirects ended up.
pub async fn resolve_image(
    set: &CandidateSet,
    page_url: &str,
    transport: &dyn HttpTransport,
) -> ImageDecision {
    if let Some(candidate) = first_non_empty(&set.images) {
        let image = absolutize(candidate.value.trim(), page_url);
        debug!(source = ?candidate.source, raw = %candidate.value, %image, "checking meta image");

        if is_reachable(transport, &image).await {
            info!(%image, "meta image is reachable");
            return ImageDecision::Verified(image);
        }
        warn!(%image, "meta image not reachable, trying fallbacks");
    } else {
        debug!(page = page_url, "no meta image, trying fallbacks");
    }

    if let Some(image) = usable_fallback(&set.css_background, page_url) {
        debug!(%image, "using CSS background image");
        return ImageDecision::CssFallback(image);
    }

    if let Some(image) = usable_fallback(&set.first_img, page_url) {
        debug!(%image, "using first <img>");
        return ImageDecision::ImgFallback(image);
    }

    debug!(page = page_url, "no image found");
    ImageDecision::None
}

// Any 2xx counts. Network errors and timeouts are treated the same as a
// 404: the image isn't usable.
async fn is_reachable(transport: &dyn HttpTransport, image: &str) -> bool {
    match transport.head(image).await {
        Ok(status) => {
            debug!(%image, status, "image HEAD");
            (200..300).contains(&status)
        }
        Err(e) => {
            debug!(%image, error = %e, "image HEAD failed");
            false
        }
    }
}

fn usable_fallback(candidate: &Candidate, page_url: &str) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    let image = absolutize(candidate.value.trim(), page_url);
    match Url::parse(&image) {
        Ok(url) if url.has_host() => Some(image),
        _ => {
            debug!(raw = %candidate.value, "fallback image is not a usable URL");
            None
        }
    }
}

/// Makes an image reference absolute, relative to the page it was found on.
///
/// - `http://...` / `https://...` stay as they are
/// - `//cdn/x.png` gets the page's scheme
/// - `/x.png` gets the page's origin
/// - `x.png` gets the page's origin plus `/`
///
/// Note that the last case is always relative to the origin, not the page's
/// directory. If the base URL can't be parsed the candidate comes back
/// untouched.
pub fn absolutize(candidate: &str, base: &str) -> String {
    if candidate.is_empty() || has_http_scheme(candidate) {
        return candidate.to_string();
    }

    let Ok(base) = Url::parse(base) else {
        return candidate.to_string();
    };
    // file://host/ has a host but no tuple origin; its origin would
    // serialize as "null"
    if !base.has_host() || !base.origin().is_tuple() {
        return candidate.to_string();
    }

    if candidate.starts_with("//") {
        return format!("{}:{}", base.scheme(), candidate);
    }

    let origin = base.origin().ascii_serialization();
    if candidate.starts_with('/') {
        format!("{}{}", origin, candidate)
    } else {
        format!("{}/{}", origin, candidate)
    }
}

fn has_http_scheme(candidate: &str) -> bool {
    let prefix = |p: &str| {
        candidate
            .get(..p.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(p))
    };
    prefix("http://") || prefix("https://")
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why only one HEAD request?
//    - Only the best meta-tag image is worth checking: sites sometimes point
//      og:image at a file that was deleted long ago
//    - CSS and <img> fallbacks come from the page body itself, so they are
//      trusted as-is
//    - At most two requests per run: the page GET and this HEAD
//
// 2. Why `&dyn HttpTransport` instead of a generic?
//    - The resolver doesn't care which transport it gets
//    - Tests pass a fake that records every HEAD it receives
//
// 3. Why does absolutize return a String instead of Result?
//    - A bad base URL should never sink the whole extraction
//    - Handing back the candidate unchanged is the "do no harm" answer;
//      usable_fallback then drops it if it still isn't a real URL
//
// 4. What is an origin?
//    - scheme + host + port, e.g. "https://site.com" or "http://localhost:8080"
//    - Url::origin() computes it; is_tuple() is false for schemes like file:
//      that have no meaningful origin
//
// 5. Why trim before absolutizing?
//    - Meta content often carries stray whitespace or newlines
//    - " /a.png" would otherwise not start with '/' and end up as
//      "https://site.com/ /a.png"
// -----------------------------------------------------------------------------
