// src/metadata/types.rs
// =============================================================================
// Data that flows between the pipeline stages.
//
// ExtractionRequest -> FetchedDocument -> (Document) -> CandidateSet -> ExtractionResult
//
// Only ExtractionResult leaves the pipeline. The others live for one run.
// =============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ExtractError, Result};

/// A validated URL to extract metadata from.
///
/// The only way to get one is `parse`, so holding an ExtractionRequest means
/// the input already passed validation and no network call was needed to
/// find that out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    source: String,
    url: Url,
}

impl ExtractionRequest {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::invalid_input(input, "URL is required"));
        }

        let url = Url::parse(trimmed)
            .map_err(|e| ExtractError::invalid_input(input, e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ExtractError::invalid_input(
                input,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if url.host_str().is_none() {
            return Err(ExtractError::invalid_input(input, "URL has no host"));
        }

        Ok(ExtractionRequest {
            source: trimmed.to_string(),
            url,
        })
    }

    /// The URL as the caller typed it (trimmed). This is what ends up in
    /// `ExtractionResult::url`.
    pub fn source_url(&self) -> &str {
        &self.source
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// The raw response for the source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// URL after following redirects
    pub final_url: String,
    pub status_code: u16,
    /// Raw Content-Type header value, empty when missing
    pub content_type: String,
    pub raw_body: String,
}

impl FetchedDocument {
    /// Content-Type is advisory: this only feeds a log line.
    pub fn looks_like_html(&self) -> bool {
        let ct = self.content_type.to_ascii_lowercase();
        ct.is_empty() || ct.contains("html") || ct.contains("xml")
    }
}

/// What the link-creation handler gets back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    /// Trimmed, possibly empty, never missing
    pub title: String,
    /// Absolute URL, or null when nothing usable was found
    pub image: Option<String>,
}
