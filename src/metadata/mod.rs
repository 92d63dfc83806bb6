// src/metadata/mod.rs
// =============================================================================
// This module contains the metadata extraction pipeline.
//
// Stages, in the order a run goes through them:
// - fetch: GET the page (and later HEAD one image)
// - document: parse whatever came back into a queryable tree
// - candidates: read every known title/image location
// - resolve: pick the winners
//
// MetadataExtractor glues them together. A run never loops back to an
// earlier stage and never shares anything with another run.
// =============================================================================

mod candidates;
mod document;
mod fetch;
mod resolve;
mod types;

pub use candidates::{extract_candidates, Candidate, CandidateSet, CandidateSource};
pub use document::{AttrFilter, Document, Element};
pub use fetch::{HttpTransport, ReqwestTransport};
pub use resolve::{absolutize, first_non_empty, resolve_image, resolve_title, ImageDecision};
pub use types::{ExtractionRequest, ExtractionResult, FetchedDocument};

use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result, TransportCause};

/// Runs the extraction pipeline over a transport.
pub struct MetadataExtractor<T: HttpTransport = ReqwestTransport> {
    config: ExtractorConfig,
    transport: T,
}

impl MetadataExtractor<ReqwestTransport> {
    /// Extractor backed by a real HTTP client.
    pub fn new(config: ExtractorConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(MetadataExtractor { config, transport })
    }
}

impl<T: HttpTransport> MetadataExtractor<T> {
    pub fn with_transport(config: ExtractorConfig, transport: T) -> Self {
        MetadataExtractor { config, transport }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Fetches `url` and works out its title and preview image.
    ///
    /// Fails only for the five fatal kinds in [`crate::ErrorKind`];
    /// everything that goes wrong inside the page just narrows the result.
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult> {
        let request = ExtractionRequest::parse(url)?;
        info!(url = request.source_url(), "extracting metadata");

        let candidates = self.fetch_candidates(&request).await?;

        let title = resolve_title(&candidates);
        let image = resolve_image(&candidates, request.source_url(), &self.transport)
            .await
            .into_url();

        info!(
            url = request.source_url(),
            %title,
            has_image = image.is_some(),
            image = image.as_deref().unwrap_or(""),
            "metadata extracted"
        );

        Ok(ExtractionResult {
            url: request.source_url().to_string(),
            title,
            image,
        })
    }

    /// Fetches and parses `url` and returns every candidate found, without
    /// choosing between them or checking any image.
    pub async fn candidates(&self, url: &str) -> Result<CandidateSet> {
        let request = ExtractionRequest::parse(url)?;
        self.fetch_candidates(&request).await
    }

    async fn fetch_candidates(&self, request: &ExtractionRequest) -> Result<CandidateSet> {
        let fetched = self.transport.get(request.url()).await.inspect_err(|e| {
            warn!(url = request.source_url(), error = %e, "fetch failed");
        })?;

        if !fetched.looks_like_html() {
            debug!(
                url = request.source_url(),
                content_type = %fetched.content_type,
                "content type is not HTML, parsing anyway"
            );
        }
        if fetched.final_url != request.url().as_str() {
            debug!(from = request.source_url(), to = %fetched.final_url, "followed redirects");
        }

        let document = Document::parse(&fetched.raw_body)?;
        let candidates = extract_candidates(&document);
        debug!(url = request.source_url(), ?candidates, "candidates extracted");
        Ok(candidates)
    }
}

/// Extracts metadata for `url` with the default configuration.
///
/// This is the call the link-creation handler makes before storing a link.
pub async fn extract_metadata(url: &str) -> Result<ExtractionResult> {
    // Validate before building a client so bad input never costs anything
    ExtractionRequest::parse(url)?;

    let extractor = MetadataExtractor::new(ExtractorConfig::default()).map_err(|e| {
        ExtractError::TransportFailure {
            url: url.to_string(),
            cause: TransportCause::Other,
            message: format!("could not set up HTTP client: {e}"),
        }
    })?;
    extractor.extract(url).await
}
