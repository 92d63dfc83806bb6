// src/metadata/fetch.rs
// =============================================================================
// This module talks to the network.
//
// Two kinds of request leave the pipeline:
// - one GET for the source page (redirects followed, body read with a cap)
// - at most one HEAD for the chosen preview image (reachability only)
//
// Both go through the HttpTransport trait so the pipeline can be driven by a
// fake in tests. ReqwestTransport is the real thing.
// =============================================================================

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::debug;
use url::Url;

use super::types::FetchedDocument;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result, TransportCause};

/// The network seam of the pipeline.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET the source page. Any non-2xx final status is a
    /// `RemoteHttpError`; transport problems are `TransportFailure`.
    async fn get(&self, url: &Url) -> Result<FetchedDocument>;

    /// HEAD a candidate image and report the final status code.
    async fn head(&self, url: &str) -> Result<u16>;
}

/// HttpTransport on top of a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    fetch_timeout: std::time::Duration,
    head_timeout: std::time::Duration,
    max_body_bytes: usize,
}

impl ReqwestTransport {
    pub fn new(config: &ExtractorConfig) -> anyhow::Result<Self> {
        // One client for both requests so the HEAD can reuse the connection
        // when the image lives on the same host as the page.
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(ReqwestTransport {
            client,
            fetch_timeout: config.fetch_timeout,
            head_timeout: config.head_timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<FetchedDocument> {
        let mut response = self
            .client
            .get(url.clone())
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| categorize_error(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(ExtractError::RemoteHttpError {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Read chunk by chunk so a huge page can't eat all our memory.
        // Everything past the cap is dropped; a cut-off document is still
        // a document as far as the parser is concerned.
        let mut body: Vec<u8> = Vec::new();
        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|e| ExtractError::BodyReadFailure {
                    url: final_url.clone(),
                    message: error_chain(&e),
                })?;

            let Some(chunk) = chunk else { break };

            let room = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(url = %final_url, limit = self.max_body_bytes, "body truncated at size limit");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedDocument {
            final_url,
            status_code: status.as_u16(),
            content_type,
            raw_body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn head(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        Ok(response.status().as_u16())
    }
}

// Sorts a reqwest error into one of our transport causes.
//
// reqwest flags timeouts, redirects and connect errors directly. TLS
// problems only show up in the text of the error chain.
fn categorize_error(url: &str, error: reqwest::Error) -> ExtractError {
    let message = error_chain(&error);
    let lowered = message.to_lowercase();

    let cause = if error.is_timeout() {
        TransportCause::Timeout
    } else if error.is_redirect() {
        TransportCause::Redirect
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        TransportCause::Tls
    } else if error.is_connect() {
        TransportCause::Connect
    } else {
        TransportCause::Other
    };

    debug!(url, %cause, "request failed");

    ExtractError::TransportFailure {
        url: url.to_string(),
        cause,
        message,
    }
}

// reqwest's top-level message is usually just "error sending request";
// the useful part (dns error, certificate expired...) is further down.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why #[async_trait]?
//    - The pipeline holds the transport as `&dyn HttpTransport`
//    - async fns in traits aren't object-safe on their own; async_trait boxes
//      the returned future so the trait can be used behind `dyn`
//
// 2. Why per-request .timeout() instead of one on the client?
//    - The page GET and the image HEAD have different deadlines
//    - A request-level timeout covers the whole exchange, redirects included
//
// 3. Why chunk() instead of text()?
//    - text() buffers the whole body no matter how large it is
//    - chunk() hands us the body piece by piece so we can stop at the cap
// -----------------------------------------------------------------------------
