// src/lib.rs
// =============================================================================
// LinkDB metadata extraction.
//
// Given a URL someone wants to bookmark, fetch the page and work out a title
// and a preview image for it. The link-creation handler calls
// `extract_metadata` and stores what comes back.
//
// Module map:
// - metadata: the pipeline (fetch -> parse -> candidates -> resolve)
// - config: timeouts, user agent, body size limit
// - error: the five ways a run can fail
// =============================================================================

pub mod config;
pub mod error;
pub mod metadata;

pub use config::ExtractorConfig;
pub use error::{ErrorKind, ExtractError, FailureReport, TransportCause};
pub use metadata::{extract_metadata, ExtractionResult, MetadataExtractor};
