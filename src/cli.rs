// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - extract: resolve title + image for one or more URLs
// - candidates: show every title/image candidate found on one page
//
// The network settings are global flags, and each one can also come from a
// LINKDB_* environment variable (that's what `env = ...` does).
// =============================================================================

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use linkdb_meta::config::{
    ExtractorConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT,
};

#[derive(Parser, Debug)]
#[command(
    name = "linkdb-meta",
    version,
    about = "Fetch a page and work out its title and preview image",
    long_about = "linkdb-meta fetches a web page the way LinkDB does when a link is saved, \
                  and prints the title and preview image it would store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// Log every pipeline step (same as RUST_LOG=linkdb_meta=debug)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract title and image for each URL, one after another
    ///
    /// Example: linkdb-meta extract https://www.rust-lang.org https://crates.io
    Extract {
        /// URLs to extract metadata from
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show every title and image candidate on a page, in priority order
    ///
    /// No image is checked; this only shows what the page offers.
    Candidates {
        url: String,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// User-Agent sent with every request
    #[arg(long, global = true, env = "LINKDB_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Seconds to wait for the page itself
    #[arg(long, global = true, env = "LINKDB_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// Seconds to wait for the image reachability check
    #[arg(long, global = true, env = "LINKDB_HEAD_TIMEOUT_SECS", default_value_t = 5)]
    pub head_timeout_secs: u64,

    /// Redirects to follow before giving up
    #[arg(long, global = true, env = "LINKDB_MAX_REDIRECTS", default_value_t = DEFAULT_MAX_REDIRECTS)]
    pub max_redirects: usize,

    /// Largest page body to read, in KiB
    #[arg(long, global = true, env = "LINKDB_MAX_BODY_KB", default_value_t = DEFAULT_MAX_BODY_BYTES / 1024)]
    pub max_body_kb: usize,
}

impl NetworkArgs {
    pub fn to_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            user_agent: self.user_agent.clone(),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            head_timeout: Duration::from_secs(self.head_timeout_secs),
            max_redirects: self.max_redirects,
            max_body_bytes: self.max_body_kb.saturating_mul(1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_config() {
        let cli = Cli::try_parse_from(["linkdb-meta", "extract", "https://example.com"]).unwrap();
        assert_eq!(cli.network.to_config(), ExtractorConfig::default());
    }

    #[test]
    fn test_extract_accepts_many_urls() {
        let cli = Cli::try_parse_from([
            "linkdb-meta",
            "extract",
            "https://a.example",
            "https://b.example",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Extract { urls, json } => {
                assert_eq!(urls.len(), 2);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_extract_requires_a_url() {
        assert!(Cli::try_parse_from(["linkdb-meta", "extract"]).is_err());
    }

    #[test]
    fn test_network_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "linkdb-meta",
            "candidates",
            "https://example.com",
            "--fetch-timeout-secs",
            "3",
            "--max-body-kb",
            "64",
        ])
        .unwrap();

        let config = cli.network.to_config();
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.max_body_bytes, 64 * 1024);
    }
}
