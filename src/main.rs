// src/main.rs
// =============================================================================
// This is the entry point of the linkdb-meta CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, so --json output on stdout stays clean)
// 3. Run the extraction pipeline for each URL
// 4. Exit with proper code (0 = all extracted, 1 = some URL failed, 2 = error)
// =============================================================================

mod cli;

use clap::Parser;
use cli::{Cli, Commands};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use linkdb_meta::metadata::{first_non_empty, Candidate, CandidateSet};
use linkdb_meta::{ExtractionResult, FailureReport, MetadataExtractor};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "linkdb_meta=debug" } else { "linkdb_meta=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = cli.network.to_config();
    let extractor = MetadataExtractor::new(config).context("invalid network settings")?;
    tracing::debug!(config = ?extractor.config(), "extractor ready");

    match cli.command {
        Commands::Extract { urls, json } => handle_extract(&extractor, &urls, json).await,
        Commands::Candidates { url, json } => handle_candidates(&extractor, &url, json).await,
    }
}

/// One line of `extract --json` output: either the result or why it failed.
#[derive(Serialize)]
#[serde(untagged)]
enum Outcome {
    Extracted(ExtractionResult),
    Failed { url: String, error: FailureReport },
}

// Runs each URL to completion before starting the next one.
async fn handle_extract(extractor: &MetadataExtractor, urls: &[String], json: bool) -> Result<i32> {
    let mut outcomes = Vec::with_capacity(urls.len());
    for url in urls {
        let outcome = match extractor.extract(url).await {
            Ok(result) => Outcome::Extracted(result),
            Err(e) => Outcome::Failed {
                url: url.clone(),
                error: FailureReport::from(&e),
            },
        };
        outcomes.push(outcome);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        print_table(&outcomes);
    }

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Failed { .. }))
        .count();

    Ok(if failed > 0 { 1 } else { 0 })
}

async fn handle_candidates(extractor: &MetadataExtractor, url: &str, json: bool) -> Result<i32> {
    let set = match extractor.candidates(url).await {
        Ok(set) => set,
        Err(e) => {
            let report = FailureReport::from(&e);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("❌ {} ({:?})", report.message, report.kind);
            }
            return Ok(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        print_candidates(&set);
    }
    Ok(0)
}

fn print_table(outcomes: &[Outcome]) {
    println!("{:<50} {:<40} {:<50}", "URL", "TITLE", "IMAGE");
    println!("{}", "=".repeat(140));

    for outcome in outcomes {
        match outcome {
            Outcome::Extracted(result) => println!(
                "{:<50} {:<40} {:<50}",
                truncate(&result.url, 47),
                truncate(&result.title, 37),
                result.image.as_deref().unwrap_or("-"),
            ),
            Outcome::Failed { url, error } => println!(
                "{:<50} ❌ {:?}: {}",
                truncate(url, 47),
                error.kind,
                error.message
            ),
        }
    }

    let ok = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Extracted(_)))
        .count();
    println!();
    println!("📊 Summary:");
    println!("   ✅ Extracted: {}", ok);
    println!("   ❌ Failed: {}", outcomes.len() - ok);
}

fn print_candidates(set: &CandidateSet) {
    print_tier_list("Title candidates", &set.titles);
    print_tier_list("Image candidates", &set.images);

    println!("Fallbacks");
    print_candidate(&set.css_background, false);
    print_candidate(&set.first_img, false);
}

fn print_tier_list(heading: &str, list: &[Candidate]) {
    let winner = first_non_empty(list).map(|c| c.source);
    println!("{}", heading);
    for candidate in list {
        print_candidate(candidate, Some(candidate.source) == winner);
    }
    println!();
}

fn print_candidate(candidate: &Candidate, winner: bool) {
    let marker = if winner { "→" } else { " " };
    let value = if candidate.is_empty() { "-" } else { candidate.value.trim() };
    println!("  {} {:<22} {}", marker, format!("{:?}", candidate.source), value);
}

// Cuts on a char boundary so multi-byte titles don't panic
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_failed_outcome_json_shape() {
        let outcome = Outcome::Failed {
            url: "https://ex.com/missing".to_string(),
            error: FailureReport {
                kind: linkdb_meta::ErrorKind::RemoteHttpError,
                message: "https://ex.com/missing responded with HTTP 404".to_string(),
                status: Some(404),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["url"], "https://ex.com/missing");
        assert_eq!(json["error"]["kind"], "remote_http_error");
        assert_eq!(json["error"]["status"], 404);
    }
}
