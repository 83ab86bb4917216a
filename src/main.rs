// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the options file (if any) and merge the flags over it
// 3. Lint (or fix) every file, one after another
// 4. Print the diagnostics as a table or as JSON
// 5. Exit with proper code (0 = clean, 1 = problems found, 2 = error)
//
// Each file's links are checked concurrently inside the rule, so there is
// no extra parallelism at this level.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use no_dead_link::{Diagnostic, Document, NoDeadLink, Options};
use serde::Serialize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Diagnostics for one input file
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    diagnostics: Vec<Diagnostic>,
}

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let file_options = match &cli.config {
        Some(path) => Options::from_file(path)?,
        None => Options::default(),
    };
    let options = file_options.merge(cli.options());
    let rule = NoDeadLink::new(options).context("failed to set up no-dead-link")?;

    let mut reports = Vec::new();
    for path in &cli.files {
        let diagnostics = check_file(&rule, path, cli.fix).await?;
        reports.push(FileReport {
            file: path.display().to_string(),
            diagnostics,
        });
    }

    print_results(&reports, cli.json, cli.fix)?;

    // In fix mode, redirects have been rewritten and no longer count
    let remaining = reports
        .iter()
        .flat_map(|report| &report.diagnostics)
        .filter(|diagnostic| !(cli.fix && diagnostic.is_fixable()))
        .count();

    Ok(if remaining > 0 { 1 } else { 0 })
}

async fn check_file(rule: &NoDeadLink, path: &Path, fix: bool) -> Result<Vec<Diagnostic>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = Document::parse_markdown(source);

    info!(file = %path.display(), "checking links");

    if !fix {
        return Ok(rule.lint(&document).await);
    }

    let outcome = rule.fix(&document).await;
    if outcome.output != document.source() {
        std::fs::write(path, &outcome.output)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(file = %path.display(), "rewrote redirected links");
    }
    Ok(outcome.diagnostics)
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match std::env::var("RUST_LOG") {
            Ok(directives) => EnvFilter::new(directives),
            Err(_) => match verbose {
                0 => EnvFilter::new("warn"),
                1 => EnvFilter::new("no_dead_link=info,warn"),
                _ => EnvFilter::new("no_dead_link=debug,info"),
            },
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_results(reports: &[FileReport], json: bool, fixed: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(reports)?;
        println!("{}", json_output);
    } else {
        print_table(reports, fixed);
    }
    Ok(())
}

// One line per diagnostic, in the usual file:line:column form
fn print_table(reports: &[FileReport], fixed: bool) {
    for report in reports {
        for diagnostic in &report.diagnostics {
            let marker = match (diagnostic.is_fixable(), fixed) {
                (true, true) => " [fixed]",
                (true, false) => " [fixable]",
                _ => "",
            };
            println!(
                "{}:{}:{}  {}{}",
                report.file, diagnostic.line, diagnostic.column, diagnostic.message, marker
            );
        }
    }

    let total: usize = reports.iter().map(|r| r.diagnostics.len()).sum();
    let fixable = reports
        .iter()
        .flat_map(|r| &r.diagnostics)
        .filter(|d| d.is_fixable())
        .count();

    println!();
    println!("📊 Summary:");
    println!("   📄 Files: {}", reports.len());
    println!("   ❌ Problems: {}", total);
    if fixed {
        println!("   🔧 Fixed: {}", fixable);
    } else {
        println!("   🔀 Fixable: {}", fixable);
    }
}
