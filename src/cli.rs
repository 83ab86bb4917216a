// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags mirror the rule options, so everything that can go in an
// options file can also be given on the command line:
//
//   no-dead-link README.md docs/guide.md
//   no-dead-link --check-relative --base-uri https://example.com/ README.md
//   no-dead-link --config .no-dead-link.json --fix README.md
// =============================================================================

use clap::Parser;
use no_dead_link::Options;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "no-dead-link",
    version,
    about = "Find dead and permanently redirected links in Markdown files",
    long_about = "no-dead-link extracts URIs from Markdown files, checks that each one still answers \
                  over HTTP(S) and reports dead links and 301 redirects. With --fix, redirected \
                  links are rewritten to their final destination."
)]
pub struct Cli {
    /// Markdown files to check
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// JSON options file (checkRelative, baseURI, ignore, timeoutSecs)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also check relative links (needs a base URI)
    #[arg(long)]
    pub check_relative: bool,

    /// Base URI used to resolve relative links
    #[arg(long, value_name = "URI")]
    pub base_uri: Option<String>,

    /// Never check this URI (may be repeated)
    #[arg(long, value_name = "URI")]
    pub ignore: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Rewrite redirected links in place
    #[arg(long)]
    pub fix: bool,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Rule options given as flags, to be merged over the options file
    pub fn options(&self) -> Options {
        Options {
            check_relative: self.check_relative,
            base_uri: self.base_uri.clone(),
            ignore: self.ignore.clone(),
            timeout_secs: self.timeout,
        }
    }
}
