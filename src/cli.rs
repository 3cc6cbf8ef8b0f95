//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Resolve, classify and display citation documents.
///
/// Citeview fetches the document behind a citation reference (keeping any
/// `#page=N` style fragment), decides how it should be rendered, and loads
/// markdown citations as sanitized text.
#[derive(Parser, Debug)]
#[command(name = "citeview")]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file path (defaults to $XDG_CONFIG_HOME/citeview/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL that relative references are resolved against
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Environment variable holding a bearer token for citation fetches
    #[arg(long, global = true)]
    pub token_env: Option<String>,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a citation reference and report how to render it
    Open(OpenArgs),

    /// Load a text document and print it with anchor links removed
    Text(TextArgs),
}

/// Arguments for `citeview open`.
#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
    /// Citation reference, e.g. https://host/doc.pdf#page=3
    pub reference: String,

    /// Write the fetched content (sanitized text for markdown) to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print the render strategy as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `citeview text`.
#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    /// URL of the text document
    pub url: String,
}
