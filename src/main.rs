//! CLI entry point for the citeview tool.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use citeview_core::{
    Anonymous, CitationViewer, ContentStore, CredentialSupplier, EnvCredential, FetchConfig,
    HttpFetcher, LoadState, Publication, RenderStrategy, TextDocumentLoader, ViewState,
};
use clap::Parser;
use tracing::{debug, info};
use url::Url;

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::{Cli, Command, GlobalArgs, OpenArgs, TextArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let file_config = app_config::load_config(cli.global.config.as_deref())?;

    init_tracing(&cli.global, file_config.as_ref());
    debug!(?cli, "CLI arguments parsed");

    let settings = Settings::merge(&cli.global, file_config.unwrap_or_default())?;
    let fetcher = HttpFetcher::new(settings.fetch).context("Failed to build HTTP client")?;

    match cli.command {
        Command::Open(args) => run_open(fetcher, settings.token_env, args).await,
        Command::Text(args) => run_text(fetcher, args).await,
    }
}

/// Installs the tracing subscriber on stderr.
///
/// Priority: `RUST_LOG` > quiet flag > verbose flag > config verbosity > info.
fn init_tracing(global: &GlobalArgs, file_config: Option<&FileConfig>) {
    let default_level = if global.quiet {
        "error"
    } else {
        match global.verbose {
            0 => file_config
                .and_then(|cfg| cfg.verbosity)
                .map_or("info", app_config::VerbositySetting::filter_level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Effective runtime settings: command line over config file over defaults.
struct Settings {
    fetch: FetchConfig,
    token_env: Option<String>,
}

impl Settings {
    fn merge(global: &GlobalArgs, file_config: FileConfig) -> Result<Self> {
        let mut fetch = FetchConfig::default();

        fetch.base_url = match &global.base_url {
            Some(raw) => Some(
                Url::parse(raw).with_context(|| format!("Invalid --base-url value '{raw}'"))?,
            ),
            None => file_config.base_url,
        };
        if let Some(secs) = global.connect_timeout.or(file_config.connect_timeout_secs) {
            fetch.connect_timeout_secs = secs;
        }
        if let Some(secs) = global.read_timeout.or(file_config.read_timeout_secs) {
            fetch.read_timeout_secs = secs;
        }
        if let Some(limit) = file_config.max_body_bytes {
            fetch.max_body_bytes = limit;
        }

        let token_env = global.token_env.clone().or(file_config.token_env);
        Ok(Self { fetch, token_env })
    }
}

async fn run_open(fetcher: HttpFetcher, token_env: Option<String>, args: OpenArgs) -> Result<()> {
    let credentials: Arc<dyn CredentialSupplier> = match token_env {
        Some(var) => {
            debug!(var = %var, "using bearer token from environment");
            Arc::new(EnvCredential::new(var))
        }
        None => Arc::new(Anonymous),
    };

    let store = ContentStore::new();
    let viewer = CitationViewer::new(fetcher, store.clone(), credentials);
    if viewer.open(args.reference.as_str()).await == Publication::Discarded {
        bail!("Citation resolution was superseded");
    }

    let strategy = viewer.strategy();
    let view = viewer.view();
    let kind = viewer
        .resolver()
        .state()
        .ready()
        .and_then(Option::as_ref)
        .map(|content| (content.kind(), content.handle().len()));

    match &view {
        ViewState::Failed(error) => bail!("{error}"),
        ViewState::Document(LoadState::Failed(error)) => match error.download_url() {
            Some(url) => bail!("{error}\n  Download the file directly: {url}"),
            None => bail!("{error}"),
        },
        _ => {}
    }

    if args.json {
        let report = serde_json::json!({
            "reference": args.reference,
            "kind": kind.map(|(kind, _)| kind),
            "bytes": kind.map(|(_, bytes)| bytes),
            "render": strategy,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &strategy {
            RenderStrategy::Nothing => println!("nothing"),
            RenderStrategy::Image { src } => println!("image {src}"),
            RenderStrategy::Frame { src } => println!("frame {src}"),
            RenderStrategy::Markdown { source } => println!("markdown {source}"),
        }
    }

    match (&view, &args.out) {
        (ViewState::Image { src } | ViewState::Frame { src }, Some(out)) => {
            let bytes = store
                .get(src)
                .with_context(|| format!("Content for {src} was already released"))?;
            tokio::fs::write(out, &*bytes)
                .await
                .with_context(|| format!("Failed to write '{}'", out.display()))?;
            info!(path = %out.display(), bytes = bytes.len(), "citation content written");
        }
        (ViewState::Document(LoadState::Ready(text)), Some(out)) => {
            tokio::fs::write(out, text)
                .await
                .with_context(|| format!("Failed to write '{}'", out.display()))?;
            info!(path = %out.display(), "sanitized document written");
        }
        (ViewState::Document(LoadState::Ready(text)), None) if !args.json => {
            println!("{text}");
        }
        _ => {}
    }

    viewer.close();
    Ok(())
}

async fn run_text(fetcher: HttpFetcher, args: TextArgs) -> Result<()> {
    let loader = TextDocumentLoader::new(fetcher);
    loader.load(&args.url).await;

    let state = loader.state().clone();
    match state {
        LoadState::Ready(text) => {
            println!("{text}");
            Ok(())
        }
        LoadState::Failed(error) => match error.download_url() {
            Some(url) => bail!("{error}\n  Download the file directly: {url}"),
            None => bail!("{error}"),
        },
        LoadState::Loading => bail!("Document load did not complete"),
    }
}
