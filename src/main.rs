//! Command-line interface for graph-export
//!
//! Data goes to stdout, diagnostics go to stderr, so partial CSV output
//! stays usable even after a fatal error. Any error escaping command
//! dispatch exits non-zero.

use clap::{Parser, Subcommand};
use graph_export::{Config, CsvWriter, Error, GraphClient, Result, export_posts, filter_rows};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graph-export", version, about = "Export post/comment/reaction trees to CSV")]
struct Cli {
    /// API access token (required for network commands)
    #[arg(long, env = "GRAPH_ACCESS_TOKEN", global = true)]
    token: Option<String>,

    /// Base URL of the Graph-style API
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Number of concurrent fetch workers
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Seconds to back off before retrying a rate-limited fetch
    #[arg(long, global = true)]
    backoff_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read post ids from stdin (one per line) and write flattened CSV to stdout
    Export,
    /// List the post ids of a feed node, one per line
    Feed {
        /// Feed node identifier (group or page id)
        node: String,
    },
    /// Keep only CSV rows (stdin to stdout) whose column equals a value
    Filter {
        /// Column name from the output schema
        #[arg(long)]
        column: String,
        /// Cell value to keep
        #[arg(long)]
        value: String,
    },
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();
    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(secs) = cli.backoff_secs {
        config.rate_limit_backoff = Duration::from_secs(secs);
    }
    config
}

fn require_token(cli: &Cli) -> Result<String> {
    cli.token.clone().ok_or(Error::MissingToken)
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli);
    match &cli.command {
        Command::Export => {
            let token = require_token(&cli)?;
            let client = Arc::new(GraphClient::new(&config.api_base, token));
            let writer = Arc::new(CsvWriter::new(std::io::stdout()));
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            export_posts(&config, client, writer, input).await
        }
        Command::Feed { node } => {
            let token = require_token(&cli)?;
            let client = GraphClient::new(&config.api_base, token);
            let ids = client.feed_ids(node, config.feed_page_size).await?;
            let mut stdout = std::io::stdout().lock();
            for id in ids {
                writeln!(stdout, "{id}")?;
            }
            Ok(())
        }
        Command::Filter { column, value } => {
            let mut stdout = std::io::stdout().lock();
            filter_rows(std::io::stdin().lock(), &mut stdout, column, value)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        tracing::error!(%error, "Fatal error");
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
