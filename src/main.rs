use std::io::{self, Write};
use std::path::PathBuf;

use acquire::cache::{Acquired, Source};
use acquire::{AcquireError, Acquirer, ApiClient, Config};
use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "acquire")]
#[command(about = "Fetch paginated API datasets and cache them as CSV files")]
#[command(version)]
struct Args {
    /// Path to config file (default: ./acquire.yaml or $XDG_CONFIG_HOME/acquire/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for cache files (overrides the config file)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a dataset as CSV, fetching it on a cache miss
    Fetch {
        dataset: String,

        /// Print a one-line summary instead of the rows
        #[arg(long)]
        summary: bool,
    },
    /// List configured datasets
    List,
    /// Show cache state for one dataset or all of them
    Status { dataset: Option<String> },
    /// Delete a dataset's cache file so the next fetch hits the network
    Clear { dataset: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.verbose);

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Override cache directory if specified on command line
    let config = if let Some(cache_dir) = args.cache_dir {
        Config {
            cache_dir: Some(cache_dir),
            ..config
        }
    } else {
        config
    };

    let acquirer = Acquirer::from_config(&config)?;
    run(&acquirer, args.command).await
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "acquire=info",
        _ => "acquire=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(acquirer: &Acquirer<ApiClient>, command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Fetch { dataset, summary } => {
            let acquired = match acquirer.acquire(&dataset).await {
                Ok(acquired) => acquired,
                // The fetch itself succeeded; show the data even though it was not cached.
                Err(AcquireError::CachePersist {
                    path,
                    source,
                    table,
                }) => {
                    warn!(path = %path.display(), error = %source, "Dataset fetched but not cached");
                    Acquired {
                        table: *table,
                        source: Source::Network,
                        path,
                    }
                }
                Err(err) => return Err(err.into()),
            };
            if summary {
                let source = match acquired.source {
                    Source::Cache => "cache",
                    Source::Network => "network",
                };
                writeln!(
                    out,
                    "{}: {} rows, {} columns from {} ({})",
                    dataset,
                    acquired.table.len(),
                    acquired.table.columns().len(),
                    source,
                    acquired.path.display()
                )?;
            } else {
                acquired.table.write_csv(&mut out)?;
            }
        }
        Command::List => {
            for (name, source) in acquirer.datasets() {
                writeln!(out, "{:<12} {}", name, source.describe())?;
            }
        }
        Command::Status { dataset } => {
            let names: Vec<String> = match dataset {
                Some(name) => vec![name],
                None => acquirer.datasets().map(|(name, _)| name.to_string()).collect(),
            };
            for name in names {
                match acquirer.status(&name)? {
                    Some(status) => {
                        let age = Utc::now().signed_duration_since(status.modified);
                        writeln!(
                            out,
                            "{:<12} cached  {:>10} bytes  {}  ({} min ago)",
                            name,
                            status.size,
                            status.path.display(),
                            age.num_minutes()
                        )?;
                    }
                    None => writeln!(
                        out,
                        "{:<12} missing {}",
                        name,
                        acquirer.cache().path(&name).display()
                    )?,
                }
            }
        }
        Command::Clear { dataset } => {
            if acquirer.clear(&dataset)? {
                writeln!(out, "Removed {}", acquirer.cache().path(&dataset).display())?;
            } else {
                writeln!(out, "Nothing cached for {}", dataset)?;
            }
        }
    }

    Ok(())
}
