//! SupplyLab CLI: fetch market charts, resolve symbols and combine supply series.
//!
//! Commands:
//! - `fetch`: download one series per asset from CoinGecko and store it as CSV
//! - `resolve`: map ticker symbols to provider asset ids
//! - `combine`: merge stored series into a date-indexed supply table
//! - `config`: print the effective configuration

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use supplylab_core::data::{load_symbols, StdoutProgress};
use supplylab_core::{
    combine, fetch_all, resolve_ids, CoinGeckoProvider, FetchMode, SeriesStore, SupplyConfig,
    Window,
};

#[derive(Parser)]
#[command(
    name = "supplylab",
    about = "SupplyLab CLI: circulating-supply series from CoinGecko market charts"
)]
struct Cli {
    /// TOML config file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch market charts and store one series file per asset.
    Fetch {
        #[command(flatten)]
        target: TargetArgs,

        /// File of ticker symbols (one per line) to resolve into asset ids.
        #[arg(long, conflicts_with = "assets")]
        symbols_file: Option<PathBuf>,

        /// Maximum concurrent fetches.
        #[arg(long)]
        workers: Option<usize>,

        /// Fetch one asset at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Resolve ticker symbols to provider asset ids.
    Resolve {
        /// Symbols to resolve (e.g., BTC ETH).
        #[arg(required_unless_present = "symbols_file")]
        symbols: Vec<String>,

        /// File of ticker symbols, one per line.
        #[arg(long)]
        symbols_file: Option<PathBuf>,
    },
    /// Combine stored series into `combined/combined_result.csv`.
    Combine {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// Overrides shared by `fetch` and `combine`.
#[derive(Args)]
struct TargetArgs {
    /// Comma-separated asset ids (e.g., bitcoin,ethereum).
    #[arg(long, value_delimiter = ',')]
    assets: Option<Vec<String>>,

    /// Fiat denomination (e.g., usd).
    #[arg(long)]
    fiat: Option<String>,

    /// Lookback window in days, or "max".
    #[arg(long)]
    window: Option<Window>,

    /// Store root directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl TargetArgs {
    fn apply(self, config: &mut SupplyConfig) {
        if let Some(assets) = self.assets {
            config.assets = assets;
        }
        if let Some(fiat) = self.fiat {
            config.fiat = fiat;
        }
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch {
            target,
            symbols_file,
            workers,
            sequential,
        } => {
            target.apply(&mut config);
            if let Some(n) = workers {
                config.max_workers = n;
            }
            run_fetch(config, symbols_file.as_deref(), sequential)
        }
        Commands::Resolve {
            symbols,
            symbols_file,
        } => run_resolve(&config, symbols, symbols_file.as_deref()),
        Commands::Combine { target } => {
            target.apply(&mut config);
            run_combine(&config)
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Log to stderr so stdout stays for progress and results. `RUST_LOG` overrides.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SupplyConfig> {
    let config = match path {
        Some(p) => SupplyConfig::from_file(p)?,
        None => SupplyConfig::default(),
    };
    Ok(config)
}

fn provider(config: &SupplyConfig) -> Result<CoinGeckoProvider> {
    CoinGeckoProvider::new(&config.api_base_url, config.request_timeout())
        .context("failed to create CoinGecko client")
}

fn run_fetch(mut config: SupplyConfig, symbols_file: Option<&Path>, sequential: bool) -> Result<()> {
    let provider = provider(&config)?;

    if let Some(path) = symbols_file {
        let symbols = load_symbols(path)?;
        let mut seen = HashSet::new();
        let ids: Vec<String> = resolve_ids(&provider, &symbols)?
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        if ids.is_empty() {
            bail!("no asset ids resolved from {}", path.display());
        }
        tracing::info!(
            symbols = symbols.len(),
            assets = ?ids,
            "resolved symbols file"
        );
        config.assets = ids;
    }
    config.validate()?;

    let mode = if sequential {
        FetchMode::Sequential
    } else {
        FetchMode::Parallel {
            max_workers: config.max_workers,
        }
    };
    let store = SeriesStore::new(&config.output_dir);
    let summary = fetch_all(&provider, &store, &config.requests(), mode, &StdoutProgress);

    if !summary.all_succeeded() {
        for (request, err) in summary.failures() {
            eprintln!("Error for {request}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_resolve(
    config: &SupplyConfig,
    mut symbols: Vec<String>,
    symbols_file: Option<&Path>,
) -> Result<()> {
    if let Some(path) = symbols_file {
        symbols.extend(load_symbols(path)?);
    }
    let provider = provider(config)?;
    let ids = resolve_ids(&provider, &symbols)?;

    if ids.is_empty() {
        println!("No asset ids matched.");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

fn run_combine(config: &SupplyConfig) -> Result<()> {
    config.validate()?;
    let store = SeriesStore::new(&config.output_dir);
    let table = combine(&store, &config.requests())?;

    println!(
        "Combined {} assets over {} dates -> {}",
        table.asset_ids.len(),
        table.row_count(),
        store.combined_path().display()
    );
    Ok(())
}
