//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_growth_adapter::CsvGrowthAdapter;
use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::csv_series_writer::write_series_file;
use crate::adapters::csv_weight_store::CsvWeightStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_growth_cache::FileGrowthCache;
use crate::adapters::file_universe_adapter::{FileUniverseSource, ListUniverseSource};
use crate::adapters::retrying_price_port::{RetryPolicy, RetryingPricePort};
use crate::domain::aligned::{AlignedReturnSeries, DEFAULT_INITIAL_VALUE};
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult, BacktestWindow};
use crate::domain::config_validation::{optional_date, validate_config};
use crate::domain::dashboard::{DashboardConfig, DashboardPorts, PortfolioDashboard};
use crate::domain::error::GrowthfolioError;
use crate::domain::growth::{infer_growth, infer_growth_cached, GrowthInference};
use crate::domain::risk::RiskMetrics;
use crate::domain::universe::{SkippedTicker, Universe};
use crate::domain::weights::{derive_weights, WeightVector};
use crate::ports::config_port::ConfigPort;
use crate::ports::growth_cache::GrowthCache;
use crate::ports::universe_port::UniverseSource;
use crate::ports::weight_store::WeightStore;

#[derive(Parser, Debug)]
#[command(
    name = "growthfolio",
    about = "Growth-weighted long/short portfolio builder and backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Backtest window overrides. Without flags the config decides.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Look back this many years from today
    #[arg(long, conflicts_with = "start")]
    pub years: Option<u32>,
    /// Window start (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Window end (YYYY-MM-DD), defaults to today
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the weight table, deriving and storing it if none exists
    Weights {
        #[arg(short, long)]
        config: PathBuf,
        /// Re-estimate growth and overwrite the stored table
        #[arg(long)]
        refresh: bool,
    },
    /// Backtest the weight table
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
        /// Write the aligned return series as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print tail-risk metrics of the backtested portfolio
    Risk {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Weights, backtest, risk and benchmark comparison in one run
    Dashboard {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        refresh: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Returns of the stored weight table between two dates
    Performance {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Drop cached growth estimates for the configured universe
    InvalidateCache {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Weights { config, refresh } => run_weights(&config, refresh),
        Command::Backtest {
            config,
            window,
            output,
        } => run_backtest_command(&config, &window, output.as_deref()),
        Command::Risk { config, window } => run_risk(&config, &window),
        Command::Dashboard {
            config,
            window,
            refresh,
            output,
        } => run_dashboard(&config, &window, refresh, output.as_deref()),
        Command::Performance {
            config,
            start,
            end,
            output,
        } => run_performance(&config, start, end, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::InvalidateCache { config } => run_invalidate_cache(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, GrowthfolioError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

/// Backtest settings from config, with CLI flags taking precedence.
///
/// Order: `--start`, `--years`, `[backtest] start_date`, `[backtest] years`.
pub fn build_backtest_config(
    config: &dyn ConfigPort,
    window: &WindowArgs,
) -> Result<BacktestConfig, GrowthfolioError> {
    let window = if let Some(start) = window.start {
        BacktestWindow::Range {
            start,
            end: window.end,
        }
    } else if let Some(years) = window.years {
        BacktestWindow::Lookback { years }
    } else if let Some(start) = optional_date(config, "start_date")? {
        BacktestWindow::Range {
            start,
            end: optional_date(config, "end_date")?,
        }
    } else {
        let years = config.get_int("backtest", "years", 1);
        let years = u32::try_from(years).map_err(|_| GrowthfolioError::ConfigInvalid {
            section: "backtest".into(),
            key: "years".into(),
            reason: format!("{years} is not a valid number of years"),
        })?;
        BacktestWindow::Lookback { years }
    };

    Ok(BacktestConfig {
        window,
        initial_value: config.get_double("backtest", "initial_value", DEFAULT_INITIAL_VALUE),
    })
}

pub fn build_dashboard_config(
    config: &dyn ConfigPort,
    window: &WindowArgs,
) -> Result<DashboardConfig, GrowthfolioError> {
    Ok(DashboardConfig {
        backtest: build_backtest_config(config, window)?,
        benchmark: config
            .get_string("backtest", "benchmark")
            .map(|b| b.trim().to_uppercase())
            .filter(|b| !b.is_empty()),
        parallel: config.get_bool("data", "parallel", false),
    })
}

pub fn build_retry_policy(config: &dyn ConfigPort) -> RetryPolicy {
    let defaults = RetryPolicy::default();
    let max_retries = config.get_int("data", "max_retries", i64::from(defaults.max_retries));
    let delay_ms = config.get_int("data", "retry_delay_ms", defaults.delay.as_millis() as i64);
    let interval_ms = config.get_int("data", "min_interval_ms", 0);

    RetryPolicy {
        max_retries: u32::try_from(max_retries).unwrap_or(defaults.max_retries),
        delay: Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0)),
        min_interval: Duration::from_millis(u64::try_from(interval_ms).unwrap_or(0)),
    }
}

/// The configured universe: inline tickers, a symbols file, or every price file.
pub fn resolve_universe(config: &dyn ConfigPort) -> Result<Universe, GrowthfolioError> {
    let non_blank = |key: &str| {
        config
            .get_string("universe", key)
            .filter(|v| !v.trim().is_empty())
    };

    if let Some(tickers) = non_blank("tickers") {
        return ListUniverseSource::new(tickers).universe();
    }
    if let Some(file) = non_blank("file") {
        return FileUniverseSource::new(PathBuf::from(file.trim())).universe();
    }
    if config.get_bool("universe", "from_prices", false) {
        let prices_dir = config.require_string("data", "prices_dir")?;
        return CsvPriceAdapter::new(PathBuf::from(prices_dir)).universe();
    }
    Err(GrowthfolioError::ConfigMissing {
        section: "universe".into(),
        key: "tickers".into(),
    })
}

/// File-backed collaborators built from the `[data]` section.
pub struct Adapters {
    pub growth: CsvGrowthAdapter,
    pub prices: RetryingPricePort<CsvPriceAdapter>,
    pub weight_store: CsvWeightStore,
    pub growth_cache: Option<FileGrowthCache>,
}

impl Adapters {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GrowthfolioError> {
        let prices_dir = config.require_string("data", "prices_dir")?;
        let growth_file = config.require_string("data", "growth_file")?;
        let weights_file = config
            .get_string("data", "weights_file")
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| "weights.csv".to_string());
        let growth_cache = config
            .get_string("data", "cache_dir")
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .map(|d| FileGrowthCache::new(PathBuf::from(d)));

        Ok(Self {
            growth: CsvGrowthAdapter::from_file(&growth_file)?,
            prices: RetryingPricePort::new(
                CsvPriceAdapter::new(PathBuf::from(prices_dir)),
                build_retry_policy(config),
            ),
            weight_store: CsvWeightStore::new(PathBuf::from(weights_file)),
            growth_cache,
        })
    }

    pub fn ports(&self) -> DashboardPorts<'_> {
        DashboardPorts {
            growth: &self.growth,
            prices: &self.prices,
            weight_store: &self.weight_store,
            growth_cache: self.growth_cache.as_ref().map(|c| c as &dyn GrowthCache),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Stored weights, or freshly derived ones that are then stored.
/// With `refresh` the cache entry and stored table are both replaced.
pub fn resolve_weights(
    ports: &DashboardPorts<'_>,
    universe: &Universe,
    parallel: bool,
    refresh: bool,
) -> Result<(WeightVector, Option<GrowthInference>), GrowthfolioError> {
    if !refresh {
        if let Some(stored) = ports.weight_store.load()? {
            return Ok((stored, None));
        }
    }

    let growth = match ports.growth_cache {
        Some(cache) => {
            if refresh {
                cache.invalidate(&universe.key())?;
            }
            infer_growth_cached(ports.growth, cache, universe, parallel)?
        }
        None => infer_growth(ports.growth, universe, parallel),
    };
    let weights = derive_weights(&growth.mapping);
    ports.weight_store.save(&weights)?;
    Ok((weights, Some(growth)))
}

fn run_weights(config_path: &Path, refresh: bool) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let universe = resolve_universe(&config)?;
    let adapters = Adapters::from_config(&config)?;
    let parallel = config.get_bool("data", "parallel", false);

    eprintln!("Universe: {} tickers", universe.count());
    let (weights, growth) = resolve_weights(&adapters.ports(), &universe, parallel, refresh)?;

    match &growth {
        Some(g) => {
            eprintln!(
                "Derived weights for {} tickers{}",
                weights.len(),
                if g.from_cache { " (cached growth)" } else { "" }
            );
            print_skipped(&g.skipped);
        }
        None => eprintln!(
            "Using stored weight table {}",
            adapters.weight_store.path().display()
        ),
    }

    print_weights(weights.iter());
    Ok(())
}

fn backtest_stage(
    config: &FileConfigAdapter,
    adapters: &Adapters,
    window: &WindowArgs,
) -> Result<BacktestResult, GrowthfolioError> {
    let universe = resolve_universe(config)?;
    let bt_config = build_backtest_config(config, window)?;
    let parallel = config.get_bool("data", "parallel", false);

    let ports = adapters.ports();
    let (weights, _) = resolve_weights(&ports, &universe, parallel, false)?;

    let (start, end) = bt_config.window.resolve(today());
    eprintln!(
        "Running backtest: {} tickers, {} to {}",
        weights.len(),
        start,
        end
    );
    let result = run_backtest(ports.prices, universe.tickers(), &weights, &bt_config, today())?;
    print_skipped(&result.skipped);
    Ok(result)
}

fn run_backtest_command(
    config_path: &Path,
    window: &WindowArgs,
    output: Option<&Path>,
) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;
    let result = backtest_stage(&config, &adapters, window)?;

    print_series_summary(&result.series);
    if let Some(path) = output {
        write_series_file(path, &result.series)?;
        eprintln!("\nReturn series written to: {}", path.display());
    }
    Ok(())
}

fn run_risk(config_path: &Path, window: &WindowArgs) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;
    let result = backtest_stage(&config, &adapters, window)?;

    let metrics = RiskMetrics::from_series(&result.series)?;
    print_risk(&metrics);
    Ok(())
}

fn run_dashboard(
    config_path: &Path,
    window: &WindowArgs,
    refresh: bool,
    output: Option<&Path>,
) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let universe = resolve_universe(&config)?;
    let adapters = Adapters::from_config(&config)?;
    let dash_config = build_dashboard_config(&config, window)?;

    eprintln!("Building dashboard for {} tickers", universe.count());
    let dashboard = if refresh {
        PortfolioDashboard::build_refreshed(adapters.ports(), universe, dash_config, today())?
    } else {
        PortfolioDashboard::build(adapters.ports(), universe, dash_config, today())?
    };

    print_skipped(&dashboard.growth().skipped);
    print_skipped(&dashboard.backtest().skipped);
    print_weights(dashboard.backtest().weights.iter());
    print_series_summary(&dashboard.backtest().series);
    print_risk(dashboard.risk_metrics());

    let analytics = dashboard.analytics();
    if !analytics.growth_ranking.is_empty() {
        eprintln!("\n=== Growth Ranking ===");
        for (ticker, g) in analytics.growth_ranking.iter().take(10) {
            eprintln!("  {:<8} {:>8.2}%", ticker, g * 100.0);
        }
    }
    if let (Some(benchmark), Some(last)) = (&analytics.benchmark, analytics.performance.last()) {
        eprintln!("\n=== Benchmark ({}) ===", benchmark);
        match (last.benchmark_dollars, last.excess_dollars) {
            (Some(b), Some(x)) => {
                eprintln!("Benchmark Value:  ${:.2}", b);
                eprintln!("Excess Value:     ${:+.2}", x);
            }
            _ => eprintln!("Benchmark has no price on {}", last.date),
        }
    }

    if let Some(path) = output {
        write_series_file(path, &dashboard.backtest().series)?;
        eprintln!("\nReturn series written to: {}", path.display());
    }
    Ok(())
}

fn run_performance(
    config_path: &Path,
    start: NaiveDate,
    end: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let adapters = Adapters::from_config(&config)?;

    let weights = adapters
        .weight_store
        .load()?
        .ok_or_else(|| GrowthfolioError::WeightTable {
            path: adapters.weight_store.path().display().to_string(),
            reason: "no stored weight table; run `weights` first".into(),
        })?;
    let bt_config = BacktestConfig {
        window: BacktestWindow::Range { start, end },
        initial_value: config.get_double("backtest", "initial_value", DEFAULT_INITIAL_VALUE),
    };

    let result = run_backtest(&adapters.prices, &weights.tickers(), &weights, &bt_config, today())?;
    print_skipped(&result.skipped);
    print_series_summary(&result.series);
    if let Some(path) = output {
        write_series_file(path, &result.series)?;
        eprintln!("\nReturn series written to: {}", path.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let universe = resolve_universe(&config)?;
    let bt_config = build_backtest_config(&config, &WindowArgs::default())?;
    let (start, end) = bt_config.window.resolve(today());

    eprintln!("\nUniverse: {} tickers", universe.count());
    for (letter, batch) in universe.batches_by_letter() {
        eprintln!("  {}: {}", letter, batch.join(", "));
    }
    eprintln!("Window:   {} to {}", start, end);
    eprintln!("Initial:  {:.2}", bt_config.initial_value);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_invalidate_cache(config_path: &Path) -> Result<(), GrowthfolioError> {
    let config = load_config(config_path)?;
    let universe = resolve_universe(&config)?;
    let cache_dir = config.require_string("data", "cache_dir")?;
    let cache = FileGrowthCache::new(PathBuf::from(cache_dir));

    if cache.invalidate(&universe.key())? {
        eprintln!("Removed cached growth estimates for {} tickers", universe.count());
    } else {
        eprintln!("No cached growth estimates for this universe");
    }
    Ok(())
}

fn print_skipped(skipped: &[SkippedTicker]) {
    for s in skipped {
        eprintln!("warning: skipping {} ({})", s.ticker, s.reason);
    }
}

fn print_weights<'a, W>(weights: W)
where
    W: IntoIterator<Item = (&'a str, f64)>,
{
    let mut rows: Vec<(&str, f64)> = weights.into_iter().collect();
    rows.sort_by(|a, b| a.1.total_cmp(&b.1));

    eprintln!("\n=== Weights ===");
    for (ticker, w) in rows {
        println!("{},{:.6}", ticker, w);
    }
}

fn print_series_summary(series: &AlignedReturnSeries) {
    let (Some(first), Some(last)) = (series.rows().first(), series.rows().last()) else {
        return;
    };
    let total = last.portfolio_dollars / first.portfolio_dollars - 1.0;

    eprintln!("\n=== Backtest ===");
    eprintln!("Period:           {} to {}", first.date, last.date);
    eprintln!("Trading Days:     {}", series.len());
    eprintln!("Tickers:          {}", series.tickers().len());
    eprintln!("Final Value:      ${:.2}", last.portfolio_dollars);
    eprintln!("Total Return:     {:.2}%", total * 100.0);
}

fn print_risk(metrics: &RiskMetrics) {
    eprintln!("\n=== Risk Metrics ===");
    for (name, value) in metrics.entries() {
        println!("{},{:.6}", name, value);
    }
}
