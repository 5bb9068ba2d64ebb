//! airq interactive forecasting shell
//!
//! Loads the measurements table, then answers questions about regional air
//! quality until an exit word is typed.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session with the default configuration search
//! cargo run --bin airq
//!
//! # One-shot question, no remote narrative
//! cargo run --bin airq -- --no-narrative --query "Come sarà l'aria in Europe?"
//! ```
//!
//! # Environment Variables
//!
//! - `AIRQ_CONFIG`: Configuration file (same as `--config`)
//! - `AIRQ_INPUT`, `AIRQ_OUTPUT_DIR`, `AIRQ_HORIZON`: configuration overrides
//! - `GROQ_API_KEY`: Narrative service key (name configurable)
//! - `RUST_LOG`: Log filter (default: info)

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use airq_forecast::config::AppConfig;
use airq_forecast::io::PollutantTable;
use airq_forecast::services::{
    DisabledNarrator, ForecastPipeline, NarrativeService, SvgChartRenderer,
};
use airq_forecast::shell::{
    stdin_lines, FixedResponses, ResponseStrategy, RotatingResponses, Shell,
};

#[derive(Debug, Parser)]
#[command(name = "airq", version, about = "Regional air-pollutant forecasts on request")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "AIRQ_CONFIG")]
    config: Option<PathBuf>,

    /// Input measurements table (CSV)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for chart files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Forecast horizon in years
    #[arg(long)]
    horizon: Option<u32>,

    /// Do not call the narrative service
    #[arg(long)]
    no_narrative: bool,

    /// Fit pollutants one after the other instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Answer a single question and exit
    #[arg(long)]
    query: Option<String>,
}

impl Cli {
    fn apply(&self, mut config: AppConfig) -> anyhow::Result<AppConfig> {
        if let Some(input) = &self.input {
            config.data.input = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.chart_dir = dir.clone();
        }
        if let Some(horizon) = self.horizon {
            config.forecast.horizon_years = horizon;
        }
        if self.no_narrative {
            config.narrative.enabled = false;
        }
        if self.sequential {
            config.forecast.concurrent = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn build_narrator(config: &AppConfig) -> Arc<dyn NarrativeService> {
    if !config.narrative.enabled {
        return Arc::new(DisabledNarrator::new("narrative disabled by configuration"));
    }
    let Some(key) = config.narrative_api_key() else {
        warn!(
            variable = %config.narrative.api_key_env,
            "no narrative API key set, explanations disabled"
        );
        return Arc::new(DisabledNarrator::new(format!(
            "{} is not set",
            config.narrative.api_key_env
        )));
    };
    remote_narrator(config, key)
}

#[cfg(feature = "narrative-http")]
fn remote_narrator(config: &AppConfig, key: String) -> Arc<dyn NarrativeService> {
    match airq_forecast::services::ChatCompletionNarrator::new(&config.narrative, key) {
        Ok(narrator) => Arc::new(narrator),
        Err(e) => {
            warn!(error = %e, "narrative client unavailable");
            Arc::new(DisabledNarrator::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "narrative-http"))]
fn remote_narrator(_config: &AppConfig, _key: String) -> Arc<dyn NarrativeService> {
    Arc::new(DisabledNarrator::new("built without the narrative-http feature"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = cli.apply(config).context("Invalid command-line options")?;

    info!(input = %config.data.input.display(), "Starting airq");

    let table = PollutantTable::from_path(&config.data.input, &config.data, &config.pollutants)
        .with_context(|| format!("Failed to load {}", config.data.input.display()))?;
    if table.schema().available().is_empty() {
        anyhow::bail!(
            "None of the configured pollutant columns is present in {}",
            config.data.input.display()
        );
    }

    let responses: Box<dyn ResponseStrategy> = if cli.query.is_some() {
        Box::new(FixedResponses)
    } else {
        Box::new(RotatingResponses::new())
    };
    let pipeline = ForecastPipeline::new(
        &config,
        table,
        Box::new(SvgChartRenderer::new(config.output.chart_dir.clone())),
        build_narrator(&config),
    );
    let shell = Shell::new(pipeline, responses);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.query {
        Some(query) => shell.answer_once(&query, &mut out).await?,
        None => {
            let lines = stdin_lines().context("Failed to start the input reader")?;
            shell.run(lines, &mut out).await?
        }
    }
    out.flush()?;

    Ok(())
}
