//! Service layer: the forecast path, the query resolver and the collaborators
//! that turn results into charts and explanations.
//!
//! Data flows `series_preparer` -> `forecast_engine` -> `orchestrator`, and
//! `pipeline` ties the orchestrator to the resolver, the chart renderer and
//! the narrative service for the shell.

pub mod chart;
pub mod forecast_engine;
pub mod intent_resolver;
pub mod narrative;
pub mod orchestrator;
pub mod pipeline;
pub mod series_preparer;

pub use chart::{chart_file_name, sanitize_component, ChartRenderer, SvgChartRenderer};
pub use forecast_engine::ForecastEngine;
pub use intent_resolver::IntentResolver;
#[cfg(feature = "narrative-http")]
pub use narrative::ChatCompletionNarrator;
pub use narrative::{build_prompt, with_retry, DisabledNarrator, NarrativeRequest, NarrativeService};
pub use orchestrator::{ForecastOrchestrator, PollutantOutcome};
pub use pipeline::{build_catalog, ForecastArtifacts, ForecastPipeline, PollutantReport};
pub use series_preparer::prepare;
