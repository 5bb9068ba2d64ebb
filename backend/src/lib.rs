//! # airq-forecast
//!
//! Regional air-pollutant trend forecasting with a conversational front end.
//!
//! A question such as "Come sarà l'aria in Europe?" is resolved to one known
//! region, every tracked pollutant of that region is turned into a yearly
//! series, fitted with an additive trend + seasonality model and projected a
//! configurable number of years ahead with uncertainty bounds. Each forecast
//! is rendered to a chart and, when a narrative service is configured,
//! explained in plain language.
//!
//! ## Architecture
//!
//! - [`config`]: TOML configuration with environment overrides
//! - [`error`]: error taxonomy shared by every layer
//! - [`models`]: series, forecast and region types
//! - [`io`]: CSV ingestion and schema validation
//! - [`algorithms`]: regression, statistics, fit metrics and string similarity
//! - [`services`]: series preparation, forecasting, query resolution,
//!   orchestration, charts and narratives
//! - [`shell`]: the interactive line-oriented front end
//!
//! ## Example
//!
//! ```no_run
//! use airq_forecast::config::AppConfig;
//! use airq_forecast::io::PollutantTable;
//! use airq_forecast::services::{prepare, ForecastEngine};
//!
//! let config = AppConfig::default();
//! let table = PollutantTable::from_path(&config.data.input, &config.data, &config.pollutants)?;
//! let series = prepare(&table, "European Region", &config.pollutants[0])?;
//! let result = ForecastEngine::new(&config.forecast).fit_and_forecast(series, 10)?;
//! println!("MAE {:.2}", result.metrics.mean_absolute_error);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod services;
pub mod shell;

pub use config::AppConfig;
pub use error::{ConfigError, DataError, ExternalServiceError, ForecastError, QueryError};
