//! Additive trend + seasonality regression model.
//!
//! `value(x) = trend(x) + seasonal(x) + noise`, with `x` a decimal year.
//!
//! The trend is piecewise linear. Candidate changepoints are spread uniformly
//! over the first `changepoint_range` share of the observations and the slope
//! change at each one is shrunk by a ridge penalty, so the curve bends only
//! where the data insists.
//!
//! The seasonal part is a Fourier series with period `period_years`. A
//! Fourier column that is constant over the observed timestamps carries no
//! information (every column is, for yearly samples with a one-year period)
//! and is dropped; the component then evaluates to zero everywhere.
//!
//! Uncertainty past the last observation follows the changepoint process:
//! slope changes keep arriving at the historical rate with the historical mean
//! magnitude, which makes the trend variance grow with the cube of the
//! distance from the last observation.

use std::f64::consts::PI;

use tracing::debug;

use super::linalg::ridge_fit;
use crate::config::ForecastSettings;
use crate::error::ForecastError;

/// Penalty on Fourier coefficients; small, it only breaks collinearity.
const SEASONAL_PENALTY: f64 = 0.01;

/// Columns whose spread is below this are treated as constant.
const DEGENERATE_SPREAD: f64 = 1e-9;

/// Structural settings of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub changepoint_range: f64,
    pub max_changepoints: usize,
    pub changepoint_penalty: f64,
    pub period_years: f64,
    pub fourier_order: usize,
}

impl From<&ForecastSettings> for ModelSpec {
    fn from(settings: &ForecastSettings) -> Self {
        Self {
            changepoint_range: settings.changepoint_range,
            max_changepoints: settings.max_changepoints,
            changepoint_penalty: settings.changepoint_penalty,
            period_years: settings.seasonality_period_years,
            fourier_order: settings.seasonality_fourier_order,
        }
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::from(&ForecastSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Wave {
    Sin,
    Cos,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FourierTerm {
    order: usize,
    wave: Wave,
}

impl FourierTerm {
    fn eval(&self, x: f64, period: f64) -> f64 {
        // Reduce to the phase first so large year values keep full precision.
        let phase = (x / period).rem_euclid(1.0);
        let angle = 2.0 * PI * self.order as f64 * phase;
        match self.wave {
            Wave::Sin => angle.sin(),
            Wave::Cos => angle.cos(),
        }
    }
}

/// A fitted additive model.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveModel {
    origin: f64,
    span: f64,
    y_scale: f64,
    intercept: f64,
    slope: f64,
    /// Changepoint locations on the scaled `[0, 1]` axis.
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
    period: f64,
    seasonal_terms: Vec<FourierTerm>,
    seasonal_coefs: Vec<f64>,
    sigma: f64,
}

impl AdditiveModel {
    /// Fit the model to `(times, values)`; `times` must be strictly increasing.
    pub fn fit(times: &[f64], values: &[f64], spec: &ModelSpec) -> Result<Self, ForecastError> {
        let n = times.len();
        if n != values.len() {
            return Err(ForecastError::fit(format!(
                "{} timestamps but {} values",
                n,
                values.len()
            )));
        }
        if n < 2 {
            return Err(ForecastError::fit(format!(
                "at least 2 observations are required, got {}",
                n
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::fit("series contains non-finite values"));
        }

        let origin = times[0];
        let span = times[n - 1] - origin;
        if !(span > 0.0) {
            return Err(ForecastError::fit("observations must cover more than one instant"));
        }

        let first = values[0];
        if values.iter().all(|&v| v == first) {
            debug!(level = first, "constant series, fitting flat model");
            return Ok(Self::flat(origin, span, first, spec.period_years));
        }

        let y_scale = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let scaled_t: Vec<f64> = times.iter().map(|x| (x - origin) / span).collect();
        let scaled_y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = place_changepoints(&scaled_t, spec);
        let seasonal_terms = informative_terms(times, spec);

        let design: Vec<Vec<f64>> = times
            .iter()
            .zip(&scaled_t)
            .map(|(&x, &t)| {
                let mut row = Vec::with_capacity(2 + changepoints.len() + seasonal_terms.len());
                row.push(1.0);
                row.push(t);
                row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
                row.extend(seasonal_terms.iter().map(|term| term.eval(x, spec.period_years)));
                row
            })
            .collect();

        let mut penalty = vec![0.0, 0.0];
        penalty.extend(std::iter::repeat(spec.changepoint_penalty).take(changepoints.len()));
        penalty.extend(std::iter::repeat(SEASONAL_PENALTY).take(seasonal_terms.len()));

        let coef = ridge_fit(&design, &scaled_y, &penalty)
            .ok_or_else(|| ForecastError::fit("normal equations are not positive definite"))?;

        let k = changepoints.len();
        let mut model = Self {
            origin,
            span,
            y_scale,
            intercept: coef[0],
            slope: coef[1],
            deltas: coef[2..2 + k].to_vec(),
            changepoints,
            period: spec.period_years,
            seasonal_terms,
            seasonal_coefs: coef[2 + k..].to_vec(),
            sigma: 0.0,
        };

        let residuals: Vec<f64> = times
            .iter()
            .zip(values)
            .map(|(&x, &y)| y - model.predict(x))
            .collect();
        model.sigma = (residuals.iter().map(|r| r * r).sum::<f64>() / n as f64).sqrt();

        if model.coefficients_finite() {
            debug!(
                changepoints = model.changepoints.len(),
                seasonal_terms = model.seasonal_terms.len(),
                sigma = model.sigma,
                "fitted additive model"
            );
            Ok(model)
        } else {
            Err(ForecastError::fit("fit produced non-finite coefficients"))
        }
    }

    fn flat(origin: f64, span: f64, level: f64, period: f64) -> Self {
        Self {
            origin,
            span,
            y_scale: 1.0,
            intercept: level,
            slope: 0.0,
            changepoints: Vec::new(),
            deltas: Vec::new(),
            period,
            seasonal_terms: Vec::new(),
            seasonal_coefs: Vec::new(),
            sigma: 0.0,
        }
    }

    fn coefficients_finite(&self) -> bool {
        self.intercept.is_finite()
            && self.slope.is_finite()
            && self.deltas.iter().all(|d| d.is_finite())
            && self.seasonal_coefs.iter().all(|c| c.is_finite())
            && self.sigma.is_finite()
    }

    fn scaled_time(&self, x: f64) -> f64 {
        (x - self.origin) / self.span
    }

    /// Trend component at decimal year `x`.
    pub fn trend(&self, x: f64) -> f64 {
        let t = self.scaled_time(x);
        let bends: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(&s, &d)| d * (t - s).max(0.0))
            .sum();
        (self.intercept + self.slope * t + bends) * self.y_scale
    }

    /// Seasonal component at decimal year `x`; zero when no term survived.
    pub fn seasonal(&self, x: f64) -> f64 {
        let sum: f64 = self
            .seasonal_terms
            .iter()
            .zip(&self.seasonal_coefs)
            .map(|(term, c)| c * term.eval(x, self.period))
            .sum();
        sum * self.y_scale
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.trend(x) + self.seasonal(x)
    }

    /// In-sample residual standard deviation, in data units.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Decimal year of the last observation.
    pub fn last_time(&self) -> f64 {
        self.origin + self.span
    }

    pub fn changepoint_count(&self) -> usize {
        self.changepoints.len()
    }

    pub fn seasonal_term_count(&self) -> usize {
        self.seasonal_terms.len()
    }

    /// Variance added to the trend at `x` by future slope changes.
    ///
    /// Zero up to the last observation and non-decreasing after it. A history
    /// too short for changepoints assumes one slope change per span, as large
    /// as the fitted slope itself; a flat model stays certain.
    pub fn trend_variance(&self, x: f64) -> f64 {
        let h = self.scaled_time(x) - 1.0;
        if h <= 0.0 {
            return 0.0;
        }
        let (rate, scale) = if self.deltas.is_empty() {
            (1.0, self.slope.abs())
        } else {
            let mean = self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64;
            (self.changepoints.len() as f64, mean)
        };
        // Laplace(0, b) slope changes have variance 2 b^2; integrating the
        // resulting slope random walk over (0, h] gives h^3 / 3.
        rate * 2.0 * scale * scale * h.powi(3) / 3.0 * self.y_scale * self.y_scale
    }
}

/// Uniformly spaced changepoints over the first `changepoint_range` of the
/// observations, excluding the first one.
fn place_changepoints(scaled_t: &[f64], spec: &ModelSpec) -> Vec<f64> {
    let hist_size = (scaled_t.len() as f64 * spec.changepoint_range).floor() as usize;
    if hist_size < 2 {
        return Vec::new();
    }
    let count = spec.max_changepoints.min(hist_size - 1);
    if count == 0 {
        return Vec::new();
    }

    let step = (hist_size - 1) as f64 / count as f64;
    let mut points: Vec<f64> = (1..=count)
        .map(|i| scaled_t[(i as f64 * step).round() as usize])
        .collect();
    points.dedup();
    points
}

/// Fourier terms that vary over the observed timestamps.
fn informative_terms(times: &[f64], spec: &ModelSpec) -> Vec<FourierTerm> {
    let mut terms = Vec::new();
    for order in 1..=spec.fourier_order {
        for wave in [Wave::Sin, Wave::Cos] {
            let term = FourierTerm { order, wave };
            let (lo, hi) = times
                .iter()
                .map(|&x| term.eval(x, spec.period_years))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if hi - lo > DEGENERATE_SPREAD {
                terms.push(term);
            }
        }
    }
    terms
}
