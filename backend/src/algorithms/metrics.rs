//! In-sample fit metrics.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::stats::{mean, root_mean_square};
use crate::models::{FitMetrics, ForecastPoint, ObservationPoint};

/// Join actuals and predictions on timestamp and score the overlap.
///
/// Returns `None` when no timestamp is shared.
pub fn fit_metrics(actual: &[ObservationPoint], predicted: &[ForecastPoint]) -> Option<FitMetrics> {
    let by_timestamp: HashMap<NaiveDate, f64> = predicted
        .iter()
        .map(|p| (p.timestamp, p.point_estimate))
        .collect();

    let (observed, fitted): (Vec<f64>, Vec<f64>) = actual
        .iter()
        .filter_map(|a| by_timestamp.get(&a.timestamp).map(|&yhat| (a.value, yhat)))
        .unzip();

    if observed.is_empty() {
        return None;
    }

    let residuals: Vec<f64> = observed.iter().zip(&fitted).map(|(y, f)| y - f).collect();

    Some(FitMetrics {
        mean_absolute_error: mean(&residuals.iter().map(|r| r.abs()).collect::<Vec<_>>()),
        root_mean_squared_error: root_mean_square(&residuals),
        r_squared: r_squared(&observed, &residuals),
        samples: observed.len(),
    })
}

/// Coefficient of determination.
///
/// With constant actuals the ratio is undefined: a perfect fit scores 1.0 and
/// anything else 0.0.
fn r_squared(observed: &[f64], residuals: &[f64]) -> f64 {
    let center = mean(observed);
    let ss_tot: f64 = observed.iter().map(|y| (y - center).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::year_start;
    use approx::assert_relative_eq;

    fn actual(year: i32, value: f64) -> ObservationPoint {
        ObservationPoint::new(year_start(year).unwrap(), value)
    }

    fn predicted(year: i32, value: f64) -> ForecastPoint {
        ForecastPoint {
            timestamp: year_start(year).unwrap(),
            point_estimate: value,
            lower_bound: value,
            upper_bound: value,
        }
    }

    #[test]
    fn test_perfect_fit() {
        let a = vec![actual(2010, 1.0), actual(2011, 2.0), actual(2012, 4.0)];
        let p = vec![predicted(2010, 1.0), predicted(2011, 2.0), predicted(2012, 4.0)];
        let m = fit_metrics(&a, &p).unwrap();
        assert_eq!(m.mean_absolute_error, 0.0);
        assert_eq!(m.r_squared, 1.0);
        assert_eq!(m.samples, 3);
    }

    #[test]
    fn test_known_values() {
        let a = vec![actual(2010, 3.0), actual(2011, 5.0), actual(2012, 7.0)];
        let p = vec![predicted(2010, 4.0), predicted(2011, 5.0), predicted(2012, 6.0)];
        let m = fit_metrics(&a, &p).unwrap();
        assert_relative_eq!(m.mean_absolute_error, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.root_mean_squared_error, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        // ss_res = 2, ss_tot = 8
        assert_relative_eq!(m.r_squared, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_only_shared_timestamps_count() {
        let a = vec![actual(2010, 1.0), actual(2011, 100.0)];
        let p = vec![predicted(2010, 1.0), predicted(2020, 5.0)];
        let m = fit_metrics(&a, &p).unwrap();
        assert_eq!(m.samples, 1);
        assert_eq!(m.mean_absolute_error, 0.0);
    }

    #[test]
    fn test_no_overlap() {
        let a = vec![actual(2010, 1.0)];
        let p = vec![predicted(2011, 1.0)];
        assert!(fit_metrics(&a, &p).is_none());
    }

    #[test]
    fn test_negative_r_squared_for_bad_fit() {
        let a = vec![actual(2010, 1.0), actual(2011, 2.0)];
        let p = vec![predicted(2010, 10.0), predicted(2011, -10.0)];
        let m = fit_metrics(&a, &p).unwrap();
        assert!(m.r_squared < 0.0);
    }

    #[test]
    fn test_constant_actuals_imperfect_fit() {
        let a = vec![actual(2010, 2.0), actual(2011, 2.0)];
        let p = vec![predicted(2010, 2.5), predicted(2011, 2.0)];
        let m = fit_metrics(&a, &p).unwrap();
        assert_eq!(m.r_squared, 0.0);
    }
}
