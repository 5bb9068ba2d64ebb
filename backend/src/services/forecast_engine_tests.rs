use super::*;
use crate::models::time::year_start;
use crate::models::{ObservationPoint, Pollutant, SeriesKey};
use approx::assert_relative_eq;
use proptest::prelude::*;

fn series_from(start_year: i32, values: &[f64]) -> Series {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, &v)| ObservationPoint::new(year_start(start_year + i as i32).unwrap(), v))
        .collect();
    Series::new(
        SeriesKey::new("European Region", Pollutant::new("pm10", "PM10 (μg/m3)")),
        points,
    )
    .unwrap()
}

fn engine() -> ForecastEngine {
    ForecastEngine::new(&ForecastSettings::default())
}

#[test]
fn test_future_starts_at_last_observation() {
    let series = series_from(2010, &[30.0, 28.5, 29.0, 27.0, 26.5, 25.0, 24.8, 23.9]);
    let last = series.last().unwrap().timestamp;

    let result = engine().fit_and_forecast(series, 10).unwrap();

    assert_eq!(result.future.len(), 11);
    assert_eq!(result.future[0].timestamp, last);
    assert_eq!(result.last_future().unwrap().timestamp, year_start(2027).unwrap());
    assert!(result
        .future
        .windows(2)
        .all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn test_components_cover_full_timeline() {
    let series = series_from(2010, &[30.0, 28.5, 29.0, 27.0, 26.5]);
    let result = engine().fit_and_forecast(series, 3).unwrap();

    assert_eq!(result.components.len(), 5 + 3);
    for (component, point) in result.components[4..].iter().zip(&result.future) {
        assert_eq!(component.timestamp, point.timestamp);
        assert_relative_eq!(
            component.trend + component.seasonal,
            point.point_estimate,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_yearly_series_has_zero_seasonal_component() {
    let series = series_from(2010, &[12.0, 15.0, 11.0, 16.0, 13.0, 14.0]);
    let result = engine().fit_and_forecast(series, 4).unwrap();
    assert!(result.components.iter().all(|c| c.seasonal == 0.0));
}

#[test]
fn test_interval_widths_do_not_shrink() {
    let series = series_from(
        2005,
        &[40.0, 38.0, 41.0, 36.0, 35.0, 37.0, 33.0, 30.0, 31.0, 28.0, 29.0, 26.0],
    );
    let result = engine().fit_and_forecast(series, 10).unwrap();

    for point in &result.future {
        assert!(point.lower_bound <= point.point_estimate);
        assert!(point.point_estimate <= point.upper_bound);
    }
    for pair in result.future.windows(2) {
        assert!(pair[1].interval_width() >= pair[0].interval_width());
    }
}

#[test]
fn test_constant_series_is_flat_and_exact() {
    let series = series_from(2010, &[5.0, 5.0, 5.0, 5.0, 5.0]);
    let result = engine().fit_and_forecast(series, 6).unwrap();

    assert_eq!(result.metrics.mean_absolute_error, 0.0);
    assert_eq!(result.metrics.r_squared, 1.0);
    assert_eq!(result.metrics.samples, 5);
    for point in &result.future {
        assert_eq!(point.point_estimate, 5.0);
        assert_eq!(point.interval_width(), 0.0);
    }
}

#[test]
fn test_linear_series_scores_well() {
    let values: Vec<f64> = (0..12).map(|i| 60.0 - 2.0 * i as f64).collect();
    let result = engine().fit_and_forecast(series_from(2008, &values), 5).unwrap();

    assert!(result.metrics.mean_absolute_error < 1e-6);
    assert_relative_eq!(result.metrics.r_squared, 1.0, epsilon = 1e-9);
    assert_relative_eq!(
        result.last_future().unwrap().point_estimate,
        60.0 - 2.0 * 16.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_single_point_fails() {
    let err = engine()
        .fit_and_forecast(series_from(2010, &[5.0]), 10)
        .unwrap_err();
    assert!(matches!(err, ForecastError::FitFailure(_)));
}

#[test]
fn test_zero_horizon_fails() {
    let err = engine()
        .fit_and_forecast(series_from(2010, &[5.0, 6.0, 7.0]), 0)
        .unwrap_err();
    assert!(matches!(err, ForecastError::FitFailure(_)));
}

#[test]
fn test_two_points_are_enough() {
    let result = engine()
        .fit_and_forecast(series_from(2018, &[10.0, 12.0]), 2)
        .unwrap();
    assert_eq!(result.future.len(), 3);
    assert_relative_eq!(result.future[2].point_estimate, 16.0, epsilon = 1e-9);
    // An exact two-point fit still gets wider bands the further it reaches.
    assert_eq!(result.future[0].interval_width(), 0.0);
    assert!(result.future[1].interval_width() > 0.0);
    assert!(result.future[2].interval_width() > result.future[1].interval_width());
}

#[test]
fn test_wider_interval_setting_widens_bands() {
    let values = [20.0, 23.0, 19.0, 24.0, 18.0, 25.0, 21.0];
    let narrow = ForecastEngine::new(&ForecastSettings {
        interval_width: 0.5,
        ..ForecastSettings::default()
    });
    let wide = ForecastEngine::new(&ForecastSettings {
        interval_width: 0.95,
        ..ForecastSettings::default()
    });

    let a = narrow.fit_and_forecast(series_from(2010, &values), 3).unwrap();
    let b = wide.fit_and_forecast(series_from(2010, &values), 3).unwrap();
    assert!(b.future[0].interval_width() > a.future[0].interval_width());
}

proptest! {
    #[test]
    fn prop_forecast_shape_holds(
        values in prop::collection::vec(0.0f64..200.0, 2..25),
        horizon in 1u32..15,
    ) {
        let n = values.len();
        let result = engine().fit_and_forecast(series_from(1990, &values), horizon).unwrap();

        prop_assert_eq!(result.future.len(), horizon as usize + 1);
        prop_assert_eq!(result.future[0].timestamp, year_start(1990 + n as i32 - 1).unwrap());
        prop_assert_eq!(result.metrics.samples, n);
        prop_assert!(result.metrics.mean_absolute_error >= 0.0);
        prop_assert!(result.metrics.r_squared <= 1.0 + 1e-9);
        for pair in result.future.windows(2) {
            prop_assert!(pair[1].interval_width() + 1e-9 >= pair[0].interval_width());
        }
    }
}
