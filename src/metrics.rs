//! Error metrics over paired actual/forecast sequences.
//!
//! All functions expect two equal-length slices with no missing values;
//! callers filter out pairs where either side is absent before scoring.
//! An empty input yields `None` rather than an error, and so does MAPE
//! when every actual value is zero.

/// Mean Absolute Error.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn mae(actual: &[f64], forecast: &[f64]) -> Option<f64> {
    assert_eq!(actual.len(), forecast.len());
    if actual.is_empty() {
        return None;
    }

    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();

    Some(sum / actual.len() as f64)
}

/// Root Mean Squared Error.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn rmse(actual: &[f64], forecast: &[f64]) -> Option<f64> {
    assert_eq!(actual.len(), forecast.len());
    if actual.is_empty() {
        return None;
    }

    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f) * (a - f))
        .sum();

    Some((sum / actual.len() as f64).sqrt())
}

/// Mean Absolute Percentage Error, in percent.
///
/// Pairs with a zero actual value are excluded since the relative error is
/// undefined there. If no pair has a non-zero actual the whole metric is
/// undefined and `None` is returned.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn mape(actual: &[f64], forecast: &[f64]) -> Option<f64> {
    assert_eq!(actual.len(), forecast.len());

    let mut sum = 0.0;
    let mut n = 0usize;
    for (a, f) in actual.iter().zip(forecast.iter()) {
        if *a != 0.0 {
            sum += ((a - f) / a).abs();
            n += 1;
        }
    }

    if n == 0 {
        None
    } else {
        Some(sum / n as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let actual = [10.0, 10.0, 14.0];
        let forecast = [10.0, 11.0, 12.0];

        assert!((mae(&actual, &forecast).unwrap() - 1.0).abs() < 1e-12);
        let expected_rmse = (5.0f64 / 3.0).sqrt();
        assert!((rmse(&actual, &forecast).unwrap() - expected_rmse).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_forecast_scores_zero() {
        let x = [1.5, -2.0, 0.0, 42.0];
        assert_eq!(mae(&x, &x), Some(0.0));
        assert_eq!(rmse(&x, &x), Some(0.0));
    }

    #[test]
    fn test_rmse_dominates_mae() {
        let cases: [(&[f64], &[f64]); 3] = [
            (&[1.0, 2.0, 3.0], &[1.5, 1.0, 5.0]),
            (&[0.0, 0.0], &[10.0, -10.0]),
            (&[5.0], &[7.0]),
        ];
        for (actual, forecast) in cases {
            let mae = mae(actual, forecast).unwrap();
            let rmse = rmse(actual, forecast).unwrap();
            assert!(rmse >= mae, "rmse {} < mae {}", rmse, mae);
            assert!(mae >= 0.0);
        }
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        // Only the pairs with non-zero actuals contribute: |10-8|/10 and |5-6|/5
        let actual = [10.0, 0.0, 5.0];
        let forecast = [8.0, 3.0, 6.0];
        let expected = (0.2 + 0.2) / 2.0 * 100.0;
        assert!((mape(&actual, &forecast).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_mape_undefined_for_all_zero_actuals() {
        assert_eq!(mape(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_empty_input_is_undefined() {
        assert_eq!(mae(&[], &[]), None);
        assert_eq!(rmse(&[], &[]), None);
        assert_eq!(mape(&[], &[]), None);
    }
}
