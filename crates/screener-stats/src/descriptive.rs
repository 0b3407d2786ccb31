//! Descriptive statistics.

use statrs::statistics::Statistics;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Standard deviation over mean; `0.0` when the mean is zero or undefined.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    match (mean(values), sample_std_dev(values)) {
        (Some(m), Some(sd)) if m != 0.0 => sd / m,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        assert!((mean(&data).unwrap() - 5.0).abs() < 1e-9);
        // sample std of the classic example is sqrt(32/7)
        assert!((sample_std_dev(&data).unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_small_inputs() {
        assert!(mean(&[]).is_none());
        assert!(sample_std_dev(&[1.0]).is_none());
        assert_eq!(coefficient_of_variation(&[5.0]), 0.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let data = [10.0, 20.0, 30.0];
        // mean 20, sample std 10
        assert!((coefficient_of_variation(&data) - 0.5).abs() < 1e-9);
        assert_eq!(coefficient_of_variation(&[-1.0, 1.0]), 0.0);
    }
}
