//! Indicator trait definitions.

use crate::error::StatsError;

/// Trait for series transforms used by the screeners.
///
/// Indicators process a numeric series (closes, revenues, estimates) and
/// produce derived values.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input series, oldest first
    ///
    /// # Returns
    /// A vector of indicator values
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), StatsError> {
        if data.len() < self.period() {
            return Err(StatsError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestIndicator {
        period: usize,
    }

    impl Indicator for TestIndicator {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            // Simple sum indicator for testing
            data.windows(self.period)
                .map(|w| w.iter().sum())
                .collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = TestIndicator { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_indicator_calculate() {
        let indicator = TestIndicator { period: 3 };
        let result = indicator.calculate(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(result.len(), 2);
        assert!((result[0] - 6.0).abs() < 0.001); // 1+2+3
        assert!((result[1] - 9.0).abs() < 0.001); // 2+3+4
    }
}
