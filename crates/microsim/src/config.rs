//! Numeric tolerances shared by the simulations.

use thiserror::Error;

use microsim_linalg::CONDITION_SENTINEL;

/// Thresholds used to classify near-zero values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Below this, determinants and singular values count as zero in the kernel routines.
    pub epsilon: f64,
    /// Condition numbers at or above this are reported as infinite.
    pub condition_sentinel: f64,
    /// Power iterations per extracted SVD component.
    pub svd_iterations: usize,
    /// Coarser threshold used where the user edits values by hand: pivots, residuals and
    /// determinants below it are shown as zero.
    pub singular_display: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            epsilon: 1e-10,
            condition_sentinel: CONDITION_SENTINEL,
            svd_iterations: 20,
            singular_display: 1e-4,
        }
    }
}

impl Tolerances {
    /// Checks that every threshold is finite and positive.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NotPositive { name, value })
            }
        };
        positive("epsilon", self.epsilon)?;
        positive("condition_sentinel", self.condition_sentinel)?;
        positive("singular_display", self.singular_display)?;
        if self.svd_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tolerance `{name}` must be finite and positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },
    #[error("SVD iteration count must be at least 1")]
    ZeroIterations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let tol = Tolerances::default();
        assert_eq!(tol.epsilon, 1e-10);
        assert_eq!(tol.condition_sentinel, 1e10);
        assert_eq!(tol.svd_iterations, 20);
        assert_eq!(tol.singular_display, 1e-4);
        tol.validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let tol = Tolerances {
            singular_display: -1.0,
            ..Tolerances::default()
        };
        assert_eq!(
            tol.validate(),
            Err(ConfigError::NotPositive {
                name: "singular_display",
                value: -1.0
            })
        );

        let tol = Tolerances {
            epsilon: f64::NAN,
            ..Tolerances::default()
        };
        assert!(matches!(
            tol.validate(),
            Err(ConfigError::NotPositive {
                name: "epsilon",
                ..
            })
        ));

        let tol = Tolerances {
            svd_iterations: 0,
            ..Tolerances::default()
        };
        assert_eq!(tol.validate(), Err(ConfigError::ZeroIterations));
        assert_eq!(
            ConfigError::ZeroIterations.to_string(),
            "SVD iteration count must be at least 1"
        );
    }
}
