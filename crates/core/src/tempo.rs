//! Tempo planning for ffmpeg's `atempo` filter.
//!
//! A single `atempo` instance only accepts factors in `[0.5, 2.0]`, so larger
//! or smaller speed changes are split into a chain of bounded stages whose
//! product is the requested multiplier. The chain is rendered as one filter
//! expression and applied in a single ffmpeg pass.

use thiserror::Error;

/// Smallest factor one `atempo` stage accepts.
pub const MIN_STAGE: f64 = 0.5;

/// Largest factor one `atempo` stage accepts.
pub const MAX_STAGE: f64 = 2.0;

/// Errors produced while planning a tempo chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TempoError {
    /// The multiplier is zero, negative, or not a finite number.
    #[error("Speed multiplier must be a positive finite number, got {0}")]
    InvalidMultiplier(f64),
}

/// Splits `multiplier` into `atempo` stages, each within `[0.5, 2.0]`.
///
/// Returns an empty list for exactly `1.0`: no processing is needed.
pub fn plan_stages(multiplier: f64) -> Result<Vec<f64>, TempoError> {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(TempoError::InvalidMultiplier(multiplier));
    }

    if multiplier == 1.0 {
        return Ok(Vec::new());
    }

    if (MIN_STAGE..=MAX_STAGE).contains(&multiplier) {
        return Ok(vec![multiplier]);
    }

    let mut stages = Vec::new();
    let mut remaining = multiplier;

    if multiplier > MAX_STAGE {
        while remaining > MAX_STAGE {
            stages.push(MAX_STAGE);
            remaining /= MAX_STAGE;
        }
        // A remainder of exactly 1.0 adds nothing.
        if remaining > 1.0 {
            stages.push(remaining);
        }
    } else {
        while remaining < MIN_STAGE {
            stages.push(MIN_STAGE);
            remaining /= MIN_STAGE;
        }
        if remaining < 1.0 {
            stages.push(remaining);
        }
    }

    Ok(stages)
}

/// A planned sequence of tempo stages for one speed multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoChain {
    multiplier: f64,
    stages: Vec<f64>,
}

impl TempoChain {
    /// Plans the chain for `multiplier`.
    pub fn plan(multiplier: f64) -> Result<Self, TempoError> {
        Ok(Self {
            multiplier,
            stages: plan_stages(multiplier)?,
        })
    }

    /// The requested multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// The bounded per-stage factors, in application order.
    pub fn stages(&self) -> &[f64] {
        &self.stages
    }

    /// True when the chain would not change the audio at all.
    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    /// Product of all stages.
    pub fn product(&self) -> f64 {
        self.stages.iter().product()
    }

    /// The ffmpeg audio filter expression, e.g. `atempo=2.0000,atempo=1.5000`.
    ///
    /// `None` for an identity chain.
    pub fn filter_expression(&self) -> Option<String> {
        if self.is_identity() {
            return None;
        }
        Some(
            self.stages
                .iter()
                .map(|stage| format!("atempo={:.4}", stage))
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_single_stage() {
        assert_eq!(plan_stages(1.75).unwrap(), vec![1.75]);
        assert_eq!(plan_stages(0.5).unwrap(), vec![0.5]);
        assert_eq!(plan_stages(2.0).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_identity_has_no_stages() {
        assert!(plan_stages(1.0).unwrap().is_empty());

        let chain = TempoChain::plan(1.0).unwrap();
        assert!(chain.is_identity());
        assert_eq!(chain.filter_expression(), None);
    }

    #[test]
    fn test_three_times() {
        assert_eq!(plan_stages(3.0).unwrap(), vec![2.0, 1.5]);
    }

    #[test]
    fn test_quarter_speed() {
        assert_eq!(plan_stages(0.25).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_exact_power_of_two_has_no_trailing_one() {
        assert_eq!(plan_stages(4.0).unwrap(), vec![2.0, 2.0]);
        assert_eq!(plan_stages(8.0).unwrap(), vec![2.0, 2.0, 2.0]);
        assert_eq!(plan_stages(0.125).unwrap(), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_rejects_invalid_multipliers() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                plan_stages(bad),
                Err(TempoError::InvalidMultiplier(_))
            ));
        }
    }

    #[test]
    fn test_product_and_bounds_hold_across_range() {
        // 0.01 ..= 10.00 in steps of 0.01
        for step in 1..=1000 {
            let m = step as f64 / 100.0;
            let stages = plan_stages(m).unwrap();
            let product: f64 = stages.iter().product();
            assert!(
                (product - m).abs() < 1e-3,
                "product {} != {} for stages {:?}",
                product,
                m,
                stages
            );
            for stage in &stages {
                assert!(
                    (MIN_STAGE..=MAX_STAGE).contains(stage),
                    "stage {} out of range for {}",
                    stage,
                    m
                );
            }
        }
    }

    #[test]
    fn test_filter_expression_joins_stages() {
        let chain = TempoChain::plan(3.0).unwrap();
        assert_eq!(
            chain.filter_expression().unwrap(),
            "atempo=2.0000,atempo=1.5000"
        );
        assert_eq!(chain.multiplier(), 3.0);
        assert!((chain.product() - 3.0).abs() < 1e-9);
    }
}
