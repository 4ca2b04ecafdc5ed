//! Score calculation: maps a submitted feature vector to a rank-comparable
//! score. Pure and deterministic; strategies are data keyed by leaderboard
//! instance, so new formulas never touch the write path.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{AppError, Result};

/// Closed set of scoring formulas. Adding a formula means adding a variant
/// here, not re-teaching every caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// `number_of_payments * payment_weight + total_amount * amount_weight`
    PaymentActivity {
        payment_weight: f64,
        amount_weight: f64,
    },
    /// Linear combination over arbitrary named features.
    WeightedSum { weights: Vec<(String, f64)> },
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        ScoringStrategy::PaymentActivity {
            payment_weight: 100.0,
            amount_weight: 0.1,
        }
    }
}

/// Compute a score from a feature vector. Fails on missing or non-numeric
/// required features; never performs I/O.
pub fn compute(strategy: &ScoringStrategy, features: &HashMap<String, Value>) -> Result<f64> {
    let score = match strategy {
        ScoringStrategy::PaymentActivity {
            payment_weight,
            amount_weight,
        } => {
            let payments = numeric_feature(features, "numberOfPayments")?;
            let amount = numeric_feature(features, "totalAmount")?;
            payments * payment_weight + amount * amount_weight
        }
        ScoringStrategy::WeightedSum { weights } => {
            let mut sum = 0.0;
            for (name, weight) in weights {
                sum += numeric_feature(features, name)? * weight;
            }
            sum
        }
    };

    if !score.is_finite() {
        return Err(AppError::InvalidFeature(format!(
            "computed score is not finite: {}",
            score
        )));
    }

    Ok(score)
}

fn numeric_feature(features: &HashMap<String, Value>, name: &str) -> Result<f64> {
    let value = features
        .get(name)
        .ok_or_else(|| AppError::InvalidFeature(format!("missing required feature '{}'", name)))?;

    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            AppError::InvalidFeature(format!("feature '{}' must be a finite number", name))
        })
}

/// Per-instance strategy lookup with a default for instances that have no
/// explicit configuration.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    default: ScoringStrategy,
    overrides: HashMap<String, ScoringStrategy>,
}

impl StrategyRegistry {
    pub fn new(default: ScoringStrategy) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn register(&mut self, instance_id: impl Into<String>, strategy: ScoringStrategy) {
        self.overrides.insert(instance_id.into(), strategy);
    }

    pub fn strategy_for(&self, instance_id: &str) -> &ScoringStrategy {
        self.overrides.get(instance_id).unwrap_or(&self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn features(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn payment_activity_matches_evidenced_formula() {
        let strategy = ScoringStrategy::default();
        let feats = features(&[
            ("numberOfPayments", json!(5)),
            ("totalAmount", json!(5000)),
        ]);

        // 5 * 100 + 5000 * 0.1 == 1000 (modulo float rounding on 0.1)
        let score = compute(&strategy, &feats).unwrap();
        assert!((score - 1000.0).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn missing_feature_is_rejected() {
        let strategy = ScoringStrategy::default();
        let feats = features(&[("numberOfPayments", json!(5))]);

        let err = compute(&strategy, &feats).unwrap_err();
        assert!(matches!(err, AppError::InvalidFeature(_)));
    }

    #[test]
    fn non_numeric_feature_is_rejected() {
        let strategy = ScoringStrategy::default();
        let feats = features(&[
            ("numberOfPayments", json!("five")),
            ("totalAmount", json!(5000)),
        ]);

        assert!(matches!(
            compute(&strategy, &feats),
            Err(AppError::InvalidFeature(_))
        ));
    }

    #[test]
    fn weighted_sum_over_named_features() {
        let strategy = ScoringStrategy::WeightedSum {
            weights: vec![("wins".to_string(), 10.0), ("losses".to_string(), -5.0)],
        };
        let feats = features(&[("wins", json!(3)), ("losses", json!(2))]);

        assert_eq!(compute(&strategy, &feats).unwrap(), 20.0);
    }

    #[test]
    fn registry_falls_back_to_default() {
        let mut registry = StrategyRegistry::default();
        registry.register(
            "special",
            ScoringStrategy::WeightedSum {
                weights: vec![("points".to_string(), 1.0)],
            },
        );

        assert!(matches!(
            registry.strategy_for("special"),
            ScoringStrategy::WeightedSum { .. }
        ));
        assert!(matches!(
            registry.strategy_for("anything-else"),
            ScoringStrategy::PaymentActivity { .. }
        ));
    }
}
