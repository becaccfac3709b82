//! Complex risk aggregation parameters.
//!
//! Every multiplier table the aggregator consults lives here so the
//! audit breakdown can reference the exact configured values.

use mas_common::Typology;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contextual role of the account/trader under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TraderRole {
    Executive,
    SeniorTrader,
    Trader,
    Analyst,
    BackOffice,
}

/// Horizon of the activity window being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Intraday,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

/// Volume-ratio steps: a ratio at or above `threshold` applies
/// `multiplier`. Evaluated highest threshold first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VolumeStep {
    pub threshold: f64,
    pub multiplier: f64,
}

/// Additive behavioral bumps, summed on top of 1.0 and capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BehavioralBumps {
    /// Per insider indicator, up to `max_insider_indicators`.
    pub per_insider_indicator: f64,
    pub max_insider_indicators: usize,
    pub pre_event_trading: f64,
    pub timing_concentration: f64,
    pub high_cancellation_ratio: f64,
    /// Cancellation ratio at or above this counts as high.
    pub cancellation_threshold: f64,
    /// Cap on the behavioral multiplier as a whole.
    pub cap: f64,
}

impl Default for BehavioralBumps {
    fn default() -> Self {
        BehavioralBumps {
            per_insider_indicator: 0.15,
            max_insider_indicators: 3,
            pre_event_trading: 0.20,
            timing_concentration: 0.15,
            high_cancellation_ratio: 0.20,
            cancellation_threshold: 0.70,
            cap: 2.0,
        }
    }
}

/// News-context suppression factors applied to raw typology scores
/// before contextual multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewsSuppressionFactors {
    pub fully_explained: f64,
    pub partially_explained: f64,
    pub unexplained: f64,
}

impl Default for NewsSuppressionFactors {
    fn default() -> Self {
        NewsSuppressionFactors {
            fully_explained: 0.5,
            partially_explained: 0.75,
            unexplained: 1.0,
        }
    }
}

/// Full aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregationConfig {
    /// Per-typology weights over Bayesian scores. Must sum to 1.0 over
    /// the typologies actually scored.
    pub typology_weights: BTreeMap<Typology, f64>,
    pub role_multipliers: BTreeMap<TraderRole, f64>,
    /// Highest-threshold-first volume steps; ratio below all steps
    /// means a neutral 1.0.
    pub volume_steps: Vec<VolumeStep>,
    pub timeframe_multipliers: BTreeMap<Timeframe, f64>,
    /// Clamp bounds for the market-conditions multiplier.
    pub market_conditions_clamp: (f64, f64),
    #[serde(default)]
    pub behavioral: BehavioralBumps,
    #[serde(default)]
    pub news_suppression: NewsSuppressionFactors,
    /// Risk-level band thresholds (medium, high).
    pub risk_thresholds: (f64, f64),
}

impl Default for AggregationConfig {
    fn default() -> Self {
        let mut typology_weights = BTreeMap::new();
        typology_weights.insert(Typology::InsiderDealing, 0.6);
        typology_weights.insert(Typology::Spoofing, 0.4);

        let mut role_multipliers = BTreeMap::new();
        role_multipliers.insert(TraderRole::Executive, 1.5);
        role_multipliers.insert(TraderRole::SeniorTrader, 1.3);
        role_multipliers.insert(TraderRole::Trader, 1.0);
        role_multipliers.insert(TraderRole::Analyst, 1.1);
        role_multipliers.insert(TraderRole::BackOffice, 0.8);

        let mut timeframe_multipliers = BTreeMap::new();
        timeframe_multipliers.insert(Timeframe::Intraday, 1.2);
        timeframe_multipliers.insert(Timeframe::ShortTerm, 1.1);
        timeframe_multipliers.insert(Timeframe::MediumTerm, 1.0);
        timeframe_multipliers.insert(Timeframe::LongTerm, 0.9);

        AggregationConfig {
            typology_weights,
            role_multipliers,
            volume_steps: vec![
                VolumeStep {
                    threshold: 5.0,
                    multiplier: 1.4,
                },
                VolumeStep {
                    threshold: 2.0,
                    multiplier: 1.2,
                },
            ],
            timeframe_multipliers,
            market_conditions_clamp: (0.5, 2.0),
            behavioral: BehavioralBumps::default(),
            news_suppression: NewsSuppressionFactors::default(),
            risk_thresholds: (0.4, 0.7),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_typology_weights_sum_to_one() {
        let cfg = AggregationConfig::default();
        let sum: f64 = cfg.typology_weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_volume_steps_highest_first() {
        let cfg = AggregationConfig::default();
        for pair in cfg.volume_steps.windows(2) {
            assert!(pair[0].threshold > pair[1].threshold);
        }
    }

    #[test]
    fn default_news_factors_match_suppression_ladder() {
        let f = NewsSuppressionFactors::default();
        assert_eq!(f.fully_explained, 0.5);
        assert_eq!(f.partially_explained, 0.75);
        assert_eq!(f.unexplained, 1.0);
    }

    #[test]
    fn config_roundtrips_through_json() {
        let cfg = AggregationConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AggregationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn clamp_bounds_ordered() {
        let cfg = AggregationConfig::default();
        assert!(cfg.market_conditions_clamp.0 < cfg.market_conditions_clamp.1);
    }
}
