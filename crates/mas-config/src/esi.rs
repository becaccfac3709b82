//! Evidence Sufficiency Index parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Weights over the five ESI components. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EsiWeights {
    pub node_activation: f64,
    pub mean_confidence: f64,
    pub fallback: f64,
    pub contribution_entropy: f64,
    pub cross_cluster_diversity: f64,
}

impl Default for EsiWeights {
    fn default() -> Self {
        EsiWeights {
            node_activation: 0.25,
            mean_confidence: 0.25,
            fallback: 0.20,
            contribution_entropy: 0.15,
            cross_cluster_diversity: 0.15,
        }
    }
}

impl EsiWeights {
    pub fn sum(&self) -> f64 {
        self.node_activation
            + self.mean_confidence
            + self.fallback
            + self.contribution_entropy
            + self.cross_cluster_diversity
    }
}

/// Badge thresholds: scores at or above a threshold earn the badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EsiBadgeThresholds {
    pub strong: f64,
    pub moderate: f64,
    pub limited: f64,
}

impl Default for EsiBadgeThresholds {
    fn default() -> Self {
        EsiBadgeThresholds {
            strong: 0.8,
            moderate: 0.6,
            limited: 0.4,
        }
    }
}

/// Full ESI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EsiConfig {
    #[serde(default)]
    pub weights: EsiWeights,
    #[serde(default)]
    pub badge_thresholds: EsiBadgeThresholds,
    /// Confidence assumed per input when the caller supplies none.
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

impl Default for EsiConfig {
    fn default() -> Self {
        EsiConfig {
            weights: EsiWeights::default(),
            badge_thresholds: EsiBadgeThresholds::default(),
            default_confidence: default_confidence(),
        }
    }
}
