//! Noisy-OR tuning constants per intermediate-node type.
//!
//! The leak probabilities, influence weights, and split factors below
//! are operating defaults, not calibrated truths: none of them derive
//! from labeled enforcement cases yet. They are deliberately plain
//! config values so a calibration pass against historical alerts can
//! replace them without touching the synthesizer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on parents per intermediate node. CPT columns grow as
/// 3^fan_in, so 6 parents is already 729 columns.
pub const MAX_FAN_IN: usize = 6;

/// Fan-in above this is legal but flagged as a design smell during
/// validation.
pub const FAN_IN_SMELL: usize = 4;

/// Intermediate-node types, each with its own noisy-OR tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Price/volume distortion evidence (spoofing, insider dealing).
    MarketImpact,
    /// Trader-behavior evidence pointing at intent.
    BehavioralIntent,
    /// Cost-curve evidence (economic withholding).
    CostAnalysis,
    /// Market-state evidence (scarcity, volatility).
    MarketConditions,
    /// Bid/output shape evidence (economic withholding).
    BehavioralPatterns,
    /// Plant/technical evidence (outages, constraints).
    TechnicalFactors,
    /// Cross-desk trade-coordination evidence (collusion).
    CoordinationPatterns,
    /// Communication-channel evidence (collusion).
    CommunicationIntent,
    /// Latent intent node sitting over the intermediates.
    LatentIntent,
    /// Synthesized outcome node for models with >4 intermediate parents.
    RiskOutcome,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::MarketImpact => "market_impact",
            NodeType::BehavioralIntent => "behavioral_intent",
            NodeType::CostAnalysis => "cost_analysis",
            NodeType::MarketConditions => "market_conditions",
            NodeType::BehavioralPatterns => "behavioral_patterns",
            NodeType::TechnicalFactors => "technical_factors",
            NodeType::CoordinationPatterns => "coordination_patterns",
            NodeType::CommunicationIntent => "communication_intent",
            NodeType::LatentIntent => "latent_intent",
            NodeType::RiskOutcome => "risk_outcome",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tuning constants driving CPT synthesis for one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NoisyOrTuning {
    /// Base rate of the high/malicious outcome with zero evidence.
    pub leak_probability: f64,
    /// Per-parent influence weights, decreasing; parent position k uses
    /// weight k. Earlier-listed parents carry more influence.
    pub influence_weights: Vec<f64>,
    /// Fraction of a parent's weight applied when it sits in its
    /// medium state (0.4 or 0.5 depending on node type).
    pub medium_state_factor: f64,
    /// Fraction of P(high) reassigned to the medium state.
    pub medium_split: f64,
}

impl NoisyOrTuning {
    /// The first `k` influence weights, for a node with `k` parents.
    ///
    /// Returns None when `k` exceeds the configured weight list.
    pub fn weights_for(&self, k: usize) -> Option<&[f64]> {
        self.influence_weights.get(..k)
    }
}

impl NodeType {
    /// Default tuning for this node type.
    ///
    /// Leak probabilities sit in [0.01, 0.10]: evidence-heavy types
    /// (market impact, coordination) get low leaks, diffuse types
    /// (market conditions, technical factors) get higher ones.
    pub fn default_tuning(&self) -> NoisyOrTuning {
        match self {
            NodeType::MarketImpact => NoisyOrTuning {
                leak_probability: 0.02,
                influence_weights: vec![0.90, 0.80, 0.70, 0.60, 0.55, 0.50],
                medium_state_factor: 0.5,
                medium_split: 0.35,
            },
            NodeType::BehavioralIntent => NoisyOrTuning {
                leak_probability: 0.03,
                influence_weights: vec![0.88, 0.78, 0.68, 0.58, 0.52, 0.48],
                medium_state_factor: 0.5,
                medium_split: 0.40,
            },
            NodeType::CostAnalysis => NoisyOrTuning {
                leak_probability: 0.04,
                influence_weights: vec![0.92, 0.82, 0.72, 0.62, 0.55, 0.50],
                medium_state_factor: 0.4,
                medium_split: 0.30,
            },
            NodeType::MarketConditions => NoisyOrTuning {
                leak_probability: 0.08,
                influence_weights: vec![0.80, 0.72, 0.64, 0.56, 0.50, 0.46],
                medium_state_factor: 0.4,
                medium_split: 0.35,
            },
            NodeType::BehavioralPatterns => NoisyOrTuning {
                leak_probability: 0.03,
                influence_weights: vec![0.90, 0.80, 0.70, 0.62, 0.55, 0.48],
                medium_state_factor: 0.5,
                medium_split: 0.35,
            },
            NodeType::TechnicalFactors => NoisyOrTuning {
                leak_probability: 0.10,
                influence_weights: vec![0.78, 0.70, 0.62, 0.56, 0.50, 0.45],
                medium_state_factor: 0.4,
                medium_split: 0.40,
            },
            NodeType::CoordinationPatterns => NoisyOrTuning {
                leak_probability: 0.02,
                influence_weights: vec![0.92, 0.82, 0.70, 0.60, 0.52, 0.46],
                medium_state_factor: 0.5,
                medium_split: 0.30,
            },
            NodeType::CommunicationIntent => NoisyOrTuning {
                leak_probability: 0.02,
                influence_weights: vec![0.95, 0.85, 0.72, 0.60, 0.52, 0.45],
                medium_state_factor: 0.5,
                medium_split: 0.30,
            },
            NodeType::LatentIntent => NoisyOrTuning {
                leak_probability: 0.01,
                influence_weights: vec![0.90, 0.85, 0.75, 0.65, 0.55, 0.50],
                medium_state_factor: 0.5,
                medium_split: 0.40,
            },
            NodeType::RiskOutcome => NoisyOrTuning {
                leak_probability: 0.02,
                influence_weights: vec![0.90, 0.82, 0.74, 0.66, 0.58, 0.50],
                medium_state_factor: 0.5,
                medium_split: 0.35,
            },
        }
    }
}
