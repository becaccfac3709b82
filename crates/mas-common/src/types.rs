//! Shared domain types: node names, typologies, clusters, risk levels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Name of a node in a surveillance Bayesian network.
///
/// A thin newtype over `String` so evidence maps are keyed by a
/// dedicated type rather than open strings; the inference adapter
/// validates every name against the network's known node set before
/// anything reaches the elimination routine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Self {
        NodeName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeName {
    fn from(s: &str) -> Self {
        NodeName(s.to_string())
    }
}

impl From<String> for NodeName {
    fn from(s: String) -> Self {
        NodeName(s)
    }
}

impl Borrow<str> for NodeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Market-abuse typologies scored by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Typology {
    InsiderDealing,
    Spoofing,
    EconomicWithholding,
    CrossDeskCollusion,
}

impl Typology {
    /// All typologies, in scoring order.
    pub const ALL: &'static [Typology] = &[
        Typology::InsiderDealing,
        Typology::Spoofing,
        Typology::EconomicWithholding,
        Typology::CrossDeskCollusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Typology::InsiderDealing => "insider_dealing",
            Typology::Spoofing => "spoofing",
            Typology::EconomicWithholding => "economic_withholding",
            Typology::CrossDeskCollusion => "cross_desk_collusion",
        }
    }
}

impl fmt::Display for Typology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business-logic clusters an evidence node belongs to.
///
/// The ESI cross-cluster diversity component counts how many of these
/// contributed at least one actively observed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCluster {
    Trade,
    Mnpi,
    Pnl,
    Comms,
    Hr,
    Sales,
    Market,
}

impl EvidenceCluster {
    /// All defined clusters (the diversity denominator).
    pub const ALL: &'static [EvidenceCluster] = &[
        EvidenceCluster::Trade,
        EvidenceCluster::Mnpi,
        EvidenceCluster::Pnl,
        EvidenceCluster::Comms,
        EvidenceCluster::Hr,
        EvidenceCluster::Sales,
        EvidenceCluster::Market,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceCluster::Trade => "trade",
            EvidenceCluster::Mnpi => "mnpi",
            EvidenceCluster::Pnl => "pnl",
            EvidenceCluster::Comms => "comms",
            EvidenceCluster::Hr => "hr",
            EvidenceCluster::Sales => "sales",
            EvidenceCluster::Market => "market",
        }
    }
}

impl fmt::Display for EvidenceCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative banding of an overall risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band a score in [0,1] using the given thresholds.
    ///
    /// `high_threshold` must be >= `medium_threshold`; scores at or
    /// above a threshold fall into that band.
    pub fn from_score(score: f64, medium_threshold: f64, high_threshold: f64) -> RiskLevel {
        if score >= high_threshold {
            RiskLevel::High
        } else if score >= medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_name_display_and_borrow() {
        let name = NodeName::new("price_sensitivity");
        assert_eq!(name.to_string(), "price_sensitivity");
        assert_eq!(name.as_str(), "price_sensitivity");
    }

    #[test]
    fn node_name_serde_is_transparent() {
        let name = NodeName::new("trade_pattern");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"trade_pattern\"");
        let back: NodeName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn typology_snake_case_serde() {
        let json = serde_json::to_string(&Typology::InsiderDealing).unwrap();
        assert_eq!(json, "\"insider_dealing\"");
    }

    #[test]
    fn all_clusters_has_seven_entries() {
        assert_eq!(EvidenceCluster::ALL.len(), 7);
    }

    #[test]
    fn risk_level_banding() {
        assert_eq!(RiskLevel::from_score(0.1, 0.4, 0.7), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.4, 0.4, 0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.69, 0.4, 0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.7, 0.4, 0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0, 0.4, 0.7), RiskLevel::High);
    }

    #[test]
    fn risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }
}
