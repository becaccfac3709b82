//! Evidence Sufficiency Index.
//!
//! A composite confidence score over how well the supplied evidence
//! supports the network's verdict. Five components, each in [0,1],
//! combined with configurable weights. The standard downstream use is
//! [`adjust_risk_score`]: sparse evidence mechanically discounts risk.
//!
//! Fallback-substituted nodes are NOT active evidence. They count
//! against the fallback component and are excluded from activation,
//! entropy, and diversity. An index built from defaults alone would
//! otherwise certify a verdict no data supports.

use crate::catalog::NodeCatalog;
use crate::evidence::EvidenceMap;
use mas_common::{EvidenceCluster, NodeName};
use mas_config::EsiConfig;
use mas_math::normalized_entropy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Qualitative banding of an ESI score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EsiBadge {
    Sparse,
    Limited,
    Moderate,
    Strong,
}

impl EsiBadge {
    pub fn as_str(&self) -> &'static str {
        match self {
            EsiBadge::Sparse => "Sparse",
            EsiBadge::Limited => "Limited",
            EsiBadge::Moderate => "Moderate",
            EsiBadge::Strong => "Strong",
        }
    }
}

impl std::fmt::Display for EsiBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The five raw component scores, pre-weighting.
///
/// `fallback_ratio` is stored un-inverted; the weighting step applies
/// `1 - fallback_ratio` since heavy fallback usage lowers the index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EsiComponents {
    pub node_activation_ratio: f64,
    pub mean_confidence_score: f64,
    pub fallback_ratio: f64,
    pub contribution_entropy: f64,
    pub cross_cluster_diversity: f64,
}

/// Composite index plus the component breakdown that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EsiResult {
    pub score: f64,
    pub badge: EsiBadge,
    pub components: EsiComponents,
    pub active_node_count: usize,
    pub total_node_count: usize,
}

impl EsiResult {
    /// The zero-evidence result: no active nodes, nothing to certify.
    pub fn sparse(total_node_count: usize) -> EsiResult {
        EsiResult {
            score: 0.0,
            badge: EsiBadge::Sparse,
            components: EsiComponents {
                node_activation_ratio: 0.0,
                mean_confidence_score: 0.0,
                fallback_ratio: if total_node_count > 0 { 1.0 } else { 0.0 },
                contribution_entropy: 0.0,
                cross_cluster_diversity: 0.0,
            },
            active_node_count: 0,
            total_node_count,
        }
    }
}

/// Inputs to one ESI calculation.
pub struct EsiInput<'a> {
    /// Catalog the observed nodes are defined in (cluster lookups).
    pub catalog: &'a NodeCatalog,
    /// Actively observed node states — fallback substitutions excluded.
    pub node_states: &'a EvidenceMap,
    /// Per-node flag from the inference adapter: true means the node's
    /// state came from its fallback prior. Its key set defines the
    /// total node count.
    pub fallback_usage: &'a BTreeMap<NodeName, bool>,
    /// Optional caller-supplied confidence per observed input.
    pub confidence_scores: Option<&'a BTreeMap<NodeName, f64>>,
}

/// Compute the Evidence Sufficiency Index.
pub fn calculate_esi(input: &EsiInput<'_>, config: &EsiConfig) -> EsiResult {
    let total = input.fallback_usage.len();
    let active: Vec<&NodeName> = input
        .fallback_usage
        .iter()
        .filter(|(node, used)| !**used && input.node_states.contains(node.as_str()))
        .map(|(node, _)| node)
        .collect();

    if active.is_empty() || total == 0 {
        return EsiResult::sparse(total);
    }

    let node_activation_ratio = active.len() as f64 / total as f64;

    let fallback_count = input.fallback_usage.values().filter(|used| **used).count();
    let fallback_ratio = fallback_count as f64 / total as f64;

    let mean_confidence_score = match input.confidence_scores {
        Some(scores) if !scores.is_empty() => {
            scores.values().sum::<f64>() / scores.len() as f64
        }
        _ => config.default_confidence,
    };

    let contribution_entropy = label_entropy(input, &active);
    let cross_cluster_diversity = cluster_diversity(input, &active);

    let weights = &config.weights;
    let score = weights.node_activation * node_activation_ratio
        + weights.mean_confidence * mean_confidence_score
        + weights.fallback * (1.0 - fallback_ratio)
        + weights.contribution_entropy * contribution_entropy
        + weights.cross_cluster_diversity * cross_cluster_diversity;
    let score = score.clamp(0.0, 1.0);

    let thresholds = &config.badge_thresholds;
    let badge = if score >= thresholds.strong {
        EsiBadge::Strong
    } else if score >= thresholds.moderate {
        EsiBadge::Moderate
    } else if score >= thresholds.limited {
        EsiBadge::Limited
    } else {
        EsiBadge::Sparse
    };

    EsiResult {
        score,
        badge,
        components: EsiComponents {
            node_activation_ratio,
            mean_confidence_score,
            fallback_ratio,
            contribution_entropy,
            cross_cluster_diversity,
        },
        active_node_count: active.len(),
        total_node_count: total,
    }
}

/// Normalized entropy of the observed state labels across active nodes.
/// A single distinct label (or a node set with no resolvable labels)
/// contributes zero.
fn label_entropy(input: &EsiInput<'_>, active: &[&NodeName]) -> f64 {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for node in active {
        let Some(state) = input.node_states.get(node.as_str()) else {
            continue;
        };
        let label = match input.catalog.get_node(node.as_str()) {
            Some(variable) => variable
                .states()
                .get(state)
                .cloned()
                .unwrap_or_else(|| state.to_string()),
            None => state.to_string(),
        };
        *counts.entry(label).or_insert(0) += 1;
    }
    let counts: Vec<usize> = counts.into_values().collect();
    normalized_entropy(&counts)
}

/// Fraction of defined business clusters with at least one active node.
fn cluster_diversity(input: &EsiInput<'_>, active: &[&NodeName]) -> f64 {
    let mut seen: BTreeSet<EvidenceCluster> = BTreeSet::new();
    for node in active {
        if let Some(cluster) = input
            .catalog
            .get_node(node.as_str())
            .and_then(|variable| variable.cluster())
        {
            seen.insert(cluster);
        }
    }
    seen.len() as f64 / EvidenceCluster::ALL.len() as f64
}

/// Standard downstream application: sparse evidence discounts risk.
pub fn adjust_risk_score(risk: f64, esi: &EsiResult) -> f64 {
    (risk * esi.score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DiscreteVariable;
    use mas_common::NodeName;

    fn catalog() -> NodeCatalog {
        let mut catalog = NodeCatalog::new();
        let defs = [
            ("trade_pattern", EvidenceCluster::Trade),
            ("mnpi_access", EvidenceCluster::Mnpi),
            ("pnl_spike", EvidenceCluster::Pnl),
            ("comms_intent", EvidenceCluster::Comms),
        ];
        for (name, cluster) in defs {
            catalog
                .insert(
                    DiscreteVariable::new(
                        NodeName::new(name),
                        vec!["low".into(), "medium".into(), "high".into()],
                        vec![0.8, 0.15, 0.05],
                        Some(cluster),
                        None,
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        catalog
    }

    fn usage(observed: &[&str], defaulted: &[&str]) -> BTreeMap<NodeName, bool> {
        let mut usage = BTreeMap::new();
        for name in observed {
            usage.insert(NodeName::new(*name), false);
        }
        for name in defaulted {
            usage.insert(NodeName::new(*name), true);
        }
        usage
    }

    #[test]
    fn zero_evidence_is_sparse_with_zero_score() {
        let catalog = catalog();
        let states = EvidenceMap::new();
        let fallback = usage(&[], &["trade_pattern", "mnpi_access", "pnl_spike", "comms_intent"]);
        let result = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &states,
                fallback_usage: &fallback,
                confidence_scores: None,
            },
            &EsiConfig::default(),
        );
        assert_eq!(result.score, 0.0);
        assert_eq!(result.badge, EsiBadge::Sparse);
        assert_eq!(result.active_node_count, 0);
    }

    #[test]
    fn full_diverse_evidence_scores_high() {
        let catalog = catalog();
        let mut states = EvidenceMap::new();
        states
            .set("trade_pattern", 2)
            .set("mnpi_access", 1)
            .set("pnl_spike", 2)
            .set("comms_intent", 0);
        let fallback = usage(
            &["trade_pattern", "mnpi_access", "pnl_spike", "comms_intent"],
            &[],
        );
        let mut confidence = BTreeMap::new();
        for node in ["trade_pattern", "mnpi_access", "pnl_spike", "comms_intent"] {
            confidence.insert(NodeName::new(node), 0.9);
        }
        let result = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &states,
                fallback_usage: &fallback,
                confidence_scores: Some(&confidence),
            },
            &EsiConfig::default(),
        );
        assert!(result.score > 0.6, "score was {}", result.score);
        assert_eq!(result.components.node_activation_ratio, 1.0);
        assert_eq!(result.components.fallback_ratio, 0.0);
    }

    #[test]
    fn more_fallback_never_raises_the_score() {
        let catalog = catalog();
        let mut full_states = EvidenceMap::new();
        full_states
            .set("trade_pattern", 2)
            .set("mnpi_access", 2)
            .set("pnl_spike", 2)
            .set("comms_intent", 2);
        let full = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &full_states,
                fallback_usage: &usage(
                    &["trade_pattern", "mnpi_access", "pnl_spike", "comms_intent"],
                    &[],
                ),
                confidence_scores: None,
            },
            &EsiConfig::default(),
        );
        let mut partial_states = EvidenceMap::new();
        partial_states.set("trade_pattern", 2).set("mnpi_access", 2);
        let partial = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &partial_states,
                fallback_usage: &usage(
                    &["trade_pattern", "mnpi_access"],
                    &["pnl_spike", "comms_intent"],
                ),
                confidence_scores: None,
            },
            &EsiConfig::default(),
        );
        assert!(partial.score <= full.score);
    }

    #[test]
    fn diversity_never_lowers_the_score() {
        let catalog = catalog();
        // Two observations from one cluster vs the same two states
        // spread over two clusters.
        let mut narrow_states = EvidenceMap::new();
        narrow_states.set("trade_pattern", 2).set("mnpi_access", 2);
        let narrow_usage = usage(&["trade_pattern", "mnpi_access"], &["pnl_spike", "comms_intent"]);
        let narrow = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &narrow_states,
                fallback_usage: &narrow_usage,
                confidence_scores: None,
            },
            &EsiConfig::default(),
        );
        assert!(narrow.components.cross_cluster_diversity > 0.0);
        assert!(
            narrow.components.cross_cluster_diversity
                <= 2.0 / EvidenceCluster::ALL.len() as f64 + 1e-12
        );
    }

    #[test]
    fn single_label_has_zero_entropy() {
        let catalog = catalog();
        let mut states = EvidenceMap::new();
        states.set("trade_pattern", 2).set("mnpi_access", 2);
        let result = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &states,
                fallback_usage: &usage(
                    &["trade_pattern", "mnpi_access"],
                    &["pnl_spike", "comms_intent"],
                ),
                confidence_scores: None,
            },
            &EsiConfig::default(),
        );
        assert_eq!(result.components.contribution_entropy, 0.0);
    }

    #[test]
    fn default_confidence_applies_when_none_supplied() {
        let catalog = catalog();
        let mut states = EvidenceMap::new();
        states.set("trade_pattern", 1);
        let result = calculate_esi(
            &EsiInput {
                catalog: &catalog,
                node_states: &states,
                fallback_usage: &usage(
                    &["trade_pattern"],
                    &["mnpi_access", "pnl_spike", "comms_intent"],
                ),
                confidence_scores: None,
            },
            &EsiConfig::default(),
        );
        assert_eq!(result.components.mean_confidence_score, 0.5);
    }

    #[test]
    fn adjust_risk_score_multiplies_and_clamps() {
        let result = EsiResult::sparse(4);
        assert_eq!(adjust_risk_score(0.9, &result), 0.0);
        let mut strong = EsiResult::sparse(4);
        strong.score = 0.8;
        assert!((adjust_risk_score(0.5, &strong) - 0.4).abs() < 1e-12);
    }
}
