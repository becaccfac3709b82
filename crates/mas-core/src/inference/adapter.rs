//! Inference adapter: the surveillance-facing query surface.
//!
//! Sits between raw evidence maps and the elimination engine. Every
//! incoming observation is validated against the network's evidence
//! layer before any math runs; missing observations are completed from
//! the node's fallback prior, and which nodes were substituted is
//! reported back so downstream scoring can discount them.

use crate::evidence::EvidenceMap;
use crate::inference::eliminate::query_posterior;
use crate::network::BayesianNetworkGraph;
use mas_common::{Error, NodeName, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Posterior query outcome for a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InferenceResult {
    /// Node the posterior refers to.
    pub node: NodeName,
    /// State labels, aligned with `posterior`.
    pub states: Vec<String>,
    /// Posterior distribution over `states`; sums to 1.
    pub posterior: Vec<f64>,
    /// Scalar risk score in [0, 1] derived from the posterior.
    pub overall_score: f64,
    /// Per-evidence-node flag: true when the observation was absent
    /// and the fallback prior's modal state was substituted.
    pub fallback_usage: BTreeMap<NodeName, bool>,
}

impl InferenceResult {
    /// Number of evidence nodes that carried a real observation.
    pub fn active_evidence_count(&self) -> usize {
        self.fallback_usage.values().filter(|used| !**used).count()
    }
}

/// Validated query surface over one assembled network.
#[derive(Debug, Clone)]
pub struct InferenceAdapter {
    graph: BayesianNetworkGraph,
}

impl InferenceAdapter {
    /// Wrap a graph, re-checking its structural integrity first.
    pub fn new(graph: BayesianNetworkGraph) -> Result<InferenceAdapter> {
        graph.validate()?;
        Ok(InferenceAdapter { graph })
    }

    pub fn graph(&self) -> &BayesianNetworkGraph {
        &self.graph
    }

    /// Posterior of the risk outcome node given `evidence`.
    pub fn query(&self, evidence: &EvidenceMap) -> Result<InferenceResult> {
        let outcome = self.graph.outcome().clone();
        self.query_node(&outcome, evidence)
    }

    /// Posterior of an arbitrary non-evidence node given `evidence`.
    /// Evidence is validated, then completed with fallback states for
    /// every unobserved evidence-layer node.
    pub fn query_node(&self, node: &NodeName, evidence: &EvidenceMap) -> Result<InferenceResult> {
        let (completed, fallback_usage) = self.complete_evidence(evidence)?;
        let posterior = query_posterior(&self.graph, &completed, node)?;
        let variable = self.graph.catalog().require_node(node)?;
        let overall_score = score_from_posterior(&posterior);
        debug!(
            node = %node,
            score = overall_score,
            substituted = fallback_usage.values().filter(|v| **v).count(),
            "posterior query complete"
        );
        Ok(InferenceResult {
            node: node.clone(),
            states: variable.states().to_vec(),
            posterior,
            overall_score,
            fallback_usage,
        })
    }

    /// Validate supplied observations and fill the gaps.
    ///
    /// Only evidence-layer nodes may be observed; an unknown name or a
    /// name of an internal node is rejected rather than silently
    /// ignored, since a typo here would otherwise weaken the alert.
    fn complete_evidence(
        &self,
        evidence: &EvidenceMap,
    ) -> Result<(BTreeMap<NodeName, usize>, BTreeMap<NodeName, bool>)> {
        for (node, state) in evidence.iter() {
            if !self.graph.evidence_nodes().contains(node) {
                return Err(Error::UnknownNode {
                    node: node.to_string(),
                });
            }
            let variable = self.graph.catalog().require_node(node)?;
            if state >= variable.cardinality() {
                return Err(Error::EvidenceOutOfRange {
                    node: node.to_string(),
                    state,
                    cardinality: variable.cardinality(),
                });
            }
        }

        let mut completed = BTreeMap::new();
        let mut fallback_usage = BTreeMap::new();
        for node in self.graph.evidence_nodes() {
            match evidence.get(node.as_str()) {
                Some(state) => {
                    completed.insert(node.clone(), state);
                    fallback_usage.insert(node.clone(), false);
                }
                None => {
                    let variable = self.graph.catalog().require_node(node)?;
                    completed.insert(node.clone(), variable.fallback_state());
                    fallback_usage.insert(node.clone(), true);
                }
            }
        }
        Ok((completed, fallback_usage))
    }
}

/// Scalar score for a posterior: 3-state severity distributions map to
/// `0.5·P(medium) + P(high)`; binary nodes map to `P(state 1)`; any
/// other cardinality takes the probability-weighted state position.
pub fn score_from_posterior(posterior: &[f64]) -> f64 {
    match posterior.len() {
        3 => 0.5 * posterior[1] + posterior[2],
        2 => posterior[1],
        n if n > 1 => posterior
            .iter()
            .enumerate()
            .map(|(i, p)| p * i as f64 / (n - 1) as f64)
            .sum(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkAssembler;
    use mas_common::Typology;

    fn adapter(typology: Typology) -> InferenceAdapter {
        let graph = NetworkAssembler::for_typology(typology)
            .unwrap()
            .build_default()
            .unwrap();
        InferenceAdapter::new(graph).unwrap()
    }

    fn all_states(adapter: &InferenceAdapter, state: usize) -> EvidenceMap {
        let mut evidence = EvidenceMap::new();
        for node in adapter.graph().evidence_nodes() {
            evidence.set(node.clone(), state);
        }
        evidence
    }

    #[test]
    fn full_observation_marks_no_fallback() {
        let adapter = adapter(Typology::Spoofing);
        let result = adapter.query(&all_states(&adapter, 2)).unwrap();
        assert!(result.fallback_usage.values().all(|used| !used));
        assert_eq!(
            result.active_evidence_count(),
            adapter.graph().evidence_nodes().len()
        );
    }

    #[test]
    fn missing_observation_substitutes_fallback() {
        let adapter = adapter(Typology::Spoofing);
        let mut evidence = all_states(&adapter, 2);
        let dropped = adapter.graph().evidence_nodes()[0].clone();
        let mut partial = EvidenceMap::new();
        for (node, state) in evidence.iter() {
            if node != &dropped {
                partial.set(node.clone(), state);
            }
        }
        evidence = partial;
        let result = adapter.query(&evidence).unwrap();
        assert_eq!(result.fallback_usage.get(&dropped), Some(&true));
        assert_eq!(
            result.active_evidence_count(),
            adapter.graph().evidence_nodes().len() - 1
        );
    }

    #[test]
    fn unknown_node_rejected() {
        let adapter = adapter(Typology::Spoofing);
        let mut evidence = EvidenceMap::new();
        evidence.set("no_such_signal", 1);
        let err = adapter.query(&evidence).unwrap_err();
        assert_eq!(err.code(), 20);
    }

    #[test]
    fn internal_node_cannot_be_observed() {
        let adapter = adapter(Typology::InsiderDealing);
        let internal = adapter.graph().intermediates()[0].clone();
        let mut evidence = EvidenceMap::new();
        evidence.set(internal, 1);
        assert!(adapter.query(&evidence).is_err());
    }

    #[test]
    fn out_of_range_state_rejected() {
        let adapter = adapter(Typology::Spoofing);
        let node = adapter.graph().evidence_nodes()[0].clone();
        let mut evidence = EvidenceMap::new();
        evidence.set(node, 3);
        let err = adapter.query(&evidence).unwrap_err();
        assert_eq!(err.code(), 21);
        assert!(err.is_recoverable());
    }

    #[test]
    fn severe_evidence_scores_above_benign() {
        let adapter = adapter(Typology::InsiderDealing);
        let benign = adapter.query(&all_states(&adapter, 0)).unwrap();
        let severe = adapter.query(&all_states(&adapter, 2)).unwrap();
        assert!(severe.overall_score > benign.overall_score);
        assert!(severe.overall_score <= 1.0);
        assert!(benign.overall_score >= 0.0);
    }

    #[test]
    fn score_mapping_is_as_specified() {
        assert!((score_from_posterior(&[0.2, 0.3, 0.5]) - 0.65).abs() < 1e-12);
        assert!((score_from_posterior(&[0.4, 0.6]) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn queries_are_deterministic() {
        let adapter = adapter(Typology::EconomicWithholding);
        let evidence = all_states(&adapter, 1);
        let a = adapter.query(&evidence).unwrap();
        let b = adapter.query(&evidence).unwrap();
        assert_eq!(a.posterior, b.posterior);
        assert_eq!(a.overall_score, b.overall_score);
    }
}
