//! Network structure configuration.
//!
//! A [`NetworkStructureConfig`] fully describes one typology's network:
//! evidence nodes with fallback priors, intermediate groupings, the
//! optional latent-intent layer, and the outcome node. The assembler
//! consumes this as data; it never inspects files or raw JSON itself.

use crate::tuning::{NodeType, NoisyOrTuning};
use crate::{AggregationConfig, EsiConfig};
use mas_common::{EvidenceCluster, NodeName, Typology};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw evidence variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceNodeDef {
    pub name: NodeName,
    /// Ordered state labels, lowest severity first.
    pub states: Vec<String>,
    /// Fallback prior over `states`; sums to 1.0 ± 1e-6.
    pub fallback_prior: Vec<f64>,
    pub cluster: EvidenceCluster,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EvidenceNodeDef {
    /// A 3-state node with the standard low/medium/high labels and a
    /// prior skewed toward the normal state.
    pub fn severity3(
        name: impl Into<NodeName>,
        cluster: EvidenceCluster,
        fallback_prior: [f64; 3],
    ) -> Self {
        EvidenceNodeDef {
            name: name.into(),
            states: vec!["low".into(), "medium".into(), "high".into()],
            fallback_prior: fallback_prior.to_vec(),
            cluster,
            description: None,
        }
    }
}

/// One intermediate aggregation node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntermediateNodeDef {
    pub name: NodeName,
    pub node_type: NodeType,
    /// Ordered parents; earlier parents carry more influence.
    pub parents: Vec<NodeName>,
}

/// The final outcome node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeNodeDef {
    pub name: NodeName,
    pub states: Vec<String>,
    /// Hand-authored CPT rows (child states × parent combinations).
    /// When absent the assembler synthesizes one via noisy-OR with the
    /// [`NodeType::RiskOutcome`] tuning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_authored_cpt: Option<Vec<Vec<f64>>>,
}

/// Complete structure for one typology's network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NetworkStructureConfig {
    pub typology: Typology,
    pub evidence_nodes: Vec<EvidenceNodeDef>,
    pub intermediates: Vec<IntermediateNodeDef>,
    /// Insert a 3-state latent-intent node between the intermediates
    /// and the outcome.
    pub use_latent_intent: bool,
    /// Name of the latent-intent node when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latent_intent_name: Option<NodeName>,
    pub outcome: OutcomeNodeDef,
}

/// Fully-resolved model configuration handed to the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub structure: NetworkStructureConfig,
    /// Per-node-type tuning overrides; types absent here use
    /// [`NodeType::default_tuning`].
    #[serde(default)]
    pub tuning_overrides: BTreeMap<NodeType, NoisyOrTuning>,
    #[serde(default)]
    pub esi: EsiConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl ModelConfig {
    /// Build a config from a structure with default tuning/ESI/aggregation.
    pub fn with_defaults(structure: NetworkStructureConfig) -> Self {
        ModelConfig {
            schema_version: default_schema_version(),
            structure,
            tuning_overrides: BTreeMap::new(),
            esi: EsiConfig::default(),
            aggregation: AggregationConfig::default(),
        }
    }

    /// Effective tuning for a node type (override or default).
    pub fn tuning_for(&self, node_type: NodeType) -> NoisyOrTuning {
        self.tuning_overrides
            .get(&node_type)
            .cloned()
            .unwrap_or_else(|| node_type.default_tuning())
    }

    /// Parse a model configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
