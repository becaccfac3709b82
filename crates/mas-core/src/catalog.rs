//! Evidence node catalog.
//!
//! Typed discrete random variables with human-readable states and a
//! fallback prior used when observation is missing. Lookups return
//! `Option`/`bool`; callers that require a node use [`NodeCatalog::require_node`]
//! and get a proper error naming the missing node.

use mas_common::{Error, EvidenceCluster, NodeName, Result};
use mas_math::{argmax_tie_lowest, is_normalized, NORMALIZATION_TOLERANCE};
use std::collections::BTreeMap;

/// A named discrete random variable. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteVariable {
    name: NodeName,
    states: Vec<String>,
    fallback_prior: Vec<f64>,
    /// Business-logic cluster; None for intermediate/latent/outcome
    /// variables, which never count toward ESI diversity.
    cluster: Option<EvidenceCluster>,
    description: Option<String>,
}

impl DiscreteVariable {
    pub fn new(
        name: NodeName,
        states: Vec<String>,
        fallback_prior: Vec<f64>,
        cluster: Option<EvidenceCluster>,
        description: Option<String>,
    ) -> Result<DiscreteVariable> {
        if states.len() < 2 {
            return Err(Error::Config(format!(
                "variable '{name}' needs at least 2 states, got {}",
                states.len()
            )));
        }
        if fallback_prior.len() != states.len() {
            return Err(Error::Config(format!(
                "variable '{name}': fallback prior length {} != state count {}",
                fallback_prior.len(),
                states.len()
            )));
        }
        if !is_normalized(&fallback_prior, NORMALIZATION_TOLERANCE) {
            return Err(Error::Config(format!(
                "variable '{name}': fallback prior must sum to 1.0"
            )));
        }
        Ok(DiscreteVariable {
            name,
            states,
            fallback_prior,
            cluster,
            description,
        })
    }

    /// A 3-state latent variable with a uniform fallback prior.
    pub fn hidden3(name: NodeName, states: [&str; 3]) -> DiscreteVariable {
        DiscreteVariable {
            name,
            states: states.iter().map(|s| s.to_string()).collect(),
            fallback_prior: vec![1.0 / 3.0; 3],
            cluster: None,
            description: None,
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    pub fn fallback_prior(&self) -> &[f64] {
        &self.fallback_prior
    }

    pub fn cluster(&self) -> Option<EvidenceCluster> {
        self.cluster
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// State index substituted when no observation is supplied: the
    /// maximum-probability entry of the fallback prior, ties broken by
    /// the lowest index.
    pub fn fallback_state(&self) -> usize {
        // Prior is validated non-empty and NaN-free at construction.
        argmax_tie_lowest(&self.fallback_prior).unwrap_or(0)
    }

    /// Index of a state label, if defined.
    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s == label)
    }
}

/// An observed value for a node: either a state index or a state label.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Index(usize),
    Label(String),
}

impl From<usize> for NodeValue {
    fn from(index: usize) -> Self {
        NodeValue::Index(index)
    }
}

impl From<&str> for NodeValue {
    fn from(label: &str) -> Self {
        NodeValue::Label(label.to_string())
    }
}

/// Lookup table of all variables known to one network.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    nodes: BTreeMap<NodeName, DiscreteVariable>,
}

impl NodeCatalog {
    pub fn new() -> NodeCatalog {
        NodeCatalog::default()
    }

    /// Insert a variable; rejects duplicate names.
    pub fn insert(&mut self, variable: DiscreteVariable) -> Result<()> {
        let name = variable.name().clone();
        if self.nodes.contains_key(&name) {
            return Err(Error::Config(format!("duplicate node '{name}'")));
        }
        self.nodes.insert(name, variable);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_node(&self, name: &str) -> Option<&DiscreteVariable> {
        self.nodes.get(name)
    }

    pub fn get_node_states(&self, name: &str) -> Option<&[String]> {
        self.get_node(name).map(|n| n.states())
    }

    /// True when `value` is a defined state (by index or label) of a
    /// known node. Unknown node names return false rather than raising.
    pub fn validate_node_value(&self, name: &str, value: impl Into<NodeValue>) -> bool {
        let Some(node) = self.get_node(name) else {
            return false;
        };
        match value.into() {
            NodeValue::Index(i) => i < node.cardinality(),
            NodeValue::Label(label) => node.state_index(&label).is_some(),
        }
    }

    /// Lookup that fails loudly for callers that require the node.
    pub fn require_node(&self, name: &NodeName) -> Result<&DiscreteVariable> {
        self.nodes.get(name).ok_or_else(|| Error::UnknownNode {
            node: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeName, &DiscreteVariable)> {
        self.nodes.iter()
    }
}
