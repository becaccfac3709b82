//! Per-request evidence assignments.

use mas_common::NodeName;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from node name to observed state index.
///
/// Produced fresh per scoring request by the evidence mapper. Keys are
/// validated against the network's node set at the adapter boundary;
/// nothing unvalidated reaches the elimination routine. Backed by a
/// `BTreeMap` so iteration order, and with it fallback substitution, is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EvidenceMap(BTreeMap<NodeName, usize>);

impl EvidenceMap {
    pub fn new() -> EvidenceMap {
        EvidenceMap::default()
    }

    pub fn set(&mut self, node: impl Into<NodeName>, state: usize) -> &mut Self {
        self.0.insert(node.into(), state);
        self
    }

    pub fn get(&self, node: &str) -> Option<usize> {
        self.0.get(node).copied()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.0.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeName, usize)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }
}

impl FromIterator<(NodeName, usize)> for EvidenceMap {
    fn from_iter<I: IntoIterator<Item = (NodeName, usize)>>(iter: I) -> Self {
        EvidenceMap(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut evidence = EvidenceMap::new();
        evidence.set("volume_anomaly", 2).set("mnpi_access", 1);
        assert_eq!(evidence.get("volume_anomaly"), Some(2));
        assert_eq!(evidence.get("missing"), None);
        assert_eq!(evidence.len(), 2);
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let mut evidence = EvidenceMap::new();
        evidence.set("zeta", 0).set("alpha", 1);
        let names: Vec<&str> = evidence.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn serde_is_a_plain_map() {
        let mut evidence = EvidenceMap::new();
        evidence.set("a", 1);
        let json = serde_json::to_string(&evidence).unwrap();
        assert_eq!(json, r#"{"a":1}"#);
        let back: EvidenceMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, evidence);
    }
}
