//! Variable elimination over the assembled network.
//!
//! Exact inference for the query variable's posterior given complete
//! or partial (already fallback-completed) evidence. Hidden variables
//! are eliminated in reverse topological layer order — intermediates
//! before the latent intent — which keeps every intermediate factor
//! tiny for these hierarchical networks. Fully deterministic: same
//! evidence, same posterior.

use crate::inference::factor::Factor;
use crate::network::BayesianNetworkGraph;
use mas_common::{Error, NodeName, Result};
use std::collections::BTreeMap;

/// Posterior distribution of `query` given `evidence` (node → observed
/// state index). Evidence must already be validated and completed;
/// this routine only does the math.
pub fn query_posterior(
    graph: &BayesianNetworkGraph,
    evidence: &BTreeMap<NodeName, usize>,
    query: &NodeName,
) -> Result<Vec<f64>> {
    if evidence.contains_key(query) {
        return Err(Error::Inference(format!(
            "query variable '{query}' is itself observed"
        )));
    }
    graph.catalog().require_node(query)?;

    // Build evidence-restricted factors from every CPT.
    let mut factors: Vec<Factor> = Vec::new();
    for (_, cpt) in graph.cpts() {
        let mut factor = Factor::from_cpt(cpt);
        for (node, state) in evidence {
            if factor.contains(node) {
                factor = factor.restrict(node, *state)?;
            }
        }
        factors.push(factor);
    }

    for hidden in elimination_order(graph, evidence, query) {
        let (touching, rest): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.contains(&hidden));
        factors = rest;
        if touching.is_empty() {
            continue;
        }
        let mut product = Factor::constant(1.0);
        for factor in &touching {
            product = product.multiply(factor);
        }
        factors.push(product.sum_out(&hidden)?);
    }

    let mut result = Factor::constant(1.0);
    for factor in &factors {
        result = result.multiply(factor);
    }
    result.normalize()
}

/// Hidden variables in elimination order: evidence-layer nodes first
/// (only those left unobserved), then intermediates, then the latent
/// intent, skipping the query variable itself.
fn elimination_order(
    graph: &BayesianNetworkGraph,
    evidence: &BTreeMap<NodeName, usize>,
    query: &NodeName,
) -> Vec<NodeName> {
    let mut order: Vec<NodeName> = Vec::new();
    let mut push = |node: &NodeName, order: &mut Vec<NodeName>| {
        if node != query && !evidence.contains_key(node) {
            order.push(node.clone());
        }
    };
    for node in graph.evidence_nodes() {
        push(node, &mut order);
    }
    for node in graph.intermediates() {
        push(node, &mut order);
    }
    if let Some(latent) = graph.latent_intent() {
        push(latent, &mut order);
    }
    if graph.outcome() != query {
        push(graph.outcome(), &mut order);
    }
    order
}
