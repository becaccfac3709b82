//! Intermediate node CPT synthesis via noisy-OR aggregation.
//!
//! A node with k parents needs a 3 × 3^k table; hand-authoring one is
//! hopeless past k = 2, and a flat model over N raw evidence nodes
//! would need 3^N columns. The synthesizer builds the table from a
//! handful of tuning constants instead: each parent independently may
//! "cause" the high-severity outcome with its influence weight, plus a
//! small leak rate for causes outside the model.
//!
//! Column enumeration is base-3 with the FIRST parent in the
//! least-significant digit; the same ordering the CPT's evidence list
//! records and the assembler validates against graph predecessors.

use crate::catalog::DiscreteVariable;
use crate::cpt::Cpt;
use mas_common::{Error, NodeName, Result};
use mas_config::{NodeType, NoisyOrTuning};
use mas_config::tuning::MAX_FAN_IN;
use mas_math::{combination_count, decode_combination, floor_and_renormalize};

/// Floor applied to every synthesized probability so no state ever
/// loses support entirely.
pub const PROBABILITY_FLOOR: f64 = 0.01;

/// Specification of one intermediate aggregation node.
#[derive(Debug, Clone)]
pub struct IntermediateNodeSpec {
    pub variable: DiscreteVariable,
    /// Ordered parents; position selects the influence weight, so
    /// earlier-listed parents carry more influence.
    pub parents: Vec<NodeName>,
    pub node_type: NodeType,
}

impl IntermediateNodeSpec {
    pub fn new(
        variable: DiscreteVariable,
        parents: Vec<NodeName>,
        node_type: NodeType,
    ) -> Result<IntermediateNodeSpec> {
        if variable.cardinality() != 3 {
            return Err(Error::InvalidStructure(format!(
                "intermediate '{}' must have 3 states, got {}",
                variable.name(),
                variable.cardinality()
            )));
        }
        let fan_in = parents.len();
        if fan_in < 2 || fan_in > MAX_FAN_IN {
            return Err(Error::FanInExceeded {
                node: variable.name().to_string(),
                fan_in,
                max: MAX_FAN_IN,
            });
        }
        Ok(IntermediateNodeSpec {
            variable,
            parents,
            node_type,
        })
    }

    pub fn fan_in(&self) -> usize {
        self.parents.len()
    }
}

/// Per-parent suppression factor on the low-severity outcome.
///
/// A parent in its high state applies its full influence (factor
/// `1 - w`), the medium state applies a node-type-dependent fraction of
/// it, and the low state contributes nothing.
fn parent_factor(state: usize, weight: f64, medium_factor: f64) -> f64 {
    match state {
        0 => 1.0,
        1 => 1.0 - medium_factor * weight,
        _ => 1.0 - weight,
    }
}

/// Synthesize the complete CPT for an intermediate node.
///
/// For every parent-state combination:
/// `P(low) = (1 - leak) * ∏_j factor(state_j, w_j)`, the noisy-OR
/// probability that no cause (modeled or leaked) fired; the remaining
/// mass splits into medium and high by the tuning's medium split.
/// Every entry is floored at [`PROBABILITY_FLOOR`] and the column
/// renormalized to sum exactly 1.0.
pub fn synthesize_cpt(spec: &IntermediateNodeSpec, tuning: &NoisyOrTuning) -> Result<Cpt> {
    let k = spec.fan_in();
    let weights = tuning.weights_for(k).ok_or_else(|| Error::InvalidTuning {
        node_type: spec.node_type.to_string(),
        message: format!(
            "{} influence weights configured, {k} parents",
            tuning.influence_weights.len()
        ),
    })?;

    let cards = vec![3usize; k];
    let cols = combination_count(&cards);
    let mut rows = vec![vec![0.0; cols]; 3];

    for col in 0..cols {
        // Construction guarantees col < 3^k.
        let digits = decode_combination(col, &cards).ok_or_else(|| {
            Error::ModelIntegrity(format!("combination index {col} out of range for {k} parents"))
        })?;
        let mut p_low = 1.0 - tuning.leak_probability;
        for (state, weight) in digits.iter().zip(weights.iter()) {
            p_low *= parent_factor(*state, *weight, tuning.medium_state_factor);
        }
        let p_rest = 1.0 - p_low;
        let p_medium = tuning.medium_split * p_rest;
        let p_high = p_rest - p_medium;

        let mut column = [p_low, p_medium, p_high];
        if !floor_and_renormalize(&mut column, PROBABILITY_FLOOR) {
            return Err(Error::ModelIntegrity(format!(
                "degenerate synthesized column {col} for '{}'",
                spec.variable.name()
            )));
        }
        for (row, value) in column.iter().enumerate() {
            rows[row][col] = *value;
        }
    }

    Cpt::new(
        spec.variable.name().clone(),
        rows,
        spec.parents.clone(),
        cards,
    )
}
