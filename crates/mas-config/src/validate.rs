//! Semantic validation of model configurations.
//!
//! Everything here runs at model-build time, before any network is
//! assembled. A config that fails validation is never served, not even
//! partially.

use crate::structure::ModelConfig;
use crate::tuning::{NodeType, NoisyOrTuning, MAX_FAN_IN};
use std::collections::BTreeSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Tolerance for probability-sum checks.
const PROB_TOLERANCE: f64 = 1e-6;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),

    #[error("node '{node}': {message}")]
    InvalidNode { node: String, message: String },

    #[error("intermediate '{node}': {message}")]
    InvalidIntermediate { node: String, message: String },

    #[error("invalid tuning for {node_type}: {message}")]
    InvalidTuning { node_type: String, message: String },

    #[error("outcome '{node}': {message}")]
    InvalidOutcome { node: String, message: String },

    #[error("semantic validation failed: {0}")]
    Semantic(String),
}

impl From<ValidationError> for mas_common::Error {
    fn from(err: ValidationError) -> Self {
        mas_common::Error::Config(err.to_string())
    }
}

/// Validate a full model configuration.
pub fn validate_model_config(config: &ModelConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_structure(config)?;
    validate_tunings(config)?;
    validate_esi(config)?;
    validate_aggregation(config)?;
    Ok(())
}

fn validate_structure(config: &ModelConfig) -> ValidationResult<()> {
    let structure = &config.structure;
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for node in &structure.evidence_nodes {
        if !seen.insert(node.name.as_str()) {
            return Err(ValidationError::DuplicateNode(node.name.to_string()));
        }
        if node.states.len() < 2 {
            return Err(ValidationError::InvalidNode {
                node: node.name.to_string(),
                message: format!("needs at least 2 states, got {}", node.states.len()),
            });
        }
        if node.fallback_prior.len() != node.states.len() {
            return Err(ValidationError::InvalidNode {
                node: node.name.to_string(),
                message: format!(
                    "fallback prior length {} != state count {}",
                    node.fallback_prior.len(),
                    node.states.len()
                ),
            });
        }
        let sum: f64 = node.fallback_prior.iter().sum();
        if node.fallback_prior.iter().any(|p| *p < 0.0 || !p.is_finite())
            || (sum - 1.0).abs() > PROB_TOLERANCE
        {
            return Err(ValidationError::InvalidNode {
                node: node.name.to_string(),
                message: format!("fallback prior must sum to 1.0, got {sum}"),
            });
        }
    }

    for inter in &structure.intermediates {
        if !seen.insert(inter.name.as_str()) {
            return Err(ValidationError::DuplicateNode(inter.name.to_string()));
        }
        let n = inter.parents.len();
        if !(2..=MAX_FAN_IN).contains(&n) {
            return Err(ValidationError::InvalidIntermediate {
                node: inter.name.to_string(),
                message: format!("parent count {n} outside [2, {MAX_FAN_IN}]"),
            });
        }
        let mut parent_seen = BTreeSet::new();
        for parent in &inter.parents {
            if !parent_seen.insert(parent.as_str()) {
                return Err(ValidationError::InvalidIntermediate {
                    node: inter.name.to_string(),
                    message: format!("duplicate parent '{parent}'"),
                });
            }
            let def = structure
                .evidence_nodes
                .iter()
                .find(|e| &e.name == parent)
                .ok_or_else(|| ValidationError::InvalidIntermediate {
                    node: inter.name.to_string(),
                    message: format!("parent '{parent}' is not a defined evidence node"),
                })?;
            // Noisy-OR synthesis enumerates base-3 digits; a non-ternary
            // parent would silently shift every later digit.
            if def.states.len() != 3 {
                return Err(ValidationError::InvalidIntermediate {
                    node: inter.name.to_string(),
                    message: format!(
                        "parent '{parent}' has {} states; intermediate parents must have 3",
                        def.states.len()
                    ),
                });
            }
        }
    }

    if structure.use_latent_intent {
        let latent = structure.latent_intent_name.as_ref().ok_or_else(|| {
            ValidationError::Semantic("use_latent_intent set but latent_intent_name missing".into())
        })?;
        if seen.contains(latent.as_str()) {
            return Err(ValidationError::DuplicateNode(latent.to_string()));
        }
        seen.insert(latent.as_str());
    } else if structure.latent_intent_name.is_some() {
        return Err(ValidationError::Semantic(
            "latent_intent_name set but use_latent_intent is false".into(),
        ));
    }

    if structure.intermediates.is_empty() {
        return Err(ValidationError::Semantic(
            "at least one intermediate node is required".into(),
        ));
    }

    validate_outcome(config)
}

fn validate_outcome(config: &ModelConfig) -> ValidationResult<()> {
    let structure = &config.structure;
    let outcome = &structure.outcome;

    if structure
        .evidence_nodes
        .iter()
        .any(|e| e.name == outcome.name)
        || structure.intermediates.iter().any(|i| i.name == outcome.name)
    {
        return Err(ValidationError::DuplicateNode(outcome.name.to_string()));
    }
    if !(2..=3).contains(&outcome.states.len()) {
        return Err(ValidationError::InvalidOutcome {
            node: outcome.name.to_string(),
            message: format!("outcome needs 2 or 3 states, got {}", outcome.states.len()),
        });
    }

    if let Some(cpt) = &outcome.hand_authored_cpt {
        let expected_cols = if structure.use_latent_intent {
            3
        } else {
            3usize.pow(structure.intermediates.len() as u32)
        };
        if cpt.len() != outcome.states.len() {
            return Err(ValidationError::InvalidOutcome {
                node: outcome.name.to_string(),
                message: format!("CPT has {} rows, expected {}", cpt.len(), outcome.states.len()),
            });
        }
        for row in cpt {
            if row.len() != expected_cols {
                return Err(ValidationError::InvalidOutcome {
                    node: outcome.name.to_string(),
                    message: format!("CPT row has {} columns, expected {expected_cols}", row.len()),
                });
            }
        }
        for c in 0..expected_cols {
            let sum: f64 = cpt.iter().map(|row| row[c]).sum();
            if (sum - 1.0).abs() > PROB_TOLERANCE {
                return Err(ValidationError::InvalidOutcome {
                    node: outcome.name.to_string(),
                    message: format!("CPT column {c} sums to {sum}, expected 1.0"),
                });
            }
        }
    }
    Ok(())
}

fn validate_tunings(config: &ModelConfig) -> ValidationResult<()> {
    // Every node type the structure actually uses must carry a usable
    // tuning, whether default or override.
    let mut used: BTreeSet<NodeType> = config
        .structure
        .intermediates
        .iter()
        .map(|i| i.node_type)
        .collect();
    if config.structure.use_latent_intent {
        used.insert(NodeType::LatentIntent);
    }
    if config.structure.outcome.hand_authored_cpt.is_none() {
        used.insert(NodeType::RiskOutcome);
    }

    for node_type in used {
        let tuning = config.tuning_for(node_type);
        validate_tuning(node_type, &tuning)?;
        // Weight list must cover the widest fan-in using this type.
        let max_parents = config
            .structure
            .intermediates
            .iter()
            .filter(|i| i.node_type == node_type)
            .map(|i| i.parents.len())
            .max()
            .unwrap_or(0);
        if tuning.influence_weights.len() < max_parents {
            return Err(ValidationError::InvalidTuning {
                node_type: node_type.to_string(),
                message: format!(
                    "{} influence weights for a {max_parents}-parent node",
                    tuning.influence_weights.len()
                ),
            });
        }
    }
    Ok(())
}

fn validate_tuning(node_type: NodeType, tuning: &NoisyOrTuning) -> ValidationResult<()> {
    let fail = |message: String| ValidationError::InvalidTuning {
        node_type: node_type.to_string(),
        message,
    };
    if !(0.01..=0.10).contains(&tuning.leak_probability) {
        return Err(fail(format!(
            "leak probability {} outside [0.01, 0.10]",
            tuning.leak_probability
        )));
    }
    if tuning.influence_weights.is_empty() {
        return Err(fail("influence weight list is empty".into()));
    }
    for w in &tuning.influence_weights {
        if !(0.45..=0.95).contains(w) {
            return Err(fail(format!("influence weight {w} outside [0.45, 0.95]")));
        }
    }
    for pair in tuning.influence_weights.windows(2) {
        if pair[0] <= pair[1] {
            return Err(fail("influence weights must be strictly decreasing".into()));
        }
    }
    if !(0.3..=0.6).contains(&tuning.medium_state_factor) {
        return Err(fail(format!(
            "medium state factor {} outside [0.3, 0.6]",
            tuning.medium_state_factor
        )));
    }
    if !(0.25..=0.45).contains(&tuning.medium_split) {
        return Err(fail(format!(
            "medium split {} outside [0.25, 0.45]",
            tuning.medium_split
        )));
    }
    Ok(())
}

fn validate_esi(config: &ModelConfig) -> ValidationResult<()> {
    let esi = &config.esi;
    if (esi.weights.sum() - 1.0).abs() > PROB_TOLERANCE {
        return Err(ValidationError::Semantic(format!(
            "ESI weights must sum to 1.0, got {}",
            esi.weights.sum()
        )));
    }
    let t = esi.badge_thresholds;
    if !(t.strong > t.moderate && t.moderate > t.limited && t.limited > 0.0) {
        return Err(ValidationError::Semantic(
            "ESI badge thresholds must satisfy strong > moderate > limited > 0".into(),
        ));
    }
    if !(0.0..=1.0).contains(&esi.default_confidence) {
        return Err(ValidationError::Semantic(format!(
            "default confidence {} outside [0, 1]",
            esi.default_confidence
        )));
    }
    Ok(())
}

fn validate_aggregation(config: &ModelConfig) -> ValidationResult<()> {
    let agg = &config.aggregation;
    let weight_sum: f64 = agg.typology_weights.values().sum();
    if agg.typology_weights.is_empty() || (weight_sum - 1.0).abs() > PROB_TOLERANCE {
        return Err(ValidationError::Semantic(format!(
            "typology weights must sum to 1.0, got {weight_sum}"
        )));
    }
    let (lo, hi) = agg.market_conditions_clamp;
    if !(lo < hi && lo > 0.0) {
        return Err(ValidationError::Semantic(format!(
            "market conditions clamp ({lo}, {hi}) must satisfy 0 < lo < hi"
        )));
    }
    let (medium, high) = agg.risk_thresholds;
    if !(0.0 < medium && medium < high && high <= 1.0) {
        return Err(ValidationError::Semantic(format!(
            "risk thresholds ({medium}, {high}) must satisfy 0 < medium < high <= 1"
        )));
    }
    for pair in agg.volume_steps.windows(2) {
        if pair[0].threshold <= pair[1].threshold {
            return Err(ValidationError::Semantic(
                "volume steps must be ordered highest threshold first".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::preset_structure;
    use crate::structure::ModelConfig;
    use mas_common::Typology;

    fn base_config() -> ModelConfig {
        ModelConfig::with_defaults(preset_structure(Typology::InsiderDealing))
    }

    #[test]
    fn preset_config_is_valid() {
        validate_model_config(&base_config()).unwrap();
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut cfg = base_config();
        cfg.schema_version = "0.9.0".into();
        assert!(matches!(
            validate_model_config(&cfg),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_evidence_node_rejected() {
        let mut cfg = base_config();
        let dup = cfg.structure.evidence_nodes[0].clone();
        cfg.structure.evidence_nodes.push(dup);
        assert!(matches!(
            validate_model_config(&cfg),
            Err(ValidationError::DuplicateNode(_))
        ));
    }

    #[test]
    fn bad_fallback_prior_rejected() {
        let mut cfg = base_config();
        cfg.structure.evidence_nodes[0].fallback_prior = vec![0.5, 0.4, 0.2];
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn single_parent_intermediate_rejected() {
        let mut cfg = base_config();
        cfg.structure.intermediates[0].parents.truncate(1);
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("parent count"));
    }

    #[test]
    fn seven_parent_intermediate_rejected() {
        let mut cfg = base_config();
        let extra: Vec<mas_common::NodeName> = (0..7)
            .map(|i| mas_common::NodeName::new(format!("n{i}")))
            .collect();
        cfg.structure.intermediates[0].parents = extra;
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("parent count"));
    }

    #[test]
    fn undefined_parent_rejected() {
        let mut cfg = base_config();
        cfg.structure.intermediates[0].parents[0] = "no_such_node".into();
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("not a defined evidence node"));
    }

    #[test]
    fn latent_flag_without_name_rejected() {
        let mut cfg = base_config();
        cfg.structure.latent_intent_name = None;
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("latent_intent_name"));
    }

    #[test]
    fn non_increasing_weights_rejected() {
        let mut cfg = base_config();
        let mut tuning = crate::tuning::NodeType::MarketImpact.default_tuning();
        tuning.influence_weights = vec![0.70, 0.70, 0.60];
        cfg.tuning_overrides
            .insert(crate::tuning::NodeType::MarketImpact, tuning);
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("strictly decreasing"));
    }

    #[test]
    fn leak_out_of_range_rejected() {
        let mut cfg = base_config();
        let mut tuning = crate::tuning::NodeType::MarketImpact.default_tuning();
        tuning.leak_probability = 0.2;
        cfg.tuning_overrides
            .insert(crate::tuning::NodeType::MarketImpact, tuning);
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("leak probability"));
    }

    #[test]
    fn short_weight_list_rejected() {
        let mut cfg = base_config();
        let mut tuning = crate::tuning::NodeType::BehavioralIntent.default_tuning();
        // behavioral_intent in the insider preset has 4 parents.
        tuning.influence_weights = vec![0.90, 0.80];
        cfg.tuning_overrides
            .insert(crate::tuning::NodeType::BehavioralIntent, tuning);
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("influence weights"));
    }

    #[test]
    fn esi_weights_must_sum_to_one() {
        let mut cfg = base_config();
        cfg.esi.weights.node_activation = 0.5;
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("ESI weights"));
    }

    #[test]
    fn typology_weights_must_sum_to_one() {
        let mut cfg = base_config();
        cfg.aggregation
            .typology_weights
            .insert(Typology::Spoofing, 0.9);
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("typology weights"));
    }

    #[test]
    fn bad_hand_cpt_column_sum_rejected() {
        let mut cfg = ModelConfig::with_defaults(preset_structure(Typology::Spoofing));
        if let Some(cpt) = cfg.structure.outcome.hand_authored_cpt.as_mut() {
            cpt[0][0] = 0.5;
        }
        let err = validate_model_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("column 0"));
    }

    #[test]
    fn validation_error_converts_to_common_error() {
        let err: mas_common::Error = ValidationError::Semantic("x".into()).into();
        assert_eq!(err.category(), mas_common::ErrorCategory::Config);
    }
}
