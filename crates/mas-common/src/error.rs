//! Error types for the MAS surveillance core.
//!
//! Structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for the enclosing service layer
//!
//! Configuration and structural errors are fatal at model-build time:
//! no partial or degraded model is ever served. Evidence errors reject
//! the single request that carried them. Aggregation-layer soft
//! failures never surface here at all; that layer degrades to neutral
//! multipliers and logs instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for MAS core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model configuration errors (structure, tuning, CPT overrides).
    Config,
    /// Per-request evidence errors (unknown node, out-of-range state).
    Evidence,
    /// Network assembly / structural integrity errors.
    Model,
    /// Exact-inference failures.
    Inference,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Evidence => write!(f, "evidence"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Inference => write!(f, "inference"),
        }
    }
}

/// Unified error type for the MAS surveillance core.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid tuning for node type {node_type}: {message}")]
    InvalidTuning { node_type: String, message: String },

    #[error("invalid network structure: {0}")]
    InvalidStructure(String),

    // Evidence errors (20-29)
    #[error("unknown node '{node}' in supplied evidence")]
    UnknownNode { node: String },

    #[error("evidence for '{node}' out of range: state {state} not in [0, {cardinality})")]
    EvidenceOutOfRange {
        node: String,
        state: usize,
        cardinality: usize,
    },

    // Model integrity errors (30-39)
    #[error("model integrity violation: {0}")]
    ModelIntegrity(String),

    #[error("CPT for '{node}' malformed: {message}")]
    MalformedCpt { node: String, message: String },

    #[error("node '{node}' fan-in of {fan_in} exceeds the maximum of {max}")]
    FanInExceeded {
        node: String,
        fan_in: usize,
        max: usize,
    },

    #[error("network contains a cycle involving '{node}'")]
    CycleDetected { node: String },

    // Inference errors (40-49)
    #[error("inference failed: {0}")]
    Inference(String),
}

impl Error {
    /// Stable numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidTuning { .. } => 11,
            Error::InvalidStructure(_) => 12,
            Error::UnknownNode { .. } => 20,
            Error::EvidenceOutOfRange { .. } => 21,
            Error::ModelIntegrity(_) => 30,
            Error::MalformedCpt { .. } => 31,
            Error::FanInExceeded { .. } => 32,
            Error::CycleDetected { .. } => 33,
            Error::Inference(_) => 40,
        }
    }

    /// Category the error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidTuning { .. } | Error::InvalidStructure(_) => {
                ErrorCategory::Config
            }
            Error::UnknownNode { .. } | Error::EvidenceOutOfRange { .. } => {
                ErrorCategory::Evidence
            }
            Error::ModelIntegrity(_)
            | Error::MalformedCpt { .. }
            | Error::FanInExceeded { .. }
            | Error::CycleDetected { .. } => ErrorCategory::Model,
            Error::Inference(_) => ErrorCategory::Inference,
        }
    }

    /// Whether the caller can plausibly recover by fixing its input.
    ///
    /// Evidence errors are recoverable (the evidence mapper can fix the
    /// request); config/model errors require an operator.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Evidence)
    }
}

/// Serializable error shape for agent/service consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();
        match err {
            Error::UnknownNode { node } => {
                context.insert("node".to_string(), serde_json::json!(node));
            }
            Error::EvidenceOutOfRange {
                node,
                state,
                cardinality,
            } => {
                context.insert("node".to_string(), serde_json::json!(node));
                context.insert("state".to_string(), serde_json::json!(state));
                context.insert("cardinality".to_string(), serde_json::json!(cardinality));
            }
            Error::MalformedCpt { node, .. } | Error::CycleDetected { node } => {
                context.insert("node".to_string(), serde_json::json!(node));
            }
            Error::FanInExceeded { node, fan_in, max } => {
                context.insert("node".to_string(), serde_json::json!(node));
                context.insert("fan_in".to_string(), serde_json::json!(fan_in));
                context.insert("max".to_string(), serde_json::json!(max));
            }
            _ => {}
        }
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"code":{},"message":"serialization failed"}}"#,
                self.code
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(
            Error::UnknownNode {
                node: "n".into()
            }
            .code(),
            20
        );
        assert_eq!(Error::ModelIntegrity("x".into()).code(), 30);
        assert_eq!(Error::Inference("x".into()).code(), 40);
    }

    #[test]
    fn categories_group_variants() {
        assert_eq!(
            Error::InvalidStructure("x".into()).category(),
            ErrorCategory::Config
        );
        assert_eq!(
            Error::EvidenceOutOfRange {
                node: "n".into(),
                state: 5,
                cardinality: 3
            }
            .category(),
            ErrorCategory::Evidence
        );
        assert_eq!(
            Error::CycleDetected { node: "n".into() }.category(),
            ErrorCategory::Model
        );
    }

    #[test]
    fn only_evidence_errors_are_recoverable() {
        assert!(Error::UnknownNode { node: "n".into() }.is_recoverable());
        assert!(!Error::Config("x".into()).is_recoverable());
        assert!(!Error::ModelIntegrity("x".into()).is_recoverable());
    }

    #[test]
    fn out_of_range_message_names_node_and_bounds() {
        let err = Error::EvidenceOutOfRange {
            node: "marginal_cost_deviation".into(),
            state: 4,
            cardinality: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("marginal_cost_deviation"));
        assert!(msg.contains("[0, 3)"));
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::EvidenceOutOfRange {
            node: "order_cancellation".into(),
            state: 7,
            cardinality: 3,
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 21);
        assert_eq!(structured.category, ErrorCategory::Evidence);
        assert!(structured.recoverable);
        assert_eq!(
            structured.context.get("cardinality"),
            Some(&serde_json::json!(3))
        );
    }

    #[test]
    fn structured_error_serializes() {
        let err = Error::FanInExceeded {
            node: "cost_analysis".into(),
            fan_in: 7,
            max: 6,
        };
        let json = StructuredError::from(&err).to_json();
        assert!(json.contains(r#""code":32"#));
        assert!(json.contains(r#""category":"model""#));
    }
}
