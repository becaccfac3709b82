//! MAS surveillance model configuration.
//!
//! This crate provides:
//! - Typed structs for model configuration JSON
//! - Noisy-OR tuning constants per intermediate-node type
//! - ESI and risk-aggregation parameter tables
//! - Built-in per-typology network presets
//! - Semantic validation
//!
//! The network assembler in `mas-core` accepts an already-resolved
//! [`ModelConfig`]; file lookup and JSON parsing happen here, never
//! inline in the assembler. There is no module-level default instance:
//! callers construct and pass configurations explicitly.

pub mod aggregation;
pub mod esi;
pub mod preset;
pub mod structure;
pub mod tuning;
pub mod validate;

pub use aggregation::AggregationConfig;
pub use esi::EsiConfig;
pub use preset::{intent_outcome_cpt, preset_structure};
pub use structure::{
    EvidenceNodeDef, IntermediateNodeDef, ModelConfig, NetworkStructureConfig, OutcomeNodeDef,
};
pub use tuning::{NodeType, NoisyOrTuning};
pub use validate::{validate_model_config, ValidationError, ValidationResult};

/// Schema version for model configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
