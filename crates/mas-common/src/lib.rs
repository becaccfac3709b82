//! MAS surveillance common types and errors.
//!
//! This crate provides foundational types shared across the mas-*
//! crates:
//! - The unified, categorized error type
//! - Node naming and abuse-typology enums
//! - Risk-level banding

pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use types::{EvidenceCluster, NodeName, RiskLevel, Typology};
