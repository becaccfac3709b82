//! Alert records handed to downstream generators.
//!
//! One record carries everything an alert/report generator and a
//! regulator-facing audit trail need: the posterior, the scalar
//! scores, the ESI result, and the exact evidence (with fallback
//! flags) the verdict was computed from.

use crate::aggregate::RiskBreakdown;
use crate::esi::EsiResult;
use crate::evidence::EvidenceMap;
use crate::inference::InferenceResult;
use chrono::{DateTime, Utc};
use mas_common::{RiskLevel, Typology};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A complete, self-describing surveillance alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertRecord {
    /// Unique alert id (UUID v4, stored as its string form).
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub typology: Typology,
    /// Outcome-node posterior and per-evidence-node fallback flags.
    pub inference: InferenceResult,
    /// ESI-adjusted Bayesian score fed into aggregation.
    pub adjusted_score: f64,
    pub esi: EsiResult,
    /// Full contextual aggregation, when context was supplied.
    pub breakdown: Option<RiskBreakdown>,
    pub risk_level: RiskLevel,
    /// The observations as supplied by the caller, pre-fallback.
    pub evidence: EvidenceMap,
}

impl AlertRecord {
    /// Assemble a record for one scored request. `risk_level` is taken
    /// from the breakdown when present, otherwise banded from the
    /// adjusted score with the given thresholds.
    pub fn new(
        typology: Typology,
        inference: InferenceResult,
        esi: EsiResult,
        adjusted_score: f64,
        breakdown: Option<RiskBreakdown>,
        evidence: EvidenceMap,
        risk_thresholds: (f64, f64),
    ) -> AlertRecord {
        let risk_level = match &breakdown {
            Some(b) => b.risk_level,
            None => RiskLevel::from_score(adjusted_score, risk_thresholds.0, risk_thresholds.1),
        };
        AlertRecord {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            typology,
            inference,
            adjusted_score,
            esi,
            breakdown,
            risk_level,
            evidence,
        }
    }
}
