//! MAS surveillance core.
//!
//! Scores trading activity for market-abuse typologies using discrete
//! Bayesian networks made tractable by fan-in reduction: raw evidence
//! nodes feed small intermediate aggregation nodes with noisy-OR
//! synthesized CPTs, intermediates feed an optional latent-intent node,
//! and a final outcome node yields the per-typology posterior. On top
//! of the posterior sit the Evidence Sufficiency Index and the complex
//! risk aggregator with news-context suppression.
//!
//! The built network is immutable and `Send + Sync`; concurrent
//! requests safely share one instance because inference never mutates
//! the graph or its CPTs.

pub mod aggregate;
pub mod alert;
pub mod catalog;
pub mod cpt;
pub mod esi;
pub mod evidence;
pub mod inference;
pub mod logging;
pub mod network;
pub mod noisy_or;

pub use aggregate::{
    classify_news_context, NewsContext, RiskAggregator, RiskBreakdown, TradingContext,
};
pub use alert::AlertRecord;
pub use catalog::{DiscreteVariable, NodeCatalog, NodeValue};
pub use cpt::Cpt;
pub use esi::{adjust_risk_score, calculate_esi, EsiBadge, EsiComponents, EsiInput, EsiResult};
pub use evidence::EvidenceMap;
pub use inference::{InferenceAdapter, InferenceResult};
pub use network::{BayesianNetworkGraph, NetworkAssembler, StructureSummary};
pub use noisy_or::{synthesize_cpt, IntermediateNodeSpec};
