//! Built-in per-typology network structures.
//!
//! These are the default structures the assembler falls back to when a
//! deployment ships no model configuration of its own. Each preset
//! demonstrates the fan-in reduction: raw evidence is grouped into at
//! most four intermediates of at most six parents, so no CPT ever
//! exceeds 729 columns regardless of how many evidence nodes feed the
//! model.

use crate::structure::{
    EvidenceNodeDef, IntermediateNodeDef, NetworkStructureConfig, OutcomeNodeDef,
};
use crate::tuning::NodeType;
use mas_common::{EvidenceCluster, Typology};

/// The built-in network structure for a typology.
pub fn preset_structure(typology: Typology) -> NetworkStructureConfig {
    match typology {
        Typology::InsiderDealing => insider_dealing(),
        Typology::Spoofing => spoofing(),
        Typology::EconomicWithholding => economic_withholding(),
        Typology::CrossDeskCollusion => cross_desk_collusion(),
    }
}

/// Hand-authored 3×3 outcome table over a latent-intent parent.
///
/// Columns are latent states (no / potential / clear intent), rows are
/// outcome severities. The assembler also uses this table as its
/// default whenever a single chained parent feeds the outcome, so
/// recalibrations happen in exactly one place.
pub fn intent_outcome_cpt() -> Vec<Vec<f64>> {
    vec![
        vec![0.95, 0.30, 0.05],
        vec![0.04, 0.50, 0.25],
        vec![0.01, 0.20, 0.70],
    ]
}

fn severity_states() -> Vec<String> {
    vec!["low".into(), "medium".into(), "high".into()]
}

fn insider_dealing() -> NetworkStructureConfig {
    use EvidenceCluster::*;
    NetworkStructureConfig {
        typology: Typology::InsiderDealing,
        evidence_nodes: vec![
            EvidenceNodeDef::severity3("price_sensitivity", Market, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("trade_timing_proximity", Trade, [0.80, 0.15, 0.05]),
            EvidenceNodeDef::severity3("volume_anomaly", Trade, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("mnpi_access", Mnpi, [0.90, 0.07, 0.03]),
            EvidenceNodeDef::severity3("communication_spike", Comms, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("pnl_windfall", Pnl, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("access_change_flag", Hr, [0.92, 0.06, 0.02]),
        ],
        intermediates: vec![
            IntermediateNodeDef {
                name: "market_impact".into(),
                node_type: NodeType::MarketImpact,
                parents: vec![
                    "price_sensitivity".into(),
                    "trade_timing_proximity".into(),
                    "volume_anomaly".into(),
                ],
            },
            IntermediateNodeDef {
                name: "behavioral_intent".into(),
                node_type: NodeType::BehavioralIntent,
                parents: vec![
                    "mnpi_access".into(),
                    "communication_spike".into(),
                    "pnl_windfall".into(),
                    "access_change_flag".into(),
                ],
            },
        ],
        use_latent_intent: true,
        latent_intent_name: Some("insider_intent".into()),
        outcome: OutcomeNodeDef {
            name: "insider_dealing_risk".into(),
            states: severity_states(),
            hand_authored_cpt: Some(intent_outcome_cpt()),
        },
    }
}

fn spoofing() -> NetworkStructureConfig {
    use EvidenceCluster::*;
    NetworkStructureConfig {
        typology: Typology::Spoofing,
        evidence_nodes: vec![
            EvidenceNodeDef::severity3("order_book_imbalance", Trade, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("price_reversion", Market, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("quote_flicker", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("cancellation_ratio", Trade, [0.80, 0.15, 0.05]),
            EvidenceNodeDef::severity3("order_layering", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("trade_to_order_ratio", Trade, [0.85, 0.10, 0.05]),
        ],
        intermediates: vec![
            IntermediateNodeDef {
                name: "market_impact".into(),
                node_type: NodeType::MarketImpact,
                parents: vec![
                    "order_book_imbalance".into(),
                    "price_reversion".into(),
                    "quote_flicker".into(),
                ],
            },
            IntermediateNodeDef {
                name: "behavioral_intent".into(),
                node_type: NodeType::BehavioralIntent,
                parents: vec![
                    "cancellation_ratio".into(),
                    "order_layering".into(),
                    "trade_to_order_ratio".into(),
                ],
            },
        ],
        use_latent_intent: false,
        latent_intent_name: None,
        outcome: OutcomeNodeDef {
            name: "spoofing_risk".into(),
            states: severity_states(),
            // Column index runs market_impact least-significant.
            hand_authored_cpt: Some(vec![
                vec![0.92, 0.75, 0.55, 0.70, 0.45, 0.25, 0.40, 0.20, 0.05],
                vec![0.06, 0.18, 0.28, 0.20, 0.33, 0.35, 0.32, 0.32, 0.20],
                vec![0.02, 0.07, 0.17, 0.10, 0.22, 0.40, 0.28, 0.48, 0.75],
            ]),
        },
    }
}

/// Economic withholding: 19 raw evidence nodes collapse into four
/// intermediates of {4, 4, 5, 6} parents. The direct model would need a
/// 3^19-column outcome CPT; this structure tops out at 729 columns.
fn economic_withholding() -> NetworkStructureConfig {
    use EvidenceCluster::*;
    NetworkStructureConfig {
        typology: Typology::EconomicWithholding,
        evidence_nodes: vec![
            // Cost analysis
            EvidenceNodeDef::severity3("marginal_cost_deviation", Pnl, [0.90, 0.07, 0.03]),
            EvidenceNodeDef::severity3("fuel_cost_variance", Pnl, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("heat_rate_anomaly", Pnl, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("bid_cost_markup", Pnl, [0.82, 0.12, 0.06]),
            // Market conditions
            EvidenceNodeDef::severity3("load_forecast_deviation", Market, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("price_spike_frequency", Market, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("reserve_margin_shortfall", Market, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("congestion_frequency", Market, [0.85, 0.10, 0.05]),
            // Behavioral patterns
            EvidenceNodeDef::severity3("capacity_withholding_ratio", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("bid_shape_anomaly", Trade, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("output_deviation", Trade, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("ramp_rate_anomaly", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("bid_timing_pattern", Trade, [0.85, 0.10, 0.05]),
            // Technical factors
            EvidenceNodeDef::severity3("forced_outage_frequency", Market, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("maintenance_window_overlap", Sales, [0.90, 0.07, 0.03]),
            EvidenceNodeDef::severity3("unit_commitment_anomaly", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("fuel_procurement_gap", Pnl, [0.90, 0.07, 0.03]),
            EvidenceNodeDef::severity3("transmission_constraint_claims", Market, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("emissions_limit_claims", Sales, [0.92, 0.06, 0.02]),
        ],
        intermediates: vec![
            IntermediateNodeDef {
                name: "cost_analysis".into(),
                node_type: NodeType::CostAnalysis,
                parents: vec![
                    "marginal_cost_deviation".into(),
                    "fuel_cost_variance".into(),
                    "heat_rate_anomaly".into(),
                    "bid_cost_markup".into(),
                ],
            },
            IntermediateNodeDef {
                name: "market_conditions".into(),
                node_type: NodeType::MarketConditions,
                parents: vec![
                    "load_forecast_deviation".into(),
                    "price_spike_frequency".into(),
                    "reserve_margin_shortfall".into(),
                    "congestion_frequency".into(),
                ],
            },
            IntermediateNodeDef {
                name: "behavioral_patterns".into(),
                node_type: NodeType::BehavioralPatterns,
                parents: vec![
                    "capacity_withholding_ratio".into(),
                    "bid_shape_anomaly".into(),
                    "output_deviation".into(),
                    "ramp_rate_anomaly".into(),
                    "bid_timing_pattern".into(),
                ],
            },
            IntermediateNodeDef {
                name: "technical_factors".into(),
                node_type: NodeType::TechnicalFactors,
                parents: vec![
                    "forced_outage_frequency".into(),
                    "maintenance_window_overlap".into(),
                    "unit_commitment_anomaly".into(),
                    "fuel_procurement_gap".into(),
                    "transmission_constraint_claims".into(),
                    "emissions_limit_claims".into(),
                ],
            },
        ],
        use_latent_intent: false,
        latent_intent_name: None,
        outcome: OutcomeNodeDef {
            name: "economic_withholding_risk".into(),
            states: severity_states(),
            // Four intermediate parents: synthesized, 81 columns.
            hand_authored_cpt: None,
        },
    }
}

fn cross_desk_collusion() -> NetworkStructureConfig {
    use EvidenceCluster::*;
    NetworkStructureConfig {
        typology: Typology::CrossDeskCollusion,
        evidence_nodes: vec![
            EvidenceNodeDef::severity3("synchronized_trading", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("mirror_positions", Trade, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("price_alignment", Market, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("quote_coordination", Trade, [0.90, 0.07, 0.03]),
            EvidenceNodeDef::severity3("inter_desk_comms_spike", Comms, [0.85, 0.10, 0.05]),
            EvidenceNodeDef::severity3("shared_counterparty_ratio", Sales, [0.88, 0.08, 0.04]),
            EvidenceNodeDef::severity3("meeting_trade_proximity", Comms, [0.90, 0.07, 0.03]),
        ],
        intermediates: vec![
            IntermediateNodeDef {
                name: "coordination_patterns".into(),
                node_type: NodeType::CoordinationPatterns,
                parents: vec![
                    "synchronized_trading".into(),
                    "mirror_positions".into(),
                    "price_alignment".into(),
                    "quote_coordination".into(),
                ],
            },
            IntermediateNodeDef {
                name: "communication_intent".into(),
                node_type: NodeType::CommunicationIntent,
                parents: vec![
                    "inter_desk_comms_spike".into(),
                    "shared_counterparty_ratio".into(),
                    "meeting_trade_proximity".into(),
                ],
            },
        ],
        use_latent_intent: true,
        latent_intent_name: Some("collusion_intent".into()),
        outcome: OutcomeNodeDef {
            name: "collusion_risk".into(),
            states: severity_states(),
            hand_authored_cpt: Some(intent_outcome_cpt()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_model_config;
    use crate::ModelConfig;

    #[test]
    fn all_presets_validate() {
        for typology in Typology::ALL {
            let cfg = ModelConfig::with_defaults(preset_structure(*typology));
            validate_model_config(&cfg).unwrap_or_else(|e| panic!("{typology}: {e}"));
        }
    }

    #[test]
    fn withholding_has_nineteen_evidence_nodes() {
        let s = preset_structure(Typology::EconomicWithholding);
        assert_eq!(s.evidence_nodes.len(), 19);
        let sizes: Vec<usize> = s.intermediates.iter().map(|i| i.parents.len()).collect();
        assert_eq!(sizes, vec![4, 4, 5, 6]);
    }

    #[test]
    fn latent_intent_presets_name_the_latent_node() {
        for typology in [Typology::InsiderDealing, Typology::CrossDeskCollusion] {
            let s = preset_structure(typology);
            assert!(s.use_latent_intent);
            assert!(s.latent_intent_name.is_some());
        }
    }

    #[test]
    fn spoofing_hand_cpt_columns_are_stochastic() {
        let s = preset_structure(Typology::Spoofing);
        let cpt = s.outcome.hand_authored_cpt.unwrap();
        assert_eq!(cpt.len(), 3);
        let cols = cpt[0].len();
        assert_eq!(cols, 9);
        for c in 0..cols {
            let sum: f64 = cpt.iter().map(|row| row[c]).sum();
            assert!((sum - 1.0).abs() < 1e-9, "column {c} sums to {sum}");
        }
    }

    #[test]
    fn preset_parents_reference_defined_evidence() {
        for typology in Typology::ALL {
            let s = preset_structure(*typology);
            for inter in &s.intermediates {
                for parent in &inter.parents {
                    assert!(
                        s.evidence_nodes.iter().any(|n| &n.name == parent),
                        "{typology}: undefined parent {parent}"
                    );
                }
            }
        }
    }
}
