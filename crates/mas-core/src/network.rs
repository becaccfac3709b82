//! Network assembly and structural validation.
//!
//! The assembler wires evidence nodes to intermediate nodes,
//! intermediates to an optional latent-intent node, and the latent
//! intent (or the intermediates directly) to the outcome node, then
//! attaches every CPT and validates the whole graph before it can be
//! queried. The only state transition is unbuilt → built → validated:
//! [`NetworkAssembler::build`] returns an already-validated, immutable
//! graph or an error, never a partial model.

use crate::catalog::{DiscreteVariable, NodeCatalog};
use crate::cpt::Cpt;
use crate::noisy_or::{synthesize_cpt, IntermediateNodeSpec};
use mas_common::{Error, NodeName, Result};
use mas_config::tuning::FAN_IN_SMELL;
use mas_config::{validate_model_config, ModelConfig, NodeType};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, warn};

/// Immutable Bayesian network over discrete variables, one CPT per
/// node. Safe to share across concurrent scoring requests.
#[derive(Debug, Clone)]
pub struct BayesianNetworkGraph {
    catalog: NodeCatalog,
    parents: BTreeMap<NodeName, Vec<NodeName>>,
    cpts: BTreeMap<NodeName, Cpt>,
    evidence_nodes: Vec<NodeName>,
    intermediates: Vec<NodeName>,
    latent: Option<NodeName>,
    outcome: NodeName,
}

/// Structure statistics for logging and the fan-in reduction audit.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSummary {
    pub evidence_count: usize,
    pub intermediate_count: usize,
    pub has_latent_intent: bool,
    /// Sum of all CPT entries actually held.
    pub total_cpt_entries: usize,
    /// Entry count a single flat CPT over all evidence nodes would
    /// need (3 rows × 3^N columns); f64 because N = 19 already
    /// overflows nothing but makes the point.
    pub direct_model_entries: f64,
    pub cpt_sizes: BTreeMap<NodeName, usize>,
}

impl BayesianNetworkGraph {
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    pub fn parents(&self, node: &NodeName) -> Option<&[NodeName]> {
        self.parents.get(node).map(|p| p.as_slice())
    }

    pub fn cpt(&self, node: &NodeName) -> Option<&Cpt> {
        self.cpts.get(node)
    }

    pub fn cpts(&self) -> impl Iterator<Item = (&NodeName, &Cpt)> {
        self.cpts.iter()
    }

    pub fn evidence_nodes(&self) -> &[NodeName] {
        &self.evidence_nodes
    }

    pub fn intermediates(&self) -> &[NodeName] {
        &self.intermediates
    }

    pub fn latent_intent(&self) -> Option<&NodeName> {
        self.latent.as_ref()
    }

    pub fn outcome(&self) -> &NodeName {
        &self.outcome
    }

    /// Full structural validation: every CPT's evidence list must equal
    /// the node's graph predecessors in order, every column must be
    /// stochastic, and the graph must be acyclic.
    pub fn validate(&self) -> Result<()> {
        for (name, _) in self.catalog.iter() {
            let cpt = self.cpts.get(name).ok_or_else(|| {
                Error::ModelIntegrity(format!("node '{name}' has no CPT attached"))
            })?;
            let parents = self.parents.get(name).ok_or_else(|| {
                Error::ModelIntegrity(format!("node '{name}' has no predecessor list"))
            })?;
            if cpt.evidence() != parents.as_slice() {
                return Err(Error::ModelIntegrity(format!(
                    "node '{name}': CPT evidence list {:?} does not match predecessors {:?}",
                    cpt.evidence(),
                    parents
                )));
            }
            for (parent, card) in parents.iter().zip(cpt.evidence_card()) {
                let parent_var = self.catalog.require_node(parent)?;
                if parent_var.cardinality() != *card {
                    return Err(Error::ModelIntegrity(format!(
                        "node '{name}': CPT cardinality {card} for parent '{parent}' \
                         does not match its {} states",
                        parent_var.cardinality()
                    )));
                }
            }
            cpt.validate()?;
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<()> {
        // Kahn's algorithm over the parent map.
        let mut remaining_parents: BTreeMap<&NodeName, BTreeSet<&NodeName>> = self
            .parents
            .iter()
            .map(|(node, parents)| (node, parents.iter().collect()))
            .collect();
        let mut queue: VecDeque<&NodeName> = remaining_parents
            .iter()
            .filter(|(_, p)| p.is_empty())
            .map(|(n, _)| *n)
            .collect();
        let mut resolved: BTreeSet<&NodeName> = BTreeSet::new();
        while let Some(node) = queue.pop_front() {
            resolved.insert(node);
            for (child, parents) in remaining_parents.iter_mut() {
                if parents.remove(node) && parents.is_empty() && !resolved.contains(*child) {
                    queue.push_back(*child);
                }
            }
        }
        if let Some((node, _)) = remaining_parents
            .iter()
            .find(|(node, _)| !resolved.contains(*node))
        {
            return Err(Error::CycleDetected {
                node: node.to_string(),
            });
        }
        Ok(())
    }

    pub fn structure_summary(&self) -> StructureSummary {
        let cpt_sizes: BTreeMap<NodeName, usize> = self
            .cpts
            .iter()
            .map(|(name, cpt)| (name.clone(), cpt.size()))
            .collect();
        StructureSummary {
            evidence_count: self.evidence_nodes.len(),
            intermediate_count: self.intermediates.len(),
            has_latent_intent: self.latent.is_some(),
            total_cpt_entries: cpt_sizes.values().sum(),
            direct_model_entries: 3.0 * 3f64.powi(self.evidence_nodes.len() as i32),
            cpt_sizes,
        }
    }
}

/// Builds validated [`BayesianNetworkGraph`]s from a resolved
/// [`ModelConfig`]. Construction validates the config; `build` never
/// touches files or raw JSON.
#[derive(Debug, Clone)]
pub struct NetworkAssembler {
    config: ModelConfig,
}

impl NetworkAssembler {
    /// Validate the configuration and wrap it in an assembler.
    pub fn new(config: ModelConfig) -> Result<NetworkAssembler> {
        validate_model_config(&config).map_err(mas_common::Error::from)?;
        Ok(NetworkAssembler { config })
    }

    /// Assembler over a built-in typology preset.
    pub fn for_typology(typology: mas_common::Typology) -> Result<NetworkAssembler> {
        NetworkAssembler::new(ModelConfig::with_defaults(mas_config::preset_structure(
            typology,
        )))
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Build with the structure's own latent-intent setting.
    pub fn build_default(&self) -> Result<BayesianNetworkGraph> {
        self.build(self.config.structure.use_latent_intent)
    }

    /// Build and validate a network.
    ///
    /// With `use_latent_intent` a 3-state intent node (no / potential /
    /// clear intent) sits between the intermediates and the outcome;
    /// otherwise the intermediates feed the outcome directly.
    pub fn build(&self, use_latent_intent: bool) -> Result<BayesianNetworkGraph> {
        let structure = &self.config.structure;
        let mut catalog = NodeCatalog::new();
        let mut parents: BTreeMap<NodeName, Vec<NodeName>> = BTreeMap::new();
        let mut cpts: BTreeMap<NodeName, Cpt> = BTreeMap::new();

        // Evidence layer: prior-only CPTs from the fallback priors.
        let mut evidence_nodes = Vec::with_capacity(structure.evidence_nodes.len());
        for def in &structure.evidence_nodes {
            let variable = DiscreteVariable::new(
                def.name.clone(),
                def.states.clone(),
                def.fallback_prior.clone(),
                Some(def.cluster),
                def.description.clone(),
            )?;
            cpts.insert(
                def.name.clone(),
                Cpt::prior(def.name.clone(), def.fallback_prior.clone())?,
            );
            parents.insert(def.name.clone(), Vec::new());
            catalog.insert(variable)?;
            evidence_nodes.push(def.name.clone());
        }

        // Intermediate layer: noisy-OR synthesized CPTs.
        let mut intermediates = Vec::with_capacity(structure.intermediates.len());
        for def in &structure.intermediates {
            if def.parents.len() > FAN_IN_SMELL {
                warn!(
                    node = %def.name,
                    fan_in = def.parents.len(),
                    "intermediate fan-in above {FAN_IN_SMELL}; CPT has {} columns",
                    3usize.pow(def.parents.len() as u32)
                );
            }
            let variable = DiscreteVariable::hidden3(def.name.clone(), ["low", "medium", "high"]);
            let spec =
                IntermediateNodeSpec::new(variable.clone(), def.parents.clone(), def.node_type)?;
            let tuning = self.config.tuning_for(def.node_type);
            cpts.insert(def.name.clone(), synthesize_cpt(&spec, &tuning)?);
            parents.insert(def.name.clone(), def.parents.clone());
            catalog.insert(variable)?;
            intermediates.push(def.name.clone());
        }

        // Optional latent-intent layer over all intermediates.
        let latent = if use_latent_intent {
            let name = structure
                .latent_intent_name
                .clone()
                .unwrap_or_else(|| NodeName::new("latent_intent"));
            if intermediates.len() < 2 {
                return Err(Error::InvalidStructure(format!(
                    "latent intent node '{name}' needs at least 2 intermediates, got {}",
                    intermediates.len()
                )));
            }
            let variable = DiscreteVariable::hidden3(
                name.clone(),
                ["no_intent", "potential_intent", "clear_intent"],
            );
            let spec = IntermediateNodeSpec::new(
                variable.clone(),
                intermediates.clone(),
                NodeType::LatentIntent,
            )?;
            let tuning = self.config.tuning_for(NodeType::LatentIntent);
            cpts.insert(name.clone(), synthesize_cpt(&spec, &tuning)?);
            parents.insert(name.clone(), intermediates.clone());
            catalog.insert(variable)?;
            Some(name)
        } else {
            None
        };

        // Outcome layer.
        let outcome_name = structure.outcome.name.clone();
        let outcome_parents: Vec<NodeName> = match &latent {
            Some(latent) => vec![latent.clone()],
            None => intermediates.clone(),
        };
        let outcome_var = DiscreteVariable::new(
            outcome_name.clone(),
            structure.outcome.states.clone(),
            vec![1.0 / structure.outcome.states.len() as f64; structure.outcome.states.len()],
            None,
            None,
        )?;
        let outcome_cpt = self.outcome_cpt(&outcome_name, &outcome_parents, latent.is_some())?;
        cpts.insert(outcome_name.clone(), outcome_cpt);
        parents.insert(outcome_name.clone(), outcome_parents);
        catalog.insert(outcome_var)?;

        let graph = BayesianNetworkGraph {
            catalog,
            parents,
            cpts,
            evidence_nodes,
            intermediates,
            latent,
            outcome: outcome_name,
        };
        graph.validate()?;
        let summary = graph.structure_summary();
        debug!(
            typology = %structure.typology,
            evidence = summary.evidence_count,
            intermediates = summary.intermediate_count,
            latent = summary.has_latent_intent,
            total_entries = summary.total_cpt_entries,
            "network assembled"
        );
        Ok(graph)
    }

    fn outcome_cpt(
        &self,
        name: &NodeName,
        outcome_parents: &[NodeName],
        latent_in_use: bool,
    ) -> Result<Cpt> {
        let structure = &self.config.structure;
        let cards = vec![3usize; outcome_parents.len()];

        if let Some(rows) = &structure.outcome.hand_authored_cpt {
            let expected_cols: usize = cards.iter().product();
            let actual_cols = rows.first().map(|r| r.len()).unwrap_or(0);
            if actual_cols != expected_cols {
                return Err(Error::InvalidStructure(format!(
                    "outcome '{name}': hand-authored CPT has {actual_cols} columns but the \
                     requested topology (latent intent: {latent_in_use}) needs {expected_cols}"
                )));
            }
            return Cpt::new(
                name.clone(),
                rows.clone(),
                outcome_parents.to_vec(),
                cards,
            );
        }

        if outcome_parents.len() == 1 {
            if structure.outcome.states.len() != 3 {
                return Err(Error::InvalidStructure(format!(
                    "outcome '{name}': default chained table needs a 3-state outcome"
                )));
            }
            // Same table the presets hand to a latent-intent outcome.
            return Cpt::new(
                name.clone(),
                mas_config::intent_outcome_cpt(),
                outcome_parents.to_vec(),
                cards,
            );
        }

        // Synthesized outcome over the intermediates.
        if structure.outcome.states.len() != 3 {
            return Err(Error::InvalidStructure(format!(
                "outcome '{name}': synthesized outcome CPTs need a 3-state outcome; \
                 supply a hand-authored table for a {}-state one",
                structure.outcome.states.len()
            )));
        }
        let variable = DiscreteVariable::hidden3(name.clone(), ["low", "medium", "high"]);
        let spec = IntermediateNodeSpec::new(
            variable,
            outcome_parents.to_vec(),
            NodeType::RiskOutcome,
        )?;
        let tuning = self.config.tuning_for(NodeType::RiskOutcome);
        synthesize_cpt(&spec, &tuning)
    }
}
