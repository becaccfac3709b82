//! Discrete factors and the operations variable elimination needs.
//!
//! A factor is an unnormalized non-negative table over an ordered list
//! of variables, indexed mixed-radix with the first variable in the
//! least-significant position (the CPT column convention carried
//! through unchanged).

use crate::cpt::Cpt;
use mas_common::{Error, NodeName, Result};
use mas_math::{combination_count, decode_combination, encode_combination};

#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    vars: Vec<NodeName>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Factor {
    /// Build a factor from a CPT: variables are the child followed by
    /// the CPT's evidence list.
    pub fn from_cpt(cpt: &Cpt) -> Factor {
        let mut vars = Vec::with_capacity(1 + cpt.evidence().len());
        vars.push(cpt.child().clone());
        vars.extend_from_slice(cpt.evidence());
        let mut cards = Vec::with_capacity(vars.len());
        cards.push(cpt.child_card());
        cards.extend_from_slice(cpt.evidence_card());

        let total = combination_count(&cards);
        let mut values = Vec::with_capacity(total);
        for index in 0..total {
            // index < total by construction.
            let digits = decode_combination(index, &cards).unwrap_or_default();
            let child_state = digits[0];
            let col = encode_combination(&digits[1..], cpt.evidence_card()).unwrap_or(0);
            values.push(cpt.value(child_state, col));
        }
        Factor { vars, cards, values }
    }

    pub fn vars(&self) -> &[NodeName] {
        &self.vars
    }

    pub fn contains(&self, var: &NodeName) -> bool {
        self.vars.contains(var)
    }

    /// A variable-less constant factor.
    pub fn constant(value: f64) -> Factor {
        Factor {
            vars: Vec::new(),
            cards: Vec::new(),
            values: vec![value],
        }
    }

    /// Condition on `var = state`, dropping the variable.
    pub fn restrict(&self, var: &NodeName, state: usize) -> Result<Factor> {
        let pos = self
            .vars
            .iter()
            .position(|v| v == var)
            .ok_or_else(|| Error::Inference(format!("restrict: factor lacks variable '{var}'")))?;
        if state >= self.cards[pos] {
            return Err(Error::EvidenceOutOfRange {
                node: var.to_string(),
                state,
                cardinality: self.cards[pos],
            });
        }
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let total = combination_count(&cards);
        let mut values = Vec::with_capacity(total);
        for index in 0..total {
            let mut digits = decode_combination(index, &cards).unwrap_or_default();
            digits.insert(pos, state);
            let source = encode_combination(&digits, &self.cards).unwrap_or(0);
            values.push(self.values[source]);
        }
        Ok(Factor { vars, cards, values })
    }

    /// Pointwise product over the union of both variable lists.
    pub fn multiply(&self, other: &Factor) -> Factor {
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        for (var, card) in other.vars.iter().zip(other.cards.iter()) {
            if !vars.contains(var) {
                vars.push(var.clone());
                cards.push(*card);
            }
        }

        let self_pos: Vec<usize> = self
            .vars
            .iter()
            .map(|v| vars.iter().position(|u| u == v).unwrap_or(0))
            .collect();
        let other_pos: Vec<usize> = other
            .vars
            .iter()
            .map(|v| vars.iter().position(|u| u == v).unwrap_or(0))
            .collect();

        let total = combination_count(&cards);
        let mut values = Vec::with_capacity(total);
        for index in 0..total {
            let digits = decode_combination(index, &cards).unwrap_or_default();
            let self_digits: Vec<usize> = self_pos.iter().map(|p| digits[*p]).collect();
            let other_digits: Vec<usize> = other_pos.iter().map(|p| digits[*p]).collect();
            let a = encode_combination(&self_digits, &self.cards).unwrap_or(0);
            let b = encode_combination(&other_digits, &other.cards).unwrap_or(0);
            values.push(self.values[a] * other.values[b]);
        }
        Factor { vars, cards, values }
    }

    /// Marginalize `var` out by summation.
    pub fn sum_out(&self, var: &NodeName) -> Result<Factor> {
        let pos = self
            .vars
            .iter()
            .position(|v| v == var)
            .ok_or_else(|| Error::Inference(format!("sum_out: factor lacks variable '{var}'")))?;
        let card = self.cards[pos];
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let total = combination_count(&cards);
        let mut values = vec![0.0; total];
        for (index, value) in values.iter_mut().enumerate() {
            let digits = decode_combination(index, &cards).unwrap_or_default();
            for state in 0..card {
                let mut full = digits.clone();
                full.insert(pos, state);
                let source = encode_combination(&full, &self.cards).unwrap_or(0);
                *value += self.values[source];
            }
        }
        Ok(Factor { vars, cards, values })
    }

    /// Normalize a single-variable factor into a distribution.
    pub fn normalize(&self) -> Result<Vec<f64>> {
        if self.vars.len() != 1 {
            return Err(Error::Inference(format!(
                "normalize: expected a single-variable factor, got {} variables",
                self.vars.len()
            )));
        }
        let sum: f64 = self.values.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Err(Error::Inference(
                "posterior has zero or non-finite mass".to_string(),
            ));
        }
        Ok(self.values.iter().map(|v| v / sum).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> NodeName {
        NodeName::new(s)
    }

    fn prior_factor(node: &str, probs: Vec<f64>) -> Factor {
        Factor::from_cpt(&Cpt::prior(name(node), probs).unwrap())
    }

    fn chain_cpt() -> Cpt {
        // P(b | a) for binary a: columns a=0, a=1.
        Cpt::new(
            name("b"),
            vec![vec![0.9, 0.2], vec![0.1, 0.8]],
            vec![name("a")],
            vec![2],
        )
        .unwrap()
    }

    #[test]
    fn from_cpt_layout() {
        let factor = Factor::from_cpt(&chain_cpt());
        assert_eq!(factor.vars(), &[name("b"), name("a")]);
        // index = b + 2*a
        assert_eq!(factor.values, vec![0.9, 0.1, 0.2, 0.8]);
    }

    #[test]
    fn restrict_selects_column() {
        let factor = Factor::from_cpt(&chain_cpt());
        let restricted = factor.restrict(&name("a"), 1).unwrap();
        assert_eq!(restricted.vars(), &[name("b")]);
        assert_eq!(restricted.values, vec![0.2, 0.8]);
    }

    #[test]
    fn restrict_out_of_range_errors() {
        let factor = Factor::from_cpt(&chain_cpt());
        let err = factor.restrict(&name("a"), 2).unwrap_err();
        assert!(matches!(err, Error::EvidenceOutOfRange { .. }));
    }

    #[test]
    fn restrict_missing_var_errors() {
        let factor = Factor::from_cpt(&chain_cpt());
        assert!(factor.restrict(&name("zzz"), 0).is_err());
    }

    #[test]
    fn multiply_then_sum_out_marginalizes_chain() {
        // P(a) = [0.6, 0.4]; P(b) = sum_a P(b|a) P(a).
        let joint = Factor::from_cpt(&chain_cpt()).multiply(&prior_factor("a", vec![0.6, 0.4]));
        let marginal = joint.sum_out(&name("a")).unwrap();
        let probs = marginal.normalize().unwrap();
        assert!((probs[0] - (0.9 * 0.6 + 0.2 * 0.4)).abs() < 1e-12);
        assert!((probs[1] - (0.1 * 0.6 + 0.8 * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn multiply_is_commutative() {
        let a = prior_factor("a", vec![0.6, 0.4]);
        let b = Factor::from_cpt(&chain_cpt());
        let ab = a.multiply(&b);
        let ba = b.multiply(&a);
        let pa = ab.sum_out(&name("a")).unwrap().normalize().unwrap();
        let pb = ba.sum_out(&name("a")).unwrap().normalize().unwrap();
        for (x, y) in pa.iter().zip(pb.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn multiply_by_constant_scales() {
        let a = prior_factor("a", vec![0.6, 0.4]);
        let scaled = a.multiply(&Factor::constant(2.0));
        assert_eq!(scaled.values, vec![1.2, 0.8]);
    }

    #[test]
    fn normalize_rejects_multivar() {
        let joint = Factor::from_cpt(&chain_cpt());
        assert!(joint.normalize().is_err());
    }

    #[test]
    fn normalize_rejects_zero_mass() {
        let zero = Factor {
            vars: vec![name("a")],
            cards: vec![2],
            values: vec![0.0, 0.0],
        };
        assert!(zero.normalize().is_err());
    }
}
