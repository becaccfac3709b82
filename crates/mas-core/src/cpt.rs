//! Conditional probability tables.
//!
//! A [`Cpt`] is a row-major table: rows are child states, columns are
//! joint parent assignments. The column index is the mixed-radix
//! number over parent state indices with the FIRST parent in the
//! least-significant position; `evidence` and `evidence_card` record
//! the parent order the columns were built against, and the assembler
//! asserts that order equals the node's graph predecessors.

use mas_common::{Error, NodeName, Result};
use mas_math::{combination_count, is_normalized, NORMALIZATION_TOLERANCE};

/// A conditional probability table attached to exactly one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Cpt {
    child: NodeName,
    child_card: usize,
    /// Row-major values, `child_card` rows × `cols()` columns.
    values: Vec<f64>,
    evidence: Vec<NodeName>,
    evidence_card: Vec<usize>,
}

impl Cpt {
    /// Build a CPT from explicit rows.
    ///
    /// Every column must sum to 1.0 within tolerance; rows must all
    /// have `∏ evidence_card` entries.
    pub fn new(
        child: NodeName,
        rows: Vec<Vec<f64>>,
        evidence: Vec<NodeName>,
        evidence_card: Vec<usize>,
    ) -> Result<Cpt> {
        if evidence.len() != evidence_card.len() {
            return Err(Error::MalformedCpt {
                node: child.to_string(),
                message: format!(
                    "evidence list has {} names but {} cardinalities",
                    evidence.len(),
                    evidence_card.len()
                ),
            });
        }
        let child_card = rows.len();
        if child_card < 2 {
            return Err(Error::MalformedCpt {
                node: child.to_string(),
                message: format!("child needs at least 2 states, got {child_card}"),
            });
        }
        let cols = combination_count(&evidence_card);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::MalformedCpt {
                    node: child.to_string(),
                    message: format!("row {r} has {} entries, expected {cols}", row.len()),
                });
            }
        }
        let mut values = Vec::with_capacity(child_card * cols);
        for row in &rows {
            values.extend_from_slice(row);
        }
        let cpt = Cpt {
            child,
            child_card,
            values,
            evidence,
            evidence_card,
        };
        cpt.validate()?;
        Ok(cpt)
    }

    /// Parent-less prior CPT (one column).
    pub fn prior(child: NodeName, probs: Vec<f64>) -> Result<Cpt> {
        let rows = probs.into_iter().map(|p| vec![p]).collect();
        Cpt::new(child, rows, Vec::new(), Vec::new())
    }

    pub fn child(&self) -> &NodeName {
        &self.child
    }

    pub fn child_card(&self) -> usize {
        self.child_card
    }

    pub fn evidence(&self) -> &[NodeName] {
        &self.evidence
    }

    pub fn evidence_card(&self) -> &[usize] {
        &self.evidence_card
    }

    /// Number of parent-assignment columns.
    pub fn cols(&self) -> usize {
        combination_count(&self.evidence_card)
    }

    /// Total number of table entries.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// P(child = `row` | parents = column `col`).
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols() + col]
    }

    /// One column as a child-state distribution.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.child_card).map(|r| self.value(r, col)).collect()
    }

    /// Re-check the stochastic-column invariant.
    ///
    /// Construction already enforces it; the inference adapter runs
    /// this again before every query so an ill-formed table can never
    /// silently reach the elimination routine.
    pub fn validate(&self) -> Result<()> {
        for c in 0..self.cols() {
            let column = self.column(c);
            if !is_normalized(&column, NORMALIZATION_TOLERANCE) {
                let sum: f64 = column.iter().sum();
                return Err(Error::MalformedCpt {
                    node: self.child.to_string(),
                    message: format!("column {c} sums to {sum}, expected 1.0"),
                });
            }
        }
        Ok(())
    }
}
