//! Shannon entropy over observed state counts.

/// Shannon entropy (base 2) of a distribution given as raw counts.
///
/// Zero counts are skipped. Returns 0.0 when fewer than two categories
/// carry mass.
pub fn shannon_entropy_base2(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for count in counts {
        if *count == 0 {
            continue;
        }
        let p = *count as f64 / total as f64;
        entropy -= p * p.log2();
    }
    entropy
}

/// Entropy of `counts` normalized into [0, 1] by the maximum entropy
/// over the observed support, log2(#categories with mass).
///
/// Returns 0.0 when one or zero categories carry mass (a single
/// observed state carries no spread information).
pub fn normalized_entropy(counts: &[usize]) -> f64 {
    let support = counts.iter().filter(|c| **c > 0).count();
    if support < 2 {
        return 0.0;
    }
    let max_entropy = (support as f64).log2();
    (shannon_entropy_base2(counts) / max_entropy).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn entropy_of_uniform_pair_is_one_bit() {
        assert!(approx_eq(shannon_entropy_base2(&[5, 5]), 1.0, 1e-12));
    }

    #[test]
    fn entropy_of_single_category_is_zero() {
        assert_eq!(shannon_entropy_base2(&[7]), 0.0);
        assert_eq!(shannon_entropy_base2(&[7, 0, 0]), 0.0);
    }

    #[test]
    fn entropy_of_empty_is_zero() {
        assert_eq!(shannon_entropy_base2(&[]), 0.0);
        assert_eq!(shannon_entropy_base2(&[0, 0]), 0.0);
    }

    #[test]
    fn normalized_uniform_is_one() {
        assert!(approx_eq(normalized_entropy(&[3, 3, 3]), 1.0, 1e-12));
    }

    #[test]
    fn normalized_single_state_is_zero() {
        assert_eq!(normalized_entropy(&[9, 0]), 0.0);
    }

    #[test]
    fn normalized_skewed_is_between() {
        let e = normalized_entropy(&[9, 1]);
        assert!(e > 0.0 && e < 1.0);
    }

    #[test]
    fn normalized_ignores_zero_count_categories() {
        // Support is {a, b}, so normalization uses log2(2) not log2(3).
        assert!(approx_eq(normalized_entropy(&[4, 4, 0]), 1.0, 1e-12));
    }
}
