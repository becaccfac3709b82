//! Probability-vector primitives.
//!
//! Discrete distributions in this codebase are plain `&[f64]` slices.
//! These helpers centralize the tolerance checks and renormalization
//! rules so every CPT column and fallback prior goes through one code
//! path.

/// Tolerance for treating a probability vector as normalized.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// Returns true when `values` sums to 1.0 within `tol` and every entry
/// is finite and non-negative.
pub fn is_normalized(values: &[f64], tol: f64) -> bool {
    if values.is_empty() {
        return false;
    }
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return false;
    }
    let sum: f64 = values.iter().sum();
    (sum - 1.0).abs() <= tol
}

/// Rescale `values` in place so they sum to exactly 1.0.
///
/// Returns false (leaving the slice untouched) when the sum is zero,
/// non-finite, or any entry is negative.
pub fn renormalize(values: &mut [f64]) -> bool {
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return false;
    }
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return false;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
    true
}

/// Floor every entry at `floor` while keeping the sum at exactly 1.0.
///
/// Entries below the floor are pinned to it and the remaining mass is
/// rescaled over the others, so every state keeps at least `floor`
/// support after the call. Returns false on degenerate input: empty
/// slice, negative or non-finite entries, zero total mass, or a floor
/// too large for the slice length.
pub fn floor_and_renormalize(values: &mut [f64], floor: f64) -> bool {
    if values.is_empty() || floor < 0.0 || floor * values.len() as f64 >= 1.0 {
        return false;
    }
    if !renormalize(values) {
        return false;
    }
    // Rescaling the free entries can push another one under the floor,
    // so iterate; the pinned set only grows, so this terminates.
    loop {
        let mut pinned_mass = 0.0;
        let mut free_mass = 0.0;
        for v in values.iter_mut() {
            if *v <= floor {
                *v = floor;
                pinned_mass += floor;
            } else {
                free_mass += *v;
            }
        }
        if free_mass <= 0.0 {
            let uniform = 1.0 / values.len() as f64;
            for v in values.iter_mut() {
                *v = uniform;
            }
            return true;
        }
        let scale = (1.0 - pinned_mass) / free_mass;
        let mut stable = true;
        for v in values.iter_mut() {
            if *v > floor {
                *v *= scale;
                if *v < floor {
                    stable = false;
                }
            }
        }
        if stable {
            return true;
        }
    }
}

/// Index of the maximum entry, ties broken by the lowest index.
///
/// Returns None for an empty slice or when any entry is NaN.
pub fn argmax_tie_lowest(values: &[f64]) -> Option<usize> {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut best = 0usize;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    Some(best)
}

/// Clamp a score into [0, 1]. NaN maps to 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
