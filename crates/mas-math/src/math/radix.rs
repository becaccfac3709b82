//! Mixed-radix combination indexing for CPT columns.
//!
//! A CPT column index encodes one joint assignment of the parent
//! variables as a mixed-radix number: digit `j` is the state of parent
//! `j`, with the FIRST parent in the least-significant position. This
//! ordering is load-bearing — the synthesizer, the assembler, and the
//! inference factors must all agree on it.

/// Total number of joint assignments for the given cardinalities.
///
/// Returns 1 for an empty list (the single empty assignment).
pub fn combination_count(cards: &[usize]) -> usize {
    cards.iter().product()
}

/// Decode a combination index into per-parent state digits.
///
/// Digit `j` of the result is the state of parent `j` (first parent =
/// least-significant digit). Returns None when `index` is out of range
/// or any cardinality is zero.
pub fn decode_combination(index: usize, cards: &[usize]) -> Option<Vec<usize>> {
    if cards.iter().any(|c| *c == 0) {
        return None;
    }
    if index >= combination_count(cards) {
        return None;
    }
    let mut digits = Vec::with_capacity(cards.len());
    let mut rest = index;
    for card in cards {
        digits.push(rest % card);
        rest /= card;
    }
    Some(digits)
}

/// Encode per-parent state digits into a combination index.
///
/// Inverse of [`decode_combination`]. Returns None when lengths differ
/// or any digit is out of range for its cardinality.
pub fn encode_combination(digits: &[usize], cards: &[usize]) -> Option<usize> {
    if digits.len() != cards.len() {
        return None;
    }
    let mut index = 0usize;
    let mut stride = 1usize;
    for (digit, card) in digits.iter().zip(cards.iter()) {
        if *card == 0 || digit >= card {
            return None;
        }
        index += digit * stride;
        stride *= card;
    }
    Some(index)
}
