//! Picks a single entity out of an author's candidate set.

use crate::types::Binding;

/// Selection policy:
/// - no candidates: unresolved
/// - exactly one candidate: trusted unconditionally, no label check
/// - several candidates: the first whose label is edit distance 0 from the
///   formatted name; if none matches exactly, unresolved even though
///   candidates exist
///
/// The single/multi asymmetry is deliberate tie-break policy, not an
/// oversight.
pub fn choose<'a>(formatted: &str, bindings: &'a [Binding]) -> Option<&'a Binding> {
    match bindings {
        [] => None,
        [only] => Some(only),
        many => many
            .iter()
            .find(|b| levenshtein(formatted, &b.label.value) == 0),
    }
}

/// Levenshtein distance over chars, single-row DP.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut corner = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (corner + cost).min(row[j] + 1).min(row[j + 1] + 1);
            corner = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}
