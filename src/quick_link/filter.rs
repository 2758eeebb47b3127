/// Rows shown (and reachable from the keyboard) for any query.
pub const MAX_VISIBLE_RESULTS: usize = 5;

/// Titles containing `query`, compared lower-cased, in their original order.
///
/// A blank query keeps every candidate.
pub fn filter_candidates<T: AsRef<str> + Clone>(candidates: &[T], query: &str) -> Vec<T> {
    if query.trim().is_empty() {
        return candidates.to_vec();
    }

    let needle = query.to_lowercase();
    candidates
        .iter()
        .filter(|title| title.as_ref().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// The displayed prefix of a result set.
pub fn visible<T>(results: &[T]) -> &[T] {
    &results[..results.len().min(MAX_VISIBLE_RESULTS)]
}
