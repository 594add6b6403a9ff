//! Linear dot-product ranking for vector search.
//!
//! Scores are not normalized by magnitude; longer vectors score higher.

use std::cmp::Ordering;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Sum of element-wise products over `stored`'s length. Query components
/// past its end are ignored; missing ones count as zero.
pub fn dot_product(stored: &[f64], query: &[f64]) -> f64 {
    stored
        .iter()
        .enumerate()
        .map(|(i, v)| v * query.get(i).copied().unwrap_or(0.0))
        .sum()
}

/// Top `limit` items by descending score. Equal scores keep input order.
pub fn rank_by_dot_product<T>(
    items: Vec<T>,
    query: &[f64],
    limit: usize,
    vector_of: impl Fn(&T) -> &[f64],
) -> Vec<T> {
    let mut scored: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| (dot_product(vector_of(&item), query), item))
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored.into_iter().map(|(_, item)| item).collect()
}
