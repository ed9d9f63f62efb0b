use std::cmp::Ordering;

use super::super::domain::Application;

/// Deterministic candidate ordering: higher `total_score` first, a missing
/// score below any present score, ties broken by earlier `created_at`.
pub(crate) fn rank_order(a: &Application, b: &Application) -> Ordering {
    match (a.total_score, b.total_score) {
        (Some(left), Some(right)) => right
            .partial_cmp(&left)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.created_at.cmp(&b.created_at)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    }
}

/// Rank the candidates and split them at the quota: the top `quota` are
/// accepted, the remainder rejected.
pub(crate) fn take_top<'a>(
    mut candidates: Vec<&'a Application>,
    quota: usize,
) -> (Vec<&'a Application>, Vec<&'a Application>) {
    candidates.sort_by(|a, b| rank_order(a, b));
    let rejected = candidates.split_off(quota.min(candidates.len()));
    (candidates, rejected)
}
