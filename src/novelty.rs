use crate::results::ResultSet;
use std::collections::HashSet;

/// Returns true when fewer than `top_k` labels are shared between the two
/// frames. Only label membership matters, not order or score.
pub fn is_novel(current: &ResultSet, previous: &ResultSet, top_k: usize) -> bool {
    let old: HashSet<&str> = previous.labels().collect();
    let shared = current
        .labels()
        .collect::<HashSet<_>>()
        .intersection(&old)
        .count();
    shared < top_k
}
