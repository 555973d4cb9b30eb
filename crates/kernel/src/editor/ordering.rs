//! Pure ordering computations over a template's block list.
//!
//! The transactional shell in [`super::mutation`] loads the current order,
//! calls into here, and persists the result; no ordering arithmetic happens
//! anywhere else. After any successful mutation the `sort_order` values of a
//! template's blocks form exactly `{0, 1, ..., N-1}`.

use uuid::Uuid;

/// Compute the new id order after moving `moved` to `target_index`.
///
/// The moved block is removed from its current position and reinserted at
/// `target_index`, clamped to `[0, len - 1]`. Returns `None` when `moved`
/// is not in the list. Moving a block onto its current index returns the
/// input order unchanged (callers treat that as a no-op).
pub fn reorder_ids(ids: &[Uuid], moved: Uuid, target_index: usize) -> Option<Vec<Uuid>> {
    let current = ids.iter().position(|id| *id == moved)?;
    let target = target_index.min(ids.len().saturating_sub(1));

    let mut order = ids.to_vec();
    if target != current {
        let id = order.remove(current);
        order.insert(target, id);
    }

    Some(order)
}

/// Compute the id order after removing `removed` from the list.
///
/// Returns `None` when `removed` is not in the list; callers treat that as
/// NotFound and mutate nothing, so deleting a block through the wrong
/// template leaves both templates untouched.
pub fn remove_id(ids: &[Uuid], removed: Uuid) -> Option<Vec<Uuid>> {
    let position = ids.iter().position(|id| *id == removed)?;

    let mut order = ids.to_vec();
    order.remove(position);

    Some(order)
}

/// The sort order for a block appended to a list with the given orders:
/// one past the current maximum, or 0 for an empty list.
pub fn next_append_order(orders: &[i32]) -> i32 {
    orders.iter().max().map_or(0, |max| max + 1)
}

/// Whether a set of sort orders is exactly the contiguous sequence
/// `0..N-1` (no gaps, no duplicates).
pub fn is_contiguous(orders: &[i32]) -> bool {
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(expected, actual)| *actual == expected as i32)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::now_v7()).collect()
    }

    #[test]
    fn move_first_block_to_end() {
        // Blocks at orders [0,1,2]; moving block@0 to index 2 yields
        // [block1, block2, block0].
        let list = ids(3);
        let order = reorder_ids(&list, list[0], 2).unwrap();
        assert_eq!(order, vec![list[1], list[2], list[0]]);
    }

    #[test]
    fn move_last_block_to_front() {
        let list = ids(4);
        let order = reorder_ids(&list, list[3], 0).unwrap();
        assert_eq!(order, vec![list[3], list[0], list[1], list[2]]);
    }

    #[test]
    fn move_to_middle() {
        let list = ids(4);
        let order = reorder_ids(&list, list[0], 2).unwrap();
        assert_eq!(order, vec![list[1], list[2], list[0], list[3]]);
    }

    #[test]
    fn target_index_is_clamped() {
        let list = ids(3);
        let order = reorder_ids(&list, list[0], 99).unwrap();
        assert_eq!(order, vec![list[1], list[2], list[0]]);
    }

    #[test]
    fn same_index_is_a_no_op() {
        let list = ids(3);
        let order = reorder_ids(&list, list[1], 1).unwrap();
        assert_eq!(order, list);
    }

    #[test]
    fn unknown_block_returns_none() {
        let list = ids(3);
        assert!(reorder_ids(&list, Uuid::now_v7(), 0).is_none());
    }

    #[test]
    fn single_block_list() {
        let list = ids(1);
        let order = reorder_ids(&list, list[0], 5).unwrap();
        assert_eq!(order, list);
    }

    #[test]
    fn contiguity_predicate() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[0]));
        assert!(is_contiguous(&[2, 0, 1]));
        assert!(!is_contiguous(&[0, 2, 3]));
        assert!(!is_contiguous(&[0, 1, 1]));
        assert!(!is_contiguous(&[1, 2, 3]));
    }

    #[test]
    fn removal_compacts_to_a_contiguous_sequence() {
        let list = ids(4);
        let remaining = remove_id(&list, list[1]).unwrap();
        assert_eq!(remaining, vec![list[0], list[2], list[3]]);

        // Renumbering the remaining blocks 0..N-1 closes the gap.
        let orders: Vec<i32> = (0..remaining.len() as i32).collect();
        assert!(is_contiguous(&orders));
    }

    #[test]
    fn removing_a_block_from_another_template_is_not_found() {
        // A block id that is not in this template's list must not change it.
        let list = ids(3);
        assert!(remove_id(&list, Uuid::now_v7()).is_none());
    }

    #[test]
    fn sequential_appends_land_at_zero_then_one() {
        assert_eq!(next_append_order(&[]), 0);
        assert_eq!(next_append_order(&[0]), 1);
        assert_eq!(next_append_order(&[0, 1]), 2);
    }

    #[test]
    fn append_order_follows_the_maximum_not_the_count() {
        assert_eq!(next_append_order(&[0, 2, 5]), 6);
    }

    #[test]
    fn any_sequence_of_reorders_stays_a_permutation() {
        let list = ids(5);
        let mut order = list.clone();
        for (moved, target) in [(0usize, 4usize), (2, 0), (4, 2), (1, 1), (3, 99)] {
            order = reorder_ids(&order, order[moved], target).unwrap();
            // renumbering 0..N-1 over the result is contiguous by construction
            let orders: Vec<i32> = (0..order.len() as i32).collect();
            assert!(is_contiguous(&orders));

            let mut sorted_input = list.clone();
            let mut sorted_output = order.clone();
            sorted_input.sort();
            sorted_output.sort();
            assert_eq!(sorted_input, sorted_output, "reorder must not lose blocks");
        }
    }
}
