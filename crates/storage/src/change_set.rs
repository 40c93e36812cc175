//! Positional change sets between two observed states of a result.
//!
//! Positions of deletions refer to the old result; positions of insertions
//! and modifications refer to the new one.

use hashbrown::{HashMap, HashSet};
use std::collections::BTreeSet;
use vista_core::RowId;

/// A `(row id, row version)` pair as observed in a result.
pub type ObservedRow = (RowId, u64);

/// Changes between two states of a query result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    insertions: BTreeSet<usize>,
    deletions: BTreeSet<usize>,
    modifications: BTreeSet<usize>,
}

impl ChangeSet {
    /// Creates an empty change set, as delivered on initial subscription.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the changes turning `old` into `new`.
    ///
    /// Rows present in both states keep their place when they lie on a
    /// longest increasing run of old positions. Any other kept row is
    /// reported as moved: a deletion at its old position and an insertion
    /// at its new one.
    pub fn compute(old: &[ObservedRow], new: &[ObservedRow]) -> Self {
        let mut changes = Self::new();

        let old_positions: HashMap<RowId, usize> = old
            .iter()
            .enumerate()
            .map(|(pos, (id, _))| (*id, pos))
            .collect();
        let new_ids: HashSet<RowId> = new.iter().map(|(id, _)| *id).collect();

        for (pos, (id, _)) in old.iter().enumerate() {
            if !new_ids.contains(id) {
                changes.deletions.insert(pos);
            }
        }

        // (new position, old position) for rows present in both states.
        let mut kept = Vec::new();
        for (pos, (id, _)) in new.iter().enumerate() {
            match old_positions.get(id) {
                Some(&old_pos) => kept.push((pos, old_pos)),
                None => {
                    changes.insertions.insert(pos);
                }
            }
        }

        let old_order: Vec<usize> = kept.iter().map(|(_, old_pos)| *old_pos).collect();
        let stays = longest_increasing(&old_order);

        for ((new_pos, old_pos), stay) in kept.into_iter().zip(stays) {
            if !stay {
                changes.deletions.insert(old_pos);
                changes.insertions.insert(new_pos);
            } else if old[old_pos].1 != new[new_pos].1 {
                changes.modifications.insert(new_pos);
            }
        }

        changes
    }

    /// Returns true if there are no changes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.deletions.is_empty() && self.modifications.is_empty()
    }

    /// Returns the total number of changed positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.insertions.len() + self.deletions.len() + self.modifications.len()
    }

    /// Positions in the new result that were inserted.
    pub fn insertions(&self) -> &BTreeSet<usize> {
        &self.insertions
    }

    /// Positions in the old result that were deleted.
    pub fn deletions(&self) -> &BTreeSet<usize> {
        &self.deletions
    }

    /// Positions in the new result whose row changed in place.
    pub fn modifications(&self) -> &BTreeSet<usize> {
        &self.modifications
    }
}

/// Marks the members of one longest strictly increasing subsequence.
fn longest_increasing(seq: &[usize]) -> Vec<bool> {
    // tails[k] = index into seq of the smallest tail of a run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let k = tails.partition_point(|&t| seq[t] < value);
        if k > 0 {
            prev[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }

    let mut members = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        members[i] = true;
        cursor = prev[i];
    }
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(positions: &[usize]) -> BTreeSet<usize> {
        positions.iter().copied().collect()
    }

    #[test]
    fn test_identical_states_are_empty() {
        let rows = vec![(1, 1), (2, 1), (3, 1)];
        assert!(ChangeSet::compute(&rows, &rows).is_empty());
        assert!(ChangeSet::new().is_empty());
    }

    #[test]
    fn test_insert_and_delete() {
        let old = vec![(1, 1), (2, 1), (3, 1)];
        let new = vec![(1, 1), (3, 1), (4, 1)];
        let changes = ChangeSet::compute(&old, &new);
        assert_eq!(changes.deletions(), &set(&[1]));
        assert_eq!(changes.insertions(), &set(&[2]));
        assert!(changes.modifications().is_empty());
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_modification_reported_at_new_position() {
        let old = vec![(1, 1), (2, 1), (3, 1)];
        let new = vec![(2, 1), (3, 2)];
        let changes = ChangeSet::compute(&old, &new);
        assert_eq!(changes.deletions(), &set(&[0]));
        assert_eq!(changes.modifications(), &set(&[1]));
        assert!(changes.insertions().is_empty());
    }

    #[test]
    fn test_move_is_delete_plus_insert() {
        let old = vec![(1, 1), (2, 1), (3, 1)];
        let new = vec![(3, 1), (1, 1), (2, 1)];
        let changes = ChangeSet::compute(&old, &new);
        assert_eq!(changes.deletions(), &set(&[2]));
        assert_eq!(changes.insertions(), &set(&[0]));
    }

    #[test]
    fn test_longest_increasing() {
        assert_eq!(
            longest_increasing(&[0, 8, 4, 12, 2, 10]),
            vec![true, false, false, false, true, true]
        );
        assert!(longest_increasing(&[]).is_empty());
    }
}
