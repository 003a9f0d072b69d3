//! Three-way set reconciliation by natural key

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Operations that bring an existing set in line with an incoming set
#[derive(Debug)]
pub struct SetDiff<'a, E, I> {
    /// Incoming items with no existing counterpart
    pub to_create: Vec<&'a I>,
    /// Matched pairs, in incoming order
    pub to_update: Vec<(&'a E, &'a I)>,
    /// Existing items absent from the incoming set
    pub to_delete: Vec<&'a E>,
}

impl<E, I> SetDiff<'_, E, I> {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Diff `existing` against `incoming` by key
///
/// Only the first incoming item with a given key is used. If several existing
/// items share a key, the first is matched and the rest are deleted.
pub fn diff_by_key<'a, E, I, K, FE, FI>(
    existing: &'a [E],
    incoming: &'a [I],
    existing_key: FE,
    incoming_key: FI,
) -> SetDiff<'a, E, I>
where
    K: Eq + Hash,
    FE: Fn(&'a E) -> K,
    FI: Fn(&'a I) -> K,
{
    let mut by_key: HashMap<K, usize> = HashMap::with_capacity(existing.len());
    for (index, item) in existing.iter().enumerate() {
        by_key.entry(existing_key(item)).or_insert(index);
    }

    let mut matched = vec![false; existing.len()];
    let mut seen_incoming: HashSet<K> = HashSet::with_capacity(incoming.len());
    let mut to_create = Vec::new();
    let mut to_update = Vec::new();

    for item in incoming {
        let key = incoming_key(item);
        match by_key.get(&key) {
            Some(&index) if !matched[index] => {
                matched[index] = true;
                to_update.push((&existing[index], item));
            }
            Some(_) => {} // duplicate incoming key
            None if seen_incoming.contains(&key) => {}
            None => to_create.push(item),
        }
        seen_incoming.insert(key);
    }

    let to_delete = existing
        .iter()
        .zip(matched)
        .filter_map(|(item, was_matched)| (!was_matched).then_some(item))
        .collect();

    SetDiff {
        to_create,
        to_update,
        to_delete,
    }
}
