use crate::bulk::{Item, Key};

/// Whether `item` carries every attribute of `key` with an equal value
pub fn matches_key(item: &Item, key: &Key) -> bool {
    !key.is_empty() && key.iter().all(|(name, value)| item.get(name) == Some(value))
}

/// Visits the values representing the difference, i.e., the items matched by none of the keys.
pub fn left_diff(items: &[Item], keys: &[Key]) -> Vec<Item> {
    items
        .iter()
        .filter(|item| !keys.iter().any(|key| matches_key(item, key)))
        .cloned()
        .collect()
}

/// Visits the values representing the difference, i.e., the keys matching none of the items.
pub fn right_diff(items: &[Item], keys: &[Key]) -> Vec<Key> {
    keys.iter()
        .filter(|key| !items.iter().any(|item| matches_key(item, key)))
        .cloned()
        .collect()
}
