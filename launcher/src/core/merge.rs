//! Shallow two-tier merge of user config over system config.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Flat string-keyed configuration mapping.
///
/// `BTreeMap` keeps key order deterministic, so serializing a merge
/// result twice yields byte-identical output.
pub type ConfigMap = BTreeMap<String, Value>;

/// Overlay `user` on top of `system`.
///
/// User keys win; keys unique to the system config survive untouched;
/// keys unique to the user config are added. The merge is shallow by
/// design: a nested value under a user key replaces the system value
/// wholesale, there is no deep merge of nested structures.
pub fn merge(system: &ConfigMap, user: &ConfigMap) -> ConfigMap {
    let mut merged = system.clone();
    for (key, value) in user {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
