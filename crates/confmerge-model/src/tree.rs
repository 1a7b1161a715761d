use std::collections::BTreeMap;

use crate::section::Package;

/// The unit the engine loads, merges, and writes: every package keyed by
/// name. A `BTreeMap` gives deterministic iteration order for snapshot
/// comparison and test assertions; it does not imply anything about
/// on-disk package ordering, which the config store owns.
pub type ConfigTree = BTreeMap<String, Package>;
