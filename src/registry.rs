//! Owner-scoped concurrent registry of mount relationships.
//!
//! The registry is the single source of truth for which passengers are
//! mounted on which target entity, keyed first by the owner that contributed
//! them. Every mutation prunes the containers it empties in the same call, so
//! iteration only ever visits live owners and targets.
//!
//! All per-owner compound operations run under the owner's shard write guard
//! of the underlying [`DashMap`]; owner entries are dropped with
//! [`DashMap::remove_if`] so a concurrent add on the same owner is never lost.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use dashmap::DashMap;

/// Protocol-level entity identifier (targets and passengers alike).
pub type EntityId = i32;

/// Set of passenger ids mounted on one target.
pub type PassengerSet = HashSet<EntityId>;

/// Serialisable, ordered view of the whole registry for diagnostics.
pub type RegistryDump = BTreeMap<String, BTreeMap<EntityId, Vec<EntityId>>>;

/// Concurrent map of `owner -> (target -> passengers)`.
#[derive(Debug, Default)]
pub struct PassengerRegistry {
    owners: DashMap<String, HashMap<EntityId, PassengerSet>>,
}

impl PassengerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Owner-scoped mutation
    // -----------------------------------------------------------------------

    /// Union `passengers` into the set at `(owner, target)`.
    ///
    /// Returns `true` if at least one id was not present before.
    pub fn add(&self, owner: &str, target: EntityId, passengers: &PassengerSet) -> bool {
        if passengers.is_empty() {
            return false;
        }
        if let Some(mut targets) = self.owners.get_mut(owner) {
            return union_into(&mut targets, target, passengers);
        }
        let mut targets = self.owners.entry(owner.to_owned()).or_default();
        union_into(&mut targets, target, passengers)
    }

    /// Subtract `passengers` from the set at `(owner, target)`.
    ///
    /// Returns `true` if anything was removed. Missing owner or target is a
    /// no-op.
    pub fn remove(&self, owner: &str, target: EntityId, passengers: &PassengerSet) -> bool {
        let changed = {
            let Some(mut targets) = self.owners.get_mut(owner) else {
                return false;
            };
            let Some(set) = targets.get_mut(&target) else {
                return false;
            };
            let before = set.len();
            set.retain(|id| !passengers.contains(id));
            let changed = set.len() != before;
            if set.is_empty() {
                targets.remove(&target);
            }
            changed
        };
        self.prune_owner(owner);
        changed
    }

    /// Drop the whole passenger set at `(owner, target)` and return it.
    pub fn remove_all_for_target(&self, owner: &str, target: EntityId) -> PassengerSet {
        let removed = {
            let Some(mut targets) = self.owners.get_mut(owner) else {
                return PassengerSet::new();
            };
            targets.remove(&target).unwrap_or_default()
        };
        self.prune_owner(owner);
        removed
    }

    /// Subtract `passengers` from every target of `owner`.
    ///
    /// Returns the targets whose sets actually changed.
    pub fn remove_from_owner_targets(
        &self,
        owner: &str,
        passengers: &PassengerSet,
    ) -> BTreeSet<EntityId> {
        let touched = {
            let Some(mut targets) = self.owners.get_mut(owner) else {
                return BTreeSet::new();
            };
            strip_passengers(&mut targets, passengers)
        };
        self.prune_owner(owner);
        touched
    }

    // -----------------------------------------------------------------------
    // Cross-owner mutation
    // -----------------------------------------------------------------------

    /// Subtract `passengers` from every owner's set at `target`.
    pub fn remove_across_owners(&self, target: EntityId, passengers: &PassengerSet) -> bool {
        let mut changed = false;
        self.owners.retain(|_, targets| {
            if let Some(set) = targets.get_mut(&target) {
                let before = set.len();
                set.retain(|id| !passengers.contains(id));
                changed |= set.len() != before;
                if set.is_empty() {
                    targets.remove(&target);
                }
            }
            !targets.is_empty()
        });
        changed
    }

    /// Drop `target` from every owner and return the union of what was removed.
    pub fn remove_all_across_owners(&self, target: EntityId) -> PassengerSet {
        let mut removed = PassengerSet::new();
        self.owners.retain(|_, targets| {
            if let Some(set) = targets.remove(&target) {
                removed.extend(set);
            }
            !targets.is_empty()
        });
        removed
    }

    /// Subtract `passengers` from every target of every owner.
    ///
    /// Returns the targets whose sets changed under at least one owner.
    pub fn remove_everywhere(&self, passengers: &PassengerSet) -> BTreeSet<EntityId> {
        let mut touched = BTreeSet::new();
        self.owners.retain(|_, targets| {
            touched.extend(strip_passengers(targets, passengers));
            !targets.is_empty()
        });
        touched
    }

    /// Remove every relationship. Intended for hosts that unload.
    pub fn clear(&self) {
        self.owners.clear();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Copy of the passenger set at `(owner, target)`, empty if absent.
    pub fn snapshot(&self, owner: &str, target: EntityId) -> PassengerSet {
        self.owners
            .get(owner)
            .and_then(|targets| targets.get(&target).cloned())
            .unwrap_or_default()
    }

    /// Union across all owners of their passenger sets at `target`.
    pub fn global_snapshot(&self, target: EntityId) -> PassengerSet {
        let mut all = PassengerSet::new();
        for targets in self.owners.iter() {
            if let Some(set) = targets.get(&target) {
                all.extend(set.iter().copied());
            }
        }
        all
    }

    /// Sum of set sizes across all owners and targets.
    pub fn total_passenger_count(&self) -> usize {
        self.owners
            .iter()
            .map(|targets| targets.values().map(HashSet::len).sum::<usize>())
            .sum()
    }

    /// Sum of target-map sizes across all owners.
    pub fn total_target_count(&self) -> usize {
        self.owners.iter().map(|targets| targets.len()).sum()
    }

    /// Number of targets `owner` currently holds entries for.
    pub fn owner_target_count(&self, owner: &str) -> usize {
        self.owners.get(owner).map_or(0, |targets| targets.len())
    }

    /// Targets `owner` currently holds entries for.
    pub fn targets_of(&self, owner: &str) -> BTreeSet<EntityId> {
        self.owners
            .get(owner)
            .map(|targets| targets.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every target with at least one passenger under any owner.
    pub fn all_targets(&self) -> BTreeSet<EntityId> {
        let mut all = BTreeSet::new();
        for targets in self.owners.iter() {
            all.extend(targets.keys().copied());
        }
        all
    }

    /// Owners with live entries, sorted.
    pub fn owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = self.owners.iter().map(|e| e.key().clone()).collect();
        owners.sort();
        owners
    }

    /// Whether no owner holds any entry.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Ordered copy of the full registry, suitable for serialising.
    pub fn dump(&self) -> RegistryDump {
        self.owners
            .iter()
            .map(|entry| {
                let targets: BTreeMap<EntityId, Vec<EntityId>> = entry
                    .value()
                    .iter()
                    .map(|(target, set)| {
                        let mut ids: Vec<EntityId> = set.iter().copied().collect();
                        ids.sort_unstable();
                        (*target, ids)
                    })
                    .collect();
                (entry.key().clone(), targets)
            })
            .collect()
    }

    fn prune_owner(&self, owner: &str) {
        self.owners.remove_if(owner, |_, targets| targets.is_empty());
    }
}

/// Union `passengers` into `targets[target]`; `true` if anything was new.
fn union_into(
    targets: &mut HashMap<EntityId, PassengerSet>,
    target: EntityId,
    passengers: &PassengerSet,
) -> bool {
    let set = targets.entry(target).or_default();
    let before = set.len();
    set.extend(passengers.iter().copied());
    set.len() > before
}

/// Subtract `passengers` from every set in `targets`, dropping emptied sets.
fn strip_passengers(
    targets: &mut HashMap<EntityId, PassengerSet>,
    passengers: &PassengerSet,
) -> BTreeSet<EntityId> {
    let mut touched = BTreeSet::new();
    targets.retain(|target, set| {
        let before = set.len();
        set.retain(|id| !passengers.contains(id));
        if set.len() != before {
            touched.insert(*target);
        }
        !set.is_empty()
    });
    touched
}
