use crate::merge;
use crate::model::{DatItem, ItemField, Machine, MachineArena, MachineId};
use crate::stats::{ItemStatistics, StatsSnapshot};
use ahash::AHashMap;
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::debug;

/// Header carried by every index and cloned (with a descriptive suffix) onto
/// split/diff outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatHeader {
    pub name: String,
    pub description: String,
    pub file_name: String,
    pub version: Option<String>,
    pub date: Option<String>,
}

impl DatHeader {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            file_name: name.clone(),
            name,
            ..DatHeader::default()
        }
    }

    /// Copy of this header with ` (suffix)` appended to name and description.
    pub fn suffixed(&self, suffix: &str) -> Self {
        let mut h = self.clone();
        h.name = format!("{} ({suffix})", h.name);
        h.description = format!("{} ({suffix})", h.description);
        h
    }

    /// Prefix name, description, and file name in place. Downstream consumers
    /// recognize remediation lists by the `fixDAT_` prefix.
    pub fn prefix(&mut self, prefix: &str) {
        self.name = format!("{prefix}{}", self.name);
        self.description = format!("{prefix}{}", self.description);
        self.file_name = format!("{prefix}{}", self.file_name);
    }
}

/// Bucketed, mutable collection of catalog items.
///
/// Buckets live in a `DashMap`, so "owner writes own key" parallel access is
/// safe and a single key's read-modify-write appears atomic to concurrent
/// readers of that key. The current bucketing field is explicit state, never
/// inferred from the contents.
pub struct ItemIndex {
    header: DatHeader,
    buckets: DashMap<String, Vec<DatItem>>,
    arena: MachineArena,
    bucketed_by: Option<ItemField>,
    deduped: bool,
    stats: ItemStatistics,
}

impl ItemIndex {
    pub fn new(header: DatHeader) -> Self {
        Self {
            header,
            buckets: DashMap::new(),
            arena: MachineArena::new(),
            bucketed_by: None,
            deduped: false,
            stats: ItemStatistics::new(),
        }
    }

    /// Empty index sharing this one's header (optionally suffixed), machine
    /// arena, and bucketing state. Machine handles from this index stay valid
    /// in the clone.
    pub fn clone_structure(&self, suffix: Option<&str>) -> Self {
        Self {
            header: match suffix {
                Some(s) => self.header.suffixed(s),
                None => self.header.clone(),
            },
            buckets: DashMap::new(),
            arena: self.arena.clone(),
            bucketed_by: self.bucketed_by,
            deduped: false,
            stats: ItemStatistics::new(),
        }
    }

    pub fn header(&self) -> &DatHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut DatHeader {
        &mut self.header
    }

    pub fn arena(&self) -> &MachineArena {
        &self.arena
    }

    pub fn intern_machine(&mut self, machine: Machine) -> MachineId {
        self.arena.intern(machine)
    }

    pub fn machine(&self, id: MachineId) -> &Machine {
        self.arena.get(id)
    }

    pub fn rename_machine(&mut self, id: MachineId, new_name: impl Into<String>) -> MachineId {
        self.arena.rename(id, new_name)
    }

    pub fn update_machine(&mut self, id: MachineId, machine: Machine) {
        self.arena.update(id, machine);
    }

    pub fn bucketed_by(&self) -> Option<ItemField> {
        self.bucketed_by
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn total_count(&self) -> u64 {
        self.stats.total_count()
    }

    pub fn removed_count(&self) -> u64 {
        self.stats.removed_count()
    }

    /// Bucket key of `item` under `field`. Items bucketed by a hash they do
    /// not carry all land under the empty key.
    pub fn key_of(item: &DatItem, field: ItemField, arena: &MachineArena) -> String {
        match field {
            ItemField::Machine => arena.get(item.machine).name.clone(),
            hash_field => item
                .hash(hash_field)
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or_default(),
        }
    }

    /// Bucket key of `item` under this index's current field. `item`'s
    /// machine handle is resolved against `item_arena` (the arena of the
    /// index it came from).
    pub fn key_for(&self, item: &DatItem, item_arena: &MachineArena) -> String {
        Self::key_of(item, self.bucketed_by.unwrap_or(ItemField::Machine), item_arena)
    }

    pub fn add(&self, key: &str, item: DatItem) {
        self.stats.add_item(&item);
        self.buckets.entry(key.to_string()).or_default().push(item);
    }

    pub fn add_range(&self, key: &str, items: Vec<DatItem>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            self.stats.add_item(item);
        }
        self.buckets.entry(key.to_string()).or_default().extend(items);
    }

    /// Add under the key derived from the current bucketing field.
    pub fn push(&self, item: DatItem) {
        let key = self.key_for(&item, &self.arena);
        self.add(&key, item);
    }

    pub fn remove_bucket(&self, key: &str) -> Option<Vec<DatItem>> {
        let (_, items) = self.buckets.remove(key)?;
        for item in &items {
            self.stats.remove_item(item);
        }
        Some(items)
    }

    /// Snapshot of one bucket's items in arrival order.
    pub fn bucket(&self, key: &str) -> Option<Vec<DatItem>> {
        self.buckets.get(key).map(|b| b.value().clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.buckets.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot of every item. Order across buckets is unspecified.
    pub fn items(&self) -> Vec<DatItem> {
        self.buckets
            .iter()
            .flat_map(|e| e.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|e| e.value().is_empty())
    }

    /// Rekey every item by `field`, optionally collapsing each bucket with
    /// the merge engine. A no-op when the index is already bucketed by the
    /// same field and at least as deduplicated as requested.
    pub fn bucket_by(&mut self, field: ItemField, dedupe: bool) {
        if self.bucketed_by == Some(field) && (!dedupe || self.deduped) {
            return;
        }

        if self.bucketed_by != Some(field) {
            let old = std::mem::take(&mut self.buckets);
            let old: Vec<(String, Vec<DatItem>)> = old.into_iter().collect();
            let new: DashMap<String, Vec<DatItem>> = DashMap::new();
            let arena = &self.arena;

            old.into_par_iter().for_each(|(_, items)| {
                let mut local: AHashMap<String, Vec<DatItem>> = AHashMap::new();
                for item in items {
                    local
                        .entry(Self::key_of(&item, field, arena))
                        .or_default()
                        .push(item);
                }
                for (key, group) in local {
                    new.entry(key).or_default().extend(group);
                }
            });

            self.buckets = new;
            self.bucketed_by = Some(field);
            self.deduped = false;
            debug!(
                buckets = self.buckets.len(),
                "rebucketed index '{}'", self.header.name
            );
        }

        if dedupe && !self.deduped {
            let keys = self.keys();
            keys.par_iter().for_each(|key| {
                if let Some(mut entry) = self.buckets.get_mut(key) {
                    let items = std::mem::take(entry.value_mut());
                    *entry.value_mut() = merge::dedupe_bucket(items);
                }
            });
            self.deduped = true;
            self.recalculate_stats();
        }
    }

    /// All hash-aware duplicates of `candidate` in its bucket, in arrival
    /// order, or sorted by (source index, name) when `sorted` is set.
    pub fn get_duplicates(
        &self,
        candidate: &DatItem,
        candidate_arena: &MachineArena,
        sorted: bool,
    ) -> Vec<DatItem> {
        let key = self.key_for(candidate, candidate_arena);
        let mut dupes: Vec<DatItem> = match self.buckets.get(&key) {
            Some(bucket) => bucket
                .iter()
                .filter(|other| candidate.hash_match(other))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        if sorted {
            dupes.sort_by(|a, b| {
                a.source
                    .index
                    .cmp(&b.source.index)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        dupes
    }

    pub fn has_duplicates(&self, candidate: &DatItem, candidate_arena: &MachineArena) -> bool {
        let key = self.key_for(candidate, candidate_arena);
        match self.buckets.get(&key) {
            Some(bucket) => bucket.iter().any(|other| candidate.hash_match(other)),
            None => false,
        }
    }

    /// Flag every item in `key`'s bucket that satisfies `pred` for removal.
    /// Returns how many were newly flagged.
    pub fn mark_removed_where<F>(&self, key: &str, pred: F) -> usize
    where
        F: Fn(&DatItem) -> bool,
    {
        let mut marked = 0;
        if let Some(mut bucket) = self.buckets.get_mut(key) {
            for item in bucket.value_mut().iter_mut() {
                if !item.remove && pred(item) {
                    item.remove = true;
                    marked += 1;
                }
            }
        }
        if marked > 0 {
            self.stats.mark_removed(marked as u64);
        }
        marked
    }

    /// Flag matching items across all buckets for removal.
    pub fn mark_removed_all<F>(&self, pred: F) -> usize
    where
        F: Fn(&DatItem) -> bool + Sync,
    {
        let keys = self.keys();
        keys.par_iter().map(|key| self.mark_removed_where(key, &pred)).sum()
    }

    /// Reset every duplicate-provenance tag.
    pub fn clear_dupe_tags(&self) {
        let keys = self.keys();
        keys.par_iter().for_each(|key| {
            if let Some(mut bucket) = self.buckets.get_mut(key) {
                for item in bucket.value_mut().iter_mut() {
                    item.dupe_type = crate::model::DupeType::None;
                }
            }
        });
    }

    /// Physically delete every item flagged for removal, adjusting counters.
    /// Returns how many were purged.
    pub fn clear_marked(&self) -> usize {
        let keys = self.keys();
        keys.par_iter()
            .map(|key| {
                let mut purged = 0;
                if let Some(mut bucket) = self.buckets.get_mut(key) {
                    bucket.value_mut().retain(|item| {
                        if item.remove {
                            self.stats.remove_item(item);
                            purged += 1;
                            false
                        } else {
                            true
                        }
                    });
                }
                purged
            })
            .sum()
    }

    /// Recompute every counter from the live contents. Per-bucket partials
    /// are combined through the aggregator's snapshot merge.
    pub fn recalculate_stats(&self) {
        self.stats.reset();
        let keys = self.keys();
        keys.par_iter().for_each(|key| {
            let local = ItemStatistics::new();
            if let Some(bucket) = self.buckets.get(key) {
                for item in bucket.iter() {
                    local.add_item(item);
                }
            }
            self.stats.add_statistics(&local);
        });
    }

    /// Move every item of `other` into this index, re-interning machines and
    /// rekeying by this index's current field.
    pub fn absorb(&mut self, other: ItemIndex) {
        let (_, buckets, other_arena) = other.into_parts();
        let mut id_map: AHashMap<MachineId, MachineId> = AHashMap::new();

        for (_, items) in buckets {
            for mut item in items {
                let mapped = match id_map.get(&item.machine) {
                    Some(&id) => id,
                    None => {
                        let id = self.arena.intern(other_arena.get(item.machine).clone());
                        id_map.insert(item.machine, id);
                        id
                    }
                };
                item.machine = mapped;
                let key = self.key_for(&item, &self.arena);
                self.add(&key, item);
            }
        }
        self.deduped = false;
    }

    pub fn into_parts(self) -> (DatHeader, Vec<(String, Vec<DatItem>)>, MachineArena) {
        (
            self.header,
            self.buckets.into_iter().collect(),
            self.arena,
        )
    }
}

impl std::fmt::Debug for ItemIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemIndex")
            .field("header", &self.header)
            .field("buckets", &self.buckets.len())
            .field("items", &self.len())
            .field("bucketed_by", &self.bucketed_by)
            .field("deduped", &self.deduped)
            .finish()
    }
}
