use crate::model::{DatItem, ItemField, ItemKind, ItemStatus};
use std::sync::Mutex;

/// Point-in-time copy of every counter the aggregator maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub total_count: u64,
    pub removed_count: u64,
    pub total_size: u64,

    pub rom_count: u64,
    pub disk_count: u64,
    pub media_count: u64,
    pub sample_count: u64,

    pub crc_count: u64,
    pub md5_count: u64,
    pub sha1_count: u64,
    pub sha256_count: u64,
    pub sha384_count: u64,
    pub sha512_count: u64,
    pub spamsum_count: u64,

    pub good_count: u64,
    pub baddump_count: u64,
    pub nodump_count: u64,
    pub verified_count: u64,
}

/// Thread-safe running counts over a collection of items.
///
/// Every add/remove touches all counters relevant to one item inside a single
/// lock scope, so readers never observe a partially-counted item. Decrements
/// saturate at zero.
#[derive(Debug, Default)]
pub struct ItemStatistics {
    inner: Mutex<StatsSnapshot>,
}

impl ItemStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, item: &DatItem) {
        let mut s = self.inner.lock().expect("stats mutex poisoned");
        apply(&mut s, item, true);
    }

    pub fn remove_item(&self, item: &DatItem) {
        let mut s = self.inner.lock().expect("stats mutex poisoned");
        apply(&mut s, item, false);
    }

    /// Record that `count` already-counted items were flagged for removal.
    pub fn mark_removed(&self, count: u64) {
        let mut s = self.inner.lock().expect("stats mutex poisoned");
        s.removed_count += count;
    }

    /// Field-by-field merge of another aggregator's counters, used to combine
    /// parallel-partition results.
    pub fn add_statistics(&self, other: &ItemStatistics) {
        let o = other.snapshot();
        let mut s = self.inner.lock().expect("stats mutex poisoned");
        s.total_count += o.total_count;
        s.removed_count += o.removed_count;
        s.total_size += o.total_size;
        s.rom_count += o.rom_count;
        s.disk_count += o.disk_count;
        s.media_count += o.media_count;
        s.sample_count += o.sample_count;
        s.crc_count += o.crc_count;
        s.md5_count += o.md5_count;
        s.sha1_count += o.sha1_count;
        s.sha256_count += o.sha256_count;
        s.sha384_count += o.sha384_count;
        s.sha512_count += o.sha512_count;
        s.spamsum_count += o.spamsum_count;
        s.good_count += o.good_count;
        s.baddump_count += o.baddump_count;
        s.nodump_count += o.nodump_count;
        s.verified_count += o.verified_count;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock().expect("stats mutex poisoned")
    }

    pub fn reset(&self) {
        let mut s = self.inner.lock().expect("stats mutex poisoned");
        *s = StatsSnapshot::default();
    }

    pub fn total_count(&self) -> u64 {
        self.snapshot().total_count
    }

    pub fn removed_count(&self) -> u64 {
        self.snapshot().removed_count
    }
}

fn apply(s: &mut StatsSnapshot, item: &DatItem, add: bool) {
    let bump = |counter: &mut u64, amount: u64| {
        if add {
            *counter += amount;
        } else {
            *counter = counter.saturating_sub(amount);
        }
    };

    bump(&mut s.total_count, 1);
    if item.remove {
        bump(&mut s.removed_count, 1);
    }
    if let Some(size) = item.size() {
        bump(&mut s.total_size, size);
    }

    match &item.kind {
        ItemKind::Rom(_) => bump(&mut s.rom_count, 1),
        ItemKind::Disk(_) => bump(&mut s.disk_count, 1),
        ItemKind::Media(_) => bump(&mut s.media_count, 1),
        ItemKind::Sample => bump(&mut s.sample_count, 1),
        ItemKind::Release => {}
    }

    if item.hash(ItemField::Crc).is_some() {
        bump(&mut s.crc_count, 1);
    }
    if item.hash(ItemField::Md5).is_some() {
        bump(&mut s.md5_count, 1);
    }
    if item.hash(ItemField::Sha1).is_some() {
        bump(&mut s.sha1_count, 1);
    }
    if item.hash(ItemField::Sha256).is_some() {
        bump(&mut s.sha256_count, 1);
    }
    if item.hash(ItemField::Sha384).is_some() {
        bump(&mut s.sha384_count, 1);
    }
    if item.hash(ItemField::Sha512).is_some() {
        bump(&mut s.sha512_count, 1);
    }
    if item.hash(ItemField::SpamSum).is_some() {
        bump(&mut s.spamsum_count, 1);
    }

    match item.status {
        ItemStatus::Good => bump(&mut s.good_count, 1),
        ItemStatus::BadDump => bump(&mut s.baddump_count, 1),
        ItemStatus::Nodump => bump(&mut s.nodump_count, 1),
        ItemStatus::Verified => bump(&mut s.verified_count, 1),
        ItemStatus::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MachineId, RomData, Source};

    fn item() -> DatItem {
        let mut it = DatItem::new(
            "x.bin",
            ItemKind::Rom(RomData {
                size: Some(512),
                crc: Some("deadbeef".into()),
                sha1: Some("a".repeat(40)),
                ..RomData::default()
            }),
            Source::new(0, "a.dat"),
            MachineId(0),
        );
        it.status = ItemStatus::Good;
        it
    }

    #[test]
    fn add_then_remove_round_trips() {
        let stats = ItemStatistics::new();
        let before = stats.snapshot();
        let it = item();
        stats.add_item(&it);
        stats.remove_item(&it);
        assert_eq!(stats.snapshot(), before);
    }

    #[test]
    fn decrement_clamps_at_zero() {
        let stats = ItemStatistics::new();
        let it = item();
        stats.remove_item(&it);
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn merge_adds_field_by_field() {
        let a = ItemStatistics::new();
        let b = ItemStatistics::new();
        let it = item();
        a.add_item(&it);
        b.add_item(&it);
        b.add_item(&it);
        a.add_statistics(&b);
        let s = a.snapshot();
        assert_eq!(s.total_count, 3);
        assert_eq!(s.rom_count, 3);
        assert_eq!(s.total_size, 3 * 512);
        assert_eq!(s.good_count, 3);
    }
}
