use crate::model::{DatItem, DupeType};

/// Collapse one bucket to its canonical items, tagging provenance.
///
/// Items are walked in arrival order and compared against the accepted output
/// with hash-aware equality. The earliest arrival always wins as canonical;
/// later matches are dropped and the kept instance is tagged `External` when
/// the match crosses `Source.index` passes, `Internal` when it stays within
/// one. An item carrying no hash and no size is never merged with anything,
/// which keeps placeholder entries from collapsing into each other.
///
/// Produces a fresh vector rather than mutating in place, so callers can run
/// one bucket per worker with no per-item locking.
pub fn dedupe_bucket(items: Vec<DatItem>) -> Vec<DatItem> {
    let mut kept: Vec<DatItem> = Vec::with_capacity(items.len());

    for item in items {
        let matched = kept.iter().position(|k| k.hash_match(&item));
        match matched {
            Some(pos) => {
                let tag = if kept[pos].source.index == item.source.index {
                    DupeType::Internal
                } else {
                    DupeType::External
                };
                kept[pos].dupe_type = kept[pos].dupe_type.max(tag);
            }
            None => kept.push(item),
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKind, MachineId, RomData, Source};

    fn rom(name: &str, crc: &str, pass: usize) -> DatItem {
        DatItem::new(
            name,
            ItemKind::Rom(RomData {
                size: Some(100),
                crc: Some(crc.to_string()),
                ..RomData::default()
            }),
            Source::new(pass, format!("{pass}.dat")),
            MachineId(0),
        )
    }

    fn empty(name: &str, pass: usize) -> DatItem {
        DatItem::new(
            name,
            ItemKind::Rom(RomData::default()),
            Source::new(pass, format!("{pass}.dat")),
            MachineId(0),
        )
    }

    #[test]
    fn earliest_arrival_is_canonical() {
        let out = dedupe_bucket(vec![rom("first.bin", "aa", 0), rom("second.bin", "aa", 0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "first.bin");
        assert_eq!(out[0].dupe_type, DupeType::Internal);
    }

    #[test]
    fn cross_pass_match_tags_external() {
        let out = dedupe_bucket(vec![rom("a.bin", "aa", 0), rom("b.bin", "aa", 1)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dupe_type, DupeType::External);
    }

    #[test]
    fn external_outranks_internal() {
        let out = dedupe_bucket(vec![
            rom("a.bin", "aa", 0),
            rom("b.bin", "aa", 1),
            rom("c.bin", "aa", 0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dupe_type, DupeType::External);
    }

    #[test]
    fn unique_items_stay_untagged() {
        let out = dedupe_bucket(vec![rom("a.bin", "aa", 0), rom("b.bin", "bb", 0)]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| i.dupe_type == DupeType::None));
    }

    #[test]
    fn evidence_free_items_are_never_merged() {
        let out = dedupe_bucket(vec![empty("a", 0), empty("b", 0), empty("c", 1)]);
        assert_eq!(out.len(), 3);
    }
}
