//! Set algebra over pairs (or fan-outs) of indexes.
//!
//! Every operation here expects its inputs to already be bucketed on a
//! comparable key: a hash field for content-level diffs, the machine name for
//! set-level diffs. Operations never mutate their inputs; they produce new
//! indexes carrying clones. A missing or empty side always yields an empty
//! result, never an error.

use crate::index::ItemIndex;
use crate::model::{DatItem, DupeType, ItemField, ItemKind};
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

/// Item-level fields [`replace`] can copy from a base duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemReplaceField {
    Name,
    Status,
    Size,
    Hash(ItemField),
}

/// Machine-level fields [`replace`] can copy from a base duplicate's machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineReplaceField {
    Name,
    Description,
    Manufacturer,
    Category,
    Year,
}

/// Field selection for [`replace`].
#[derive(Debug, Clone, Default)]
pub struct ReplaceOptions {
    pub item_fields: Vec<ItemReplaceField>,
    pub machine_fields: Vec<MachineReplaceField>,
    /// Only copy machine-level fields when the machine names already match.
    pub only_same_machine: bool,
}

/// For each `other` item, find its first base duplicate and copy the selected
/// fields onto a clone. Items with no base duplicate pass through unchanged.
/// `base` is never mutated.
pub fn replace(base: &ItemIndex, other: &ItemIndex, opts: &ReplaceOptions) -> ItemIndex {
    let mut out = other.clone_structure(None);
    if base.is_empty() || other.is_empty() {
        return out;
    }

    for key in other.keys() {
        let Some(bucket) = other.bucket(&key) else {
            continue;
        };
        for item in bucket {
            let dupes = base.get_duplicates(&item, other.arena(), false);
            let Some(first) = dupes.first() else {
                out.add(&key, item);
                continue;
            };

            let mut clone = item.clone();
            for field in &opts.item_fields {
                copy_item_field(&mut clone, first, *field);
            }

            if !opts.machine_fields.is_empty() {
                let own = other.machine(item.machine);
                let theirs = base.machine(first.machine);
                if !opts.only_same_machine || own.name == theirs.name {
                    let mut machine = own.clone();
                    for field in &opts.machine_fields {
                        match field {
                            MachineReplaceField::Name => machine.name = theirs.name.clone(),
                            MachineReplaceField::Description => {
                                machine.description = theirs.description.clone()
                            }
                            MachineReplaceField::Manufacturer => {
                                machine.manufacturer = theirs.manufacturer.clone()
                            }
                            MachineReplaceField::Category => {
                                machine.category = theirs.category.clone()
                            }
                            MachineReplaceField::Year => machine.year = theirs.year.clone(),
                        }
                    }
                    out.update_machine(clone.machine, machine);
                }
            }

            out.add(&key, clone);
        }
    }
    out
}

fn copy_item_field(dst: &mut DatItem, src: &DatItem, field: ItemReplaceField) {
    match field {
        ItemReplaceField::Name => dst.name = src.name.clone(),
        ItemReplaceField::Status => dst.status = src.status,
        ItemReplaceField::Size => {
            if let (ItemKind::Rom(d), Some(size)) = (&mut dst.kind, src.size()) {
                d.size = Some(size);
            }
        }
        ItemReplaceField::Hash(hash_field) => {
            let Some(value) = src.hash(hash_field).map(String::from) else {
                return;
            };
            set_hash(dst, hash_field, value);
        }
    }
}

fn set_hash(dst: &mut DatItem, field: ItemField, value: String) {
    match (&mut dst.kind, field) {
        (ItemKind::Rom(r), ItemField::Crc) => r.crc = Some(value),
        (ItemKind::Rom(r), ItemField::Md5) => r.md5 = Some(value),
        (ItemKind::Rom(r), ItemField::Sha1) => r.sha1 = Some(value),
        (ItemKind::Rom(r), ItemField::Sha256) => r.sha256 = Some(value),
        (ItemKind::Rom(r), ItemField::Sha384) => r.sha384 = Some(value),
        (ItemKind::Rom(r), ItemField::Sha512) => r.sha512 = Some(value),
        (ItemKind::Rom(r), ItemField::SpamSum) => r.spamsum = Some(value),
        (ItemKind::Disk(d), ItemField::Md5) => d.md5 = Some(value),
        (ItemKind::Disk(d), ItemField::Sha1) => d.sha1 = Some(value),
        (ItemKind::Media(m), ItemField::Md5) => m.md5 = Some(value),
        (ItemKind::Media(m), ItemField::Sha1) => m.sha1 = Some(value),
        (ItemKind::Media(m), ItemField::Sha256) => m.sha256 = Some(value),
        (ItemKind::Media(m), ItemField::SpamSum) => m.spamsum = Some(value),
        _ => {}
    }
}

/// Subtract `base` from `other`.
///
/// Game mode (inputs bucketed by machine name): a whole `other` machine is
/// dropped only when its item set exactly matches the same-named machine in
/// `base` — same count and full hash-aware membership. Partial matches are
/// kept whole. Item and machine naming differences play no part beyond the
/// bucket lookup.
///
/// Hash mode (inputs bucketed by a hash field): individual `other` items are
/// dropped when they have any hash-aware duplicate in `base`.
pub fn against(base: &ItemIndex, other: &ItemIndex, game_mode: bool) -> ItemIndex {
    let out = other.clone_structure(None);
    if base.is_empty() || other.is_empty() {
        return out;
    }

    let keys = other.keys();
    if game_mode {
        keys.par_iter().for_each(|key| {
            let Some(bucket) = other.bucket(key) else {
                return;
            };
            let base_bucket = base.bucket(key).unwrap_or_default();
            let full_match = base_bucket.len() == bucket.len()
                && bucket
                    .iter()
                    .all(|item| base_bucket.iter().any(|b| item.hash_match(b)));
            if !full_match {
                out.add_range(key, bucket);
            }
        });
    } else {
        keys.par_iter().for_each(|key| {
            let Some(bucket) = other.bucket(key) else {
                return;
            };
            let survivors: Vec<DatItem> = bucket
                .into_iter()
                .filter(|item| !base.has_duplicates(item, other.arena()))
                .collect();
            out.add_range(key, survivors);
        });
    }

    debug!(
        kept = out.len(),
        game_mode, "against diff of '{}'", other.header().name
    );
    out
}

/// Partition a merged index back into its `inputs` load-ordered
/// contributions, routing each item by `Source.index`. Items with an
/// out-of-range source index (including expected-placeholder sentinels) are
/// dropped.
pub fn cascade(base: &ItemIndex, inputs: usize) -> Vec<ItemIndex> {
    let outputs: Vec<ItemIndex> = (0..inputs).map(|_| base.clone_structure(None)).collect();

    let keys = base.keys();
    keys.par_iter().for_each(|key| {
        let Some(bucket) = base.bucket(key) else {
            return;
        };
        for item in bucket {
            if let Some(out) = outputs.get(item.source.index) {
                out.add(key, item);
            }
        }
    });

    outputs
}

fn input_stem(input_paths: &[impl AsRef<Path>], index: usize) -> String {
    input_paths
        .get(index)
        .and_then(|p| p.as_ref().file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| index.to_string())
}

/// Keep only the items a full merge tagged `External`, renaming each item's
/// machine with the base file name of the input it first arrived from.
pub fn duplicates(base: &ItemIndex, input_paths: &[impl AsRef<Path>]) -> ItemIndex {
    let mut out = base.clone_structure(Some("duplicates"));

    for key in base.keys() {
        let Some(bucket) = base.bucket(&key) else {
            continue;
        };
        for mut item in bucket {
            if item.dupe_type != DupeType::External {
                continue;
            }
            let machine_name = base.machine(item.machine).name.clone();
            let renamed = format!(
                "{machine_name} ({})",
                input_stem(input_paths, item.source.index)
            );
            item.machine = out.rename_machine(item.machine, renamed);
            out.push(item);
        }
    }
    out
}

/// Bucket the `Internal`-and-untagged remainder of a full merge into one
/// index per input, routed by `Source.index`.
pub fn individuals(base: &ItemIndex, input_paths: &[impl AsRef<Path>]) -> Vec<ItemIndex> {
    let outputs: Vec<ItemIndex> = (0..input_paths.len())
        .map(|i| base.clone_structure(Some(&input_stem(input_paths, i))))
        .collect();

    let keys = base.keys();
    keys.par_iter().for_each(|key| {
        let Some(bucket) = base.bucket(key) else {
            return;
        };
        for item in bucket {
            if item.dupe_type == DupeType::External {
                continue;
            }
            if let Some(out) = outputs.get(item.source.index) {
                out.add(key, item);
            }
        }
    });

    outputs
}

/// Merge the `Internal`-and-untagged remainder of a full merge into a single
/// index, disambiguating machine names with the originating input's base
/// file name.
pub fn no_duplicates(base: &ItemIndex, input_paths: &[impl AsRef<Path>]) -> ItemIndex {
    let mut out = base.clone_structure(Some("no duplicates"));

    for key in base.keys() {
        let Some(bucket) = base.bucket(&key) else {
            continue;
        };
        for mut item in bucket {
            if item.dupe_type == DupeType::External {
                continue;
            }
            let machine_name = base.machine(item.machine).name.clone();
            let renamed = format!(
                "{machine_name} ({})",
                input_stem(input_paths, item.source.index)
            );
            item.machine = out.rename_machine(item.machine, renamed);
            out.push(item);
        }
    }
    out
}
