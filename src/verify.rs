//! Presence checks of an index against a content-addressed depot (or against
//! caller-seeded expectations), reducing the index to a "fixDAT" of exactly
//! the items that could not be located.

use crate::index::ItemIndex;
use crate::model::{DatItem, ItemField, ItemKind, MachineId, RomData, Source};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const SHA1_HEX_LEN: usize = 40;

/// Identity record embedded in a single-entry depot container. The name,
/// size, and hashes come from the container contents, never from the file
/// name on disk.
#[derive(Debug, Clone, Default)]
pub struct ItemIdentity {
    pub name: String,
    pub size: Option<u64>,
    pub crc: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
}

impl ItemIdentity {
    /// Probe item for hash-aware matching. The machine handle is a dummy;
    /// matching never resolves it.
    fn into_probe_item(self) -> DatItem {
        DatItem::new(
            self.name,
            ItemKind::Rom(RomData {
                size: self.size,
                crc: self.crc,
                md5: self.md5,
                sha1: self.sha1,
                sha256: self.sha256,
                ..RomData::default()
            }),
            Source::expected(),
            MachineId(0),
        )
    }
}

/// Extracts the embedded identity record from a depot container. Archive
/// codecs live outside this crate; verification only needs this one hook.
/// A failed or malformed read is reported as `None` and treated as not-found.
pub trait ContainerIdentity {
    fn identity(&self, path: &Path) -> Option<ItemIdentity>;
}

/// Sharded subpath for `hash` using `depth` levels of successive
/// hash-character pairs: `ab/cd/...`.
pub fn depot_subpath(hash: &str, depth: usize) -> PathBuf {
    let mut path = PathBuf::new();
    for level in 0..depth {
        path.push(&hash[level * 2..level * 2 + 2]);
    }
    path
}

fn probe_shard(shard_dir: &Path, hash: &str) -> Option<PathBuf> {
    let entries = match fs::read_dir(shard_dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("skipping depot shard {}: {}", shard_dir.display(), err);
            return None;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                error!("error reading depot shard {}: {}", shard_dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        if path
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(hash))
        {
            return Some(path);
        }
    }
    None
}

/// Verify the index against one or more depot roots, reducing it to a fixDAT
/// of the items that could not be found.
///
/// The index is rebucketed by SHA-1 (no dedup). Each well-formed 40-hex
/// bucket key is resolved to its sharded subpath (`depth` levels) and probed
/// against every existing depot root in order, stopping at the first hit. On
/// a hit, the container's embedded identity is extracted and every hash-aware
/// duplicate of it in the bucket — rom- and disk-shaped alike — is flagged
/// for removal. Malformed keys are skipped; I/O failures on one candidate are
/// swallowed and treated as not-found.
///
/// Finishes by clearing merge markings, purging flagged items, and prefixing
/// the header with `fixDAT_`. Returns the number of bucket keys located.
pub fn verify_depot(
    index: &mut ItemIndex,
    directories: &[PathBuf],
    depth: usize,
    reader: &dyn ContainerIdentity,
) -> usize {
    let roots: Vec<&PathBuf> = directories.iter().filter(|d| d.is_dir()).collect();
    info!(
        roots = roots.len(),
        depth, "verifying '{}' against depot", index.header().name
    );

    index.bucket_by(ItemField::Sha1, false);

    let mut found = 0;
    for key in index.keys() {
        if key.len() != SHA1_HEX_LEN || !key.bytes().all(|b| b.is_ascii_hexdigit()) {
            continue;
        }
        if depth * 2 > key.len() {
            continue;
        }

        let subpath = depot_subpath(&key, depth);
        let hit = roots
            .iter()
            .find_map(|root| probe_shard(&root.join(&subpath), &key));

        let Some(container) = hit else {
            continue;
        };
        let Some(identity) = reader.identity(&container) else {
            debug!("unreadable depot container {}", container.display());
            continue;
        };

        let probe = identity.into_probe_item();
        let marked = index.mark_removed_where(&key, |item| probe.hash_match(item));
        if marked > 0 {
            found += 1;
        }
    }

    finish_fixdat(index);
    info!(
        found,
        missing = index.len(),
        "depot verification of '{}' complete", index.header().name
    );
    found
}

/// Verify the index against caller-seeded expectations: rebucket by CRC32
/// (`hash_only`) or machine name with full dedup, then flag every item whose
/// source is not the expected-placeholder sentinel. The remainder — the
/// placeholders nothing matched against — becomes the fixDAT. Returns the
/// number of items flagged.
pub fn verify_generic(index: &mut ItemIndex, hash_only: bool) -> usize {
    let field = if hash_only {
        ItemField::Crc
    } else {
        ItemField::Machine
    };
    index.bucket_by(field, true);

    let marked = index.mark_removed_all(|item| !item.source.is_expected());
    finish_fixdat(index);
    marked
}

fn finish_fixdat(index: &mut ItemIndex) {
    index.clear_dupe_tags();
    index.clear_marked();
    index.header_mut().prefix("fixDAT_");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subpath_takes_successive_pairs() {
        let hash = "abcdef0123456789abcdef0123456789abcdef01";
        assert_eq!(depot_subpath(hash, 2), PathBuf::from("ab/cd"));
        assert_eq!(depot_subpath(hash, 4), PathBuf::from("ab/cd/ef/01"));
        assert_eq!(depot_subpath(hash, 0), PathBuf::new());
    }
}
