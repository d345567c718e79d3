//! Partitioning of one index into 2..N new indexes. Every output is a
//! structural clone of the source (header with a descriptive suffix, shared
//! machine arena), and every item lands in exactly one output — except the
//! intentional dual-routing of [`by_extension`] for items matching neither
//! extension list.

use crate::index::ItemIndex;
use crate::model::{ItemField, ItemKind, ItemStatus};
use rayon::prelude::*;

/// Route items by file-name extension. An item goes to the first output if
/// its extension is in `ext_a`, the second if in `ext_b`, and to **both**
/// when it matches neither list — never silently dropped. Extensions are
/// compared case-insensitively with leading dots stripped.
pub fn by_extension(index: &ItemIndex, ext_a: &[String], ext_b: &[String]) -> (ItemIndex, ItemIndex) {
    let norm = |exts: &[String]| -> Vec<String> {
        exts.iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    };
    let ext_a = norm(ext_a);
    let ext_b = norm(ext_b);

    let out_a = index.clone_structure(Some(&ext_a.join(",")));
    let out_b = index.clone_structure(Some(&ext_b.join(",")));

    let keys = index.keys();
    keys.par_iter().for_each(|key| {
        let Some(bucket) = index.bucket(key) else {
            return;
        };
        for item in bucket {
            let ext = item.extension();
            let in_a = ext.as_deref().is_some_and(|e| ext_a.iter().any(|x| x == e));
            let in_b = ext.as_deref().is_some_and(|e| ext_b.iter().any(|x| x == e));
            match (in_a, in_b) {
                (true, _) => out_a.add(key, item),
                (false, true) => out_b.add(key, item),
                (false, false) => {
                    out_a.add(key, item.clone());
                    out_b.add(key, item);
                }
            }
        }
    });

    (out_a, out_b)
}

/// Outputs of [`by_hash`], one per routing rule.
#[derive(Debug)]
pub struct HashSplit {
    pub nodump: ItemIndex,
    pub sha512: ItemIndex,
    pub sha384: ItemIndex,
    pub sha256: ItemIndex,
    pub sha1: ItemIndex,
    pub md5: ItemIndex,
    pub crc: ItemIndex,
    pub other: ItemIndex,
}

impl HashSplit {
    pub fn into_outputs(self) -> [ItemIndex; 8] {
        [
            self.nodump,
            self.sha512,
            self.sha384,
            self.sha256,
            self.sha1,
            self.md5,
            self.crc,
            self.other,
        ]
    }
}

/// Route each item to exactly one output by the first matching rule, in
/// order: Nodump status, then the strongest hash present (SHA-512 down to
/// CRC32), then "Other" for items with no hash at all. An earlier rule wins
/// even when a weaker hash is also present.
pub fn by_hash(index: &ItemIndex) -> HashSplit {
    let split = HashSplit {
        nodump: index.clone_structure(Some("Nodump")),
        sha512: index.clone_structure(Some("SHA-512")),
        sha384: index.clone_structure(Some("SHA-384")),
        sha256: index.clone_structure(Some("SHA-256")),
        sha1: index.clone_structure(Some("SHA-1")),
        md5: index.clone_structure(Some("MD5")),
        crc: index.clone_structure(Some("CRC")),
        other: index.clone_structure(Some("Other")),
    };

    let keys = index.keys();
    keys.par_iter().for_each(|key| {
        let Some(bucket) = index.bucket(key) else {
            return;
        };
        for item in bucket {
            let out = if item.status == ItemStatus::Nodump {
                &split.nodump
            } else if item.hash(ItemField::Sha512).is_some() {
                &split.sha512
            } else if item.hash(ItemField::Sha384).is_some() {
                &split.sha384
            } else if item.hash(ItemField::Sha256).is_some() {
                &split.sha256
            } else if item.hash(ItemField::Sha1).is_some() {
                &split.sha1
            } else if item.hash(ItemField::Md5).is_some() {
                &split.md5
            } else if item.hash(ItemField::Crc).is_some() {
                &split.crc
            } else {
                &split.other
            };
            out.add(key, item);
        }
    });

    split
}

/// Outputs of [`by_type`], one per routed item kind.
#[derive(Debug)]
pub struct TypeSplit {
    pub disk: ItemIndex,
    pub media: ItemIndex,
    pub rom: ItemIndex,
    pub sample: ItemIndex,
}

/// Route items to one output per kind. Kinds outside
/// {Disk, Media, Rom, Sample} are excluded from this split entirely.
pub fn by_type(index: &ItemIndex) -> TypeSplit {
    let split = TypeSplit {
        disk: index.clone_structure(Some("disk")),
        media: index.clone_structure(Some("media")),
        rom: index.clone_structure(Some("rom")),
        sample: index.clone_structure(Some("sample")),
    };

    let keys = index.keys();
    keys.par_iter().for_each(|key| {
        let Some(bucket) = index.bucket(key) else {
            return;
        };
        for item in bucket {
            match &item.kind {
                ItemKind::Disk(_) => split.disk.add(key, item),
                ItemKind::Media(_) => split.media.add(key, item),
                ItemKind::Rom(_) => split.rom.add(key, item),
                ItemKind::Sample => split.sample.add(key, item),
                ItemKind::Release => {}
            }
        }
    });

    split
}

/// Partition by ROM size against `radix`: ROMs with a known size at or above
/// `radix` go to the greater-or-equal output, everything else (smaller,
/// unknown size, or not a ROM) goes to the less-than output.
pub fn by_size(index: &ItemIndex, radix: u64) -> (ItemIndex, ItemIndex) {
    let less = index.clone_structure(Some(&format!("less than {radix}")));
    let greater = index.clone_structure(Some(&format!("equal-greater than {radix}")));

    let keys = index.keys();
    keys.par_iter().for_each(|key| {
        let Some(bucket) = index.bucket(key) else {
            return;
        };
        for item in bucket {
            match item.size() {
                Some(size) if size >= radix => greater.add(key, item),
                _ => less.add(key, item),
            }
        }
    });

    (less, greater)
}

fn path_depth(key: &str) -> usize {
    key.matches('/').count()
}

/// Partition by the directory level embedded in machine names.
///
/// Buckets by full machine path, walks the keys sorted by (path depth, then
/// string order), and flushes into a new output whenever the parent directory
/// changes — one output per directory. The directory prefix is stripped from
/// item and machine names before insertion.
pub fn by_level(index: &mut ItemIndex) -> Vec<ItemIndex> {
    index.bucket_by(ItemField::Machine, false);

    let mut keys = index.keys();
    keys.sort_by(|a, b| path_depth(a).cmp(&path_depth(b)).then_with(|| a.cmp(b)));

    let mut outputs: Vec<ItemIndex> = Vec::new();
    let mut current: Option<(String, ItemIndex)> = None;

    for key in keys {
        let (parent, leaf) = match key.rsplit_once('/') {
            Some((p, l)) => (p.to_string(), l.to_string()),
            None => (String::new(), key.clone()),
        };

        let rolls_over = current.as_ref().map_or(true, |(p, _)| *p != parent);
        if rolls_over {
            if let Some((_, done)) = current.take() {
                outputs.push(done);
            }
            let out = if parent.is_empty() {
                index.clone_structure(None)
            } else {
                index.clone_structure(Some(&parent))
            };
            current = Some((parent.clone(), out));
        }

        let Some(bucket) = index.bucket(&key) else {
            continue;
        };
        let (_, out) = current.as_mut().expect("rolling output exists");
        let prefix = format!("{parent}/");
        for mut item in bucket {
            if !parent.is_empty() {
                if let Some(stripped) = item.name.strip_prefix(&prefix) {
                    item.name = stripped.to_string();
                }
            }
            item.machine = out.rename_machine(item.machine, leaf.clone());
            out.push(item);
        }
    }

    if let Some((_, done)) = current.take() {
        outputs.push(done);
    }
    outputs
}
