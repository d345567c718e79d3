use super::machine::MachineId;
use std::path::PathBuf;

/// Dump status carried by a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    None,
    Good,
    BadDump,
    Nodump,
    Verified,
}

/// Provenance tag assigned when the merge engine collapses duplicates.
///
/// `External` outranks `Internal`: once an item is known to repeat across
/// load passes, a same-pass repeat does not demote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DupeType {
    #[default]
    None,
    Internal,
    External,
}

/// Which catalog an item came from. `index` is the position of the input in
/// load order; the sentinel `EXPECTED_INDEX` marks synthetic placeholders
/// seeded by verification callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub index: usize,
    pub path: PathBuf,
}

impl Source {
    pub const EXPECTED_INDEX: usize = usize::MAX;

    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Placeholder source for caller-seeded "expected" entries.
    pub fn expected() -> Self {
        Self {
            index: Self::EXPECTED_INDEX,
            path: PathBuf::new(),
        }
    }

    pub fn is_expected(&self) -> bool {
        self.index == Self::EXPECTED_INDEX
    }
}

/// Hash and size evidence carried by a ROM entry. All hashes are opaque hex
/// strings; absent fields mean the source catalog did not provide them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RomData {
    pub size: Option<u64>,
    pub crc: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub sha384: Option<String>,
    pub sha512: Option<String>,
    pub spamsum: Option<String>,
}

/// Hash evidence carried by a disk (CHD-style) entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiskData {
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

/// Hash evidence carried by a media entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaData {
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub spamsum: Option<String>,
}

/// Kind-specific payload of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Rom(RomData),
    Disk(DiskData),
    Media(MediaData),
    Sample,
    Release,
}

/// Fields an index can be bucketed by: the owning machine's name, or one of
/// the hash columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Machine,
    Crc,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    SpamSum,
}

/// Hash columns in weakest-to-strongest listing order used by field loops.
pub const HASH_FIELDS: [ItemField; 7] = [
    ItemField::Crc,
    ItemField::Md5,
    ItemField::Sha1,
    ItemField::Sha256,
    ItemField::Sha384,
    ItemField::Sha512,
    ItemField::SpamSum,
];

/// One catalog entry. The machine back-reference is an arena handle owned by
/// the index holding the item, never a shared pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct DatItem {
    pub name: String,
    pub kind: ItemKind,
    pub status: ItemStatus,
    pub remove: bool,
    pub dupe_type: DupeType,
    pub source: Source,
    pub machine: MachineId,
}

impl DatItem {
    pub fn new(name: impl Into<String>, kind: ItemKind, source: Source, machine: MachineId) -> Self {
        Self {
            name: name.into(),
            kind,
            status: ItemStatus::None,
            remove: false,
            dupe_type: DupeType::None,
            source,
            machine,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match &self.kind {
            ItemKind::Rom(r) => r.size,
            _ => None,
        }
    }

    /// The value of one hash column, if this kind carries it and the source
    /// catalog filled it in. `ItemField::Machine` never resolves here.
    pub fn hash(&self, field: ItemField) -> Option<&str> {
        match &self.kind {
            ItemKind::Rom(r) => match field {
                ItemField::Crc => r.crc.as_deref(),
                ItemField::Md5 => r.md5.as_deref(),
                ItemField::Sha1 => r.sha1.as_deref(),
                ItemField::Sha256 => r.sha256.as_deref(),
                ItemField::Sha384 => r.sha384.as_deref(),
                ItemField::Sha512 => r.sha512.as_deref(),
                ItemField::SpamSum => r.spamsum.as_deref(),
                ItemField::Machine => None,
            },
            ItemKind::Disk(d) => match field {
                ItemField::Md5 => d.md5.as_deref(),
                ItemField::Sha1 => d.sha1.as_deref(),
                _ => None,
            },
            ItemKind::Media(m) => match field {
                ItemField::Md5 => m.md5.as_deref(),
                ItemField::Sha1 => m.sha1.as_deref(),
                ItemField::Sha256 => m.sha256.as_deref(),
                ItemField::SpamSum => m.spamsum.as_deref(),
                _ => None,
            },
            ItemKind::Sample | ItemKind::Release => None,
        }
    }

    pub fn has_any_hash(&self) -> bool {
        HASH_FIELDS.iter().any(|f| self.hash(*f).is_some())
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ItemKind::Rom(_) => "rom",
            ItemKind::Disk(_) => "disk",
            ItemKind::Media(_) => "media",
            ItemKind::Sample => "sample",
            ItemKind::Release => "release",
        }
    }

    /// Best-available-evidence equality: every hash present on both sides
    /// must match (case-insensitively) and sizes must match when both are
    /// known. At least one piece of shared evidence is required, so an item
    /// with no hash and no size never matches anything. Names and kinds are
    /// deliberately ignored; a disk and a rom with the same SHA-1 are the
    /// same content. Not transitive in general.
    pub fn hash_match(&self, other: &DatItem) -> bool {
        let mut evidence = false;

        if let (Some(a), Some(b)) = (self.size(), other.size()) {
            if a != b {
                return false;
            }
            evidence = true;
        }

        for field in HASH_FIELDS {
            if let (Some(a), Some(b)) = (self.hash(field), other.hash(field)) {
                if !a.eq_ignore_ascii_case(b) {
                    return false;
                }
                evidence = true;
            }
        }

        evidence
    }

    /// File-name extension without the leading dot, lowercased.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom(size: Option<u64>, crc: Option<&str>, sha1: Option<&str>) -> DatItem {
        DatItem::new(
            "test.bin",
            ItemKind::Rom(RomData {
                size,
                crc: crc.map(String::from),
                sha1: sha1.map(String::from),
                ..RomData::default()
            }),
            Source::new(0, "a.dat"),
            MachineId(0),
        )
    }

    #[test]
    fn match_requires_shared_evidence() {
        let a = rom(None, Some("deadbeef"), None);
        let b = rom(None, None, Some("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3"));
        // No hash in common and no sizes: nothing to compare, not a match.
        assert!(!a.hash_match(&b));
    }

    #[test]
    fn match_ignores_absent_hashes() {
        let a = rom(Some(128), Some("deadbeef"), None);
        let b = rom(Some(128), Some("DEADBEEF"), Some("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3"));
        assert!(a.hash_match(&b));
    }

    #[test]
    fn match_rejects_conflicting_hash() {
        let a = rom(Some(128), Some("deadbeef"), None);
        let b = rom(Some(128), Some("cafebabe"), None);
        assert!(!a.hash_match(&b));
    }

    #[test]
    fn empty_item_never_matches() {
        let a = rom(None, None, None);
        let b = rom(None, None, None);
        assert!(!a.hash_match(&b));
        assert!(!a.hash_match(&a.clone()));
    }

    #[test]
    fn disk_matches_rom_on_shared_sha1() {
        let r = rom(Some(64), None, Some("abc123"));
        let d = DatItem::new(
            "game.chd",
            ItemKind::Disk(DiskData {
                md5: None,
                sha1: Some("ABC123".to_string()),
            }),
            Source::new(1, "b.dat"),
            MachineId(0),
        );
        assert!(r.hash_match(&d));
    }
}
