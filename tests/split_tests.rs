use romdat::{
    split, DatHeader, DatItem, ItemIndex, ItemKind, ItemStatus, Machine, MediaData, RomData,
    Source,
};

fn add_item(index: &mut ItemIndex, machine: &str, name: &str, kind: ItemKind) {
    let mid = index.intern_machine(Machine::named(machine));
    index.push(DatItem::new(name, kind, Source::new(0, "a.dat"), mid));
}

fn rom(size: Option<u64>, crc: Option<&str>, sha1: Option<&str>, sha512: Option<&str>) -> ItemKind {
    ItemKind::Rom(RomData {
        size,
        crc: crc.map(String::from),
        sha1: sha1.map(String::from),
        sha512: sha512.map(String::from),
        ..RomData::default()
    })
}

#[test]
fn by_extension_routes_once_or_both() {
    let mut idx = ItemIndex::new(DatHeader::named("exts"));
    add_item(&mut idx, "m", "game.BIN", rom(Some(1), Some("aa"), None, None));
    add_item(&mut idx, "m", "game.chd", rom(Some(2), Some("bb"), None, None));
    add_item(&mut idx, "m", "game.wav", rom(Some(3), Some("cc"), None, None));

    let (a, b) = split::by_extension(
        &idx,
        &[".bin".to_string()],
        &["CHD".to_string()],
    );

    let a_names: Vec<String> = a.items().iter().map(|i| i.name.clone()).collect();
    let b_names: Vec<String> = b.items().iter().map(|i| i.name.clone()).collect();

    // .bin only in A, .chd only in B, .wav (neither list) in both.
    assert!(a_names.contains(&"game.BIN".to_string()));
    assert!(!b_names.contains(&"game.BIN".to_string()));
    assert!(b_names.contains(&"game.chd".to_string()));
    assert!(!a_names.contains(&"game.chd".to_string()));
    assert!(a_names.contains(&"game.wav".to_string()));
    assert!(b_names.contains(&"game.wav".to_string()));
}

#[test]
fn by_hash_first_matching_rule_wins() {
    let mut idx = ItemIndex::new(DatHeader::named("hashes"));
    add_item(&mut idx, "m", "strong.bin", rom(Some(1), Some("aa"), None, Some("ff".repeat(64).as_str())));
    add_item(&mut idx, "m", "sha1only.bin", rom(Some(2), None, Some("bb"), None));
    add_item(&mut idx, "m", "crconly.bin", rom(Some(3), Some("cc"), None, None));
    add_item(&mut idx, "m", "bare.bin", rom(None, None, None, None));

    let mut nodump = DatItem::new(
        "nodump.bin",
        rom(Some(4), Some("dd"), None, None),
        Source::new(0, "a.dat"),
        idx.arena().lookup("m").unwrap(),
    );
    nodump.status = ItemStatus::Nodump;
    idx.push(nodump);

    let outputs = split::by_hash(&idx);

    // A SHA-512 alongside a CRC still routes to the SHA-512 output, and a
    // nodump with hashes still routes to the nodump output.
    assert_eq!(outputs.sha512.items()[0].name, "strong.bin");
    assert_eq!(outputs.sha1.items()[0].name, "sha1only.bin");
    assert_eq!(outputs.crc.items()[0].name, "crconly.bin");
    assert_eq!(outputs.other.items()[0].name, "bare.bin");
    assert_eq!(outputs.nodump.items()[0].name, "nodump.bin");
    assert!(outputs.sha384.is_empty());
    assert!(outputs.sha256.is_empty());
    assert!(outputs.md5.is_empty());

    let total: usize = outputs.into_outputs().iter().map(|o| o.len()).sum();
    assert_eq!(total, 5);
}

#[test]
fn by_type_excludes_unrouted_kinds() {
    let mut idx = ItemIndex::new(DatHeader::named("types"));
    add_item(&mut idx, "m", "a.rom", rom(Some(1), Some("aa"), None, None));
    add_item(
        &mut idx,
        "m",
        "b.chd",
        ItemKind::Disk(romdat::DiskData {
            sha1: Some("bb".to_string()),
            md5: None,
        }),
    );
    add_item(
        &mut idx,
        "m",
        "c.img",
        ItemKind::Media(MediaData {
            sha1: Some("cc".to_string()),
            ..MediaData::default()
        }),
    );
    add_item(&mut idx, "m", "d.wav", ItemKind::Sample);
    add_item(&mut idx, "m", "region-eu", ItemKind::Release);

    let outputs = split::by_type(&idx);
    assert_eq!(outputs.rom.len(), 1);
    assert_eq!(outputs.disk.len(), 1);
    assert_eq!(outputs.media.len(), 1);
    assert_eq!(outputs.sample.len(), 1);

    let routed =
        outputs.rom.len() + outputs.disk.len() + outputs.media.len() + outputs.sample.len();
    assert_eq!(routed, idx.len() - 1);
}

#[test]
fn by_size_routes_on_radix() {
    let mut idx = ItemIndex::new(DatHeader::named("sizes"));
    add_item(&mut idx, "m", "small.bin", rom(Some(99), Some("aa"), None, None));
    add_item(&mut idx, "m", "exact.bin", rom(Some(100), Some("bb"), None, None));
    add_item(&mut idx, "m", "nosize.bin", rom(None, Some("cc"), None, None));
    add_item(&mut idx, "m", "sample.wav", ItemKind::Sample);

    let (less, greater) = split::by_size(&idx, 100);

    let less_names: Vec<String> = less.items().iter().map(|i| i.name.clone()).collect();
    assert_eq!(less.len(), 3);
    assert!(less_names.contains(&"small.bin".to_string()));
    assert!(less_names.contains(&"nosize.bin".to_string()));
    assert!(less_names.contains(&"sample.wav".to_string()));

    assert_eq!(greater.len(), 1);
    assert_eq!(greater.items()[0].name, "exact.bin");
}

#[test]
fn by_level_one_output_per_directory() {
    let mut idx = ItemIndex::new(DatHeader::named("levels"));
    add_item(&mut idx, "a/b/g1", "g1.bin", rom(Some(1), Some("aa"), None, None));
    add_item(&mut idx, "a/b/g2", "g2.bin", rom(Some(2), Some("bb"), None, None));
    add_item(&mut idx, "a/c/g3", "g3.bin", rom(Some(3), Some("cc"), None, None));

    let outputs = split::by_level(&mut idx);
    assert_eq!(outputs.len(), 2);

    let ab = outputs
        .iter()
        .find(|o| o.header().name.contains("a/b"))
        .expect("a/b output");
    let mut ab_machines: Vec<String> = ab
        .items()
        .iter()
        .map(|i| ab.machine(i.machine).name.clone())
        .collect();
    ab_machines.sort();
    assert_eq!(ab_machines, vec!["g1", "g2"]);

    let ac = outputs
        .iter()
        .find(|o| o.header().name.contains("a/c"))
        .expect("a/c output");
    assert_eq!(ac.len(), 1);
    assert_eq!(ac.machine(ac.items()[0].machine).name, "g3");
}
