pub mod item;
pub mod machine;

pub use item::{
    DatItem, DiskData, DupeType, ItemField, ItemKind, ItemStatus, MediaData, RomData, Source,
};
pub use machine::{Machine, MachineArena, MachineId};
