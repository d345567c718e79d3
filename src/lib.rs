pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod index;
pub mod logging;
pub mod merge;
pub mod model;
pub mod split;
pub mod stats;
pub mod verify;

pub use config::{AppConfig, DepotInformation};
pub use engine::{DatEngine, DatParser, DatWriter};
pub use error::Error;
pub use index::{DatHeader, ItemIndex};
pub use model::{
    DatItem, DiskData, DupeType, ItemField, ItemKind, ItemStatus, Machine, MachineArena,
    MachineId, MediaData, RomData, Source,
};
pub use stats::{ItemStatistics, StatsSnapshot};
pub use verify::{ContainerIdentity, ItemIdentity};
