pub mod backend;
pub mod positions;

pub use backend::{JsonFileBackend, KvBackend};
pub use positions::{ImportRecord, ImportReport, PositionStore};
