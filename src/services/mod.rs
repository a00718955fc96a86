pub mod refresher;
pub mod scheduler;

pub use refresher::{CycleOutcome, RefreshReport, Refresher};
pub use scheduler::spawn_refresh_scheduler;
