pub mod health;
pub mod interchange;
pub mod metrics;
pub mod positions;
pub mod quotes;
pub mod refresh;
pub mod search;
