pub mod position;

pub use position::{
    level, HitStatus, NewPosition, Position, PositionUpdate, StopStatus, ZoneStatus,
};
