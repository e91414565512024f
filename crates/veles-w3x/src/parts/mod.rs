//! Map info sub-records.
//!
//! Each record carries the `read`/`write`/`byte_len` triple; the lists in
//! [`MapInfo`](crate::MapInfo) are count-prefixed sequences of these.

mod availability;
mod force;
mod player;
mod random;

pub use availability::{TechAvailability, UpgradeAvailability};
pub use force::Force;
pub use player::Player;
pub use random::{RandomItemSet, RandomItemTable, RandomUnitGroup, RandomUnitTable};

/// Serialized size of a null-terminated string.
pub(crate) fn cstring_len(value: &str) -> usize {
    value.len() + 1
}
