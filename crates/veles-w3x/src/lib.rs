//! Warcraft III map info (war3map.w3i) records.
//!
//! The w3i file inside a map archive describes everything the game lobby
//! and loading screen need: names, camera bounds, players, forces, and
//! availability overrides. Two layouts exist, version 18 (Reign of Chaos)
//! and version 25 (The Frozen Throne); [`MapInfo`] reads and writes both.
//!
//! # Example
//!
//! ```no_run
//! use veles_w3x::MapInfo;
//!
//! let data = std::fs::read("war3map.w3i")?;
//! let info = MapInfo::read(&data)?;
//! println!("{} by {}", info.name, info.author);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod map_info;

pub mod parts;

pub use error::{Error, Result};
pub use map_info::{MapInfo, VERSION_ROC, VERSION_TFT};
