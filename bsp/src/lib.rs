//! The level side of a PVS build: the BSP tree the regions are cut from,
//! grouping its leaves into super leaves, and turning the region visibility
//! back into a leaf PVS that can be stored.

mod error;
mod level_file;
mod store;
mod super_leaf;
mod tree;

#[cfg(test)]
mod tests;

pub use error::*;
pub use level_file::*;
pub use store::*;
pub use super_leaf::*;
pub use tree::*;
