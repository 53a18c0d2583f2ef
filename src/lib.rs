//! Download, load, transform and map USDA Forest Service EDW geodata.

pub mod catalog;
pub mod crs;
pub mod error;
pub mod feature;
pub mod fetch;
pub mod load;
pub mod render;
pub mod transform;

#[cfg(test)]
mod test;

pub use error::{Error, Result};
