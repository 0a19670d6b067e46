//! JSON file backend for the sync state.
//!
//! The whole state document lives in one file. Writes go to a sibling
//! temporary file first and are renamed into place, so a crash mid-write
//! leaves the previous state intact.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::DiskStateRepository;

#[cfg(test)]
mod tests;
