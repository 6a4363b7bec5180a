//! Storage abstraction and implementations for learnpath.
//!
//! This crate provides a slot-based storage interface with a JSON-file
//! implementation and an in-memory one.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;

pub use trait_::{Storage, StorageError, Result};
pub use json_storage::{JsonStorage, SlotMeta};
pub use memory::MemoryStorage;
