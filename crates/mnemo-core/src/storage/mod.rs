//! Storage Module
//!
//! The scheduler never persists anything itself. Hosts implement
//! [`ReviewStore`] over whatever they already use; [`MemoryStore`] is the
//! in-process implementation used by the CLI and the tests.

mod store;

pub use store::{MemoryStore, Result, ReviewStore, StorageError};
