//! pillarscore-store — Persistence backends.
//!
//! Implements the `ResponseStore` trait for an in-memory table, a directory
//! of JSON files, and a PostgREST-compatible HTTP API, and loads the
//! configuration that picks between them.

pub mod config;
pub mod file;
pub mod memory;
pub mod rest;

pub use config::{create_store, load_config, PillarscoreConfig, StoreConfig};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use rest::RestStore;
