/// Serial code storage
///
/// This module owns the one durable record this service keeps: a row per
/// serial code with its audio reference and usage quota.

pub mod codes;
pub mod types;

pub use codes::CodeStore;
pub use types::{SeedEntry, SerialCode, SyncReport};
