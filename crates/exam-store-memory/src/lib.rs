//! In-memory backend for the exam record store.
//!
//! The table and the audit log live behind one async mutex, so a record
//! change and its log entry are a single unit. The log is written through to
//! a delimited-text snapshot after every append.

mod history;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use history::AuditLog;
pub use store::MemoryStore;

#[cfg(test)]
mod tests;
