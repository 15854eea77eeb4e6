//! Core types and trait definitions for the exam-score record store.
//!
//! This crate is deliberately free of IO. The codec, the in-memory store, the
//! cache loader and the analytics engine all depend on it.

pub mod audit;
pub mod change;
pub mod error;
pub mod province;
pub mod record;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
