//! Data cleaning and chart views for exam scores.
//!
//! [`clean`] turns raw dataset rows plus the province reference into
//! [`CleanedRecord`](exam_core::record::CleanedRecord)s. The functions in
//! [`charts`] compute serialisable chart payloads from either cleaned records
//! or live store records. Nothing here performs IO or touches the audit log.

pub mod charts;
mod clean;
pub mod error;
pub mod group;
pub mod stats;

pub use charts::{area, bar, heatmap, histogram, line, pass_fail, scatter};
pub use clean::{clean, clean_against, clean_frames};
pub use error::{Error, Result};
pub use group::Group;
