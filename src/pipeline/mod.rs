//! Pipeline module sequencing the harvest stages
//!
//! Collect, download, parse and import run one after another; within the
//! download and parse stages items are processed concurrently.

mod coordinator;

pub use coordinator::{harvest, Coordinator};
