//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `TraversalState`: where the level-by-level crawl currently is
//! - `DoneReason`: which terminal condition ended the crawl

mod traversal;

pub use traversal::{DoneReason, TraversalState};
