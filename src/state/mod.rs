//! State module for tracking run progress
//!
//! # Components
//!
//! - `VisitedRegistry`: directory names already produced in the current run

mod visited;

pub use visited::{Claim, VisitedRegistry};
