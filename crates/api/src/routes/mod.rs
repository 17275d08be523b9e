//! Route handlers grouped by resource.

pub mod catalog;
pub mod orders;
pub mod quotes;
pub mod system;
