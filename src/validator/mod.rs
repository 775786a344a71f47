//! # Input File Validation
//!
//! Checks plate mapping and annotation files before an analysis run and
//! collects every problem into a [`ValidationReport`] instead of stopping at
//! the first one.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cecog::validator::validate_plate_mapping;
//! use std::path::Path;
//!
//! let report = validate_plate_mapping(Path::new("plate01.txt"), None);
//! println!("{}", report);
//! if report.has_failures() {
//!     std::process::exit(1);
//! }
//! ```

pub use report::{CheckStatus, ValidationCheck, ValidationReport};

mod annotation;
mod mapping;
mod report;

#[cfg(test)]
mod tests;

pub use annotation::validate_annotation;
pub use mapping::validate_plate_mapping;

/// Join at most `limit` items for a check message
pub(crate) fn summarize<T: std::fmt::Display>(items: &[T], limit: usize) -> String {
    let shown: Vec<String> = items.iter().take(limit).map(|i| i.to_string()).collect();
    if items.len() > limit {
        format!("{} (and {} more)", shown.join(", "), items.len() - limit)
    } else {
        shown.join(", ")
    }
}
