//! # Plate Mapping
//!
//! Experiment metadata for a microplate, keyed by position (the microscope
//! stage position a movie was recorded at). Each position maps to a row of
//! well, site and reagent annotations.
//!
//! ## File Format
//!
//! Mapping files are tab-separated with a fixed header:
//!
//! ```text
//! Position	Well	Site	Row	Column	Gene Symbol	OligoID	siRNA ID	Group
//! 0001	A01	1	A	1	PLK1	s449	s449	target
//! ```
//!
//! A mapping is created with the set of positions an experiment expects and
//! must have every one of them populated before it is used.

mod error;
mod mapping;
mod well;


pub use error::PlateError;
pub use mapping::{find_mapping_file, PlateMapping, PlateRecord, MAPPING_HEADER};
pub use well::WellId;
