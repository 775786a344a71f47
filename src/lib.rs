//! # cecog - Screening Metadata and Annotation Toolkit
//!
//! `cecog` handles the data that surrounds a time-lapse high-content screen:
//! which gene was knocked down at which plate position, where an annotator
//! marked mitotic cells in each movie, how frames relate to wall-clock time,
//! and how noisy per-frame classifications along a cell track are corrected.
//!
//! ## Key Features
//!
//! - **Plate mappings**: Tab-separated position → well/site/gene tables with a
//!   completeness check before use.
//!
//! - **Marker annotations**: Import of ImageJ Cell Counter XML files, grouped
//!   by frame and by plate/position.
//!
//! - **Class definitions**: Phenotype classes with labels, names and colours.
//!
//! - **Time conversion**: Frames, seconds, minutes and hours for a given
//!   time-lapse interval.
//!
//! - **Track smoothing**: Discrete HMMs with Baum-Welch fitting and Viterbi
//!   decoding to correct classification tracks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cecog::plate::PlateMapping;
//! use cecog::annotation::{AnnotationSet, FrameMapping};
//!
//! // Every position of the experiment must be mapped before analysis
//! let mut mapping = PlateMapping::new(["0001", "0002", "0003"]);
//! mapping.read_tsv_file("mappings/plate01.txt")?;
//! mapping.validate()?;
//!
//! let gene = mapping.get("0002")?.gene_symbol.clone();
//! println!("Position 0002 targets {:?}", gene);
//!
//! // Import manual annotations, one marker slice every 4 frames
//! let annotations = AnnotationSet::from_dir("annotations", FrameMapping::new(1, 4)?)?;
//! for (key, annotation) in annotations.iter() {
//!     println!("{}: {} markers", key, annotation.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`plate`]: Plate mapping reader/writer and well coordinates
//! - [`annotation`]: Marker file parsing and frame/position indexing
//! - [`classes`]: Class definition files
//! - [`color`]: Hex/RGB colour conversion
//! - [`time`]: Time-lapse unit conversion
//! - [`hmm`]: Discrete hidden Markov models for track error correction
//! - [`task`]: Background tasks with progress events and cancellation
//! - [`resources`]: Location of installed resource files
//! - [`validator`]: Validation reports for input files

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod annotation;
pub mod classes;
pub mod color;
pub mod hmm;
pub mod plate;
pub mod resources;
pub mod task;
pub mod time;
pub mod validator;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::annotation::{
        Annotation, AnnotationError, AnnotationKey, AnnotationSet, FrameMapping, Marker, MarkerFile,
    };
    pub use crate::classes::{ClassDefinition, ClassDefinitions, ClassError};
    pub use crate::color::{ColorError, Rgb};
    pub use crate::hmm::{DiscreteHmm, FitOptions, FitReport, HmmError};
    pub use crate::plate::{PlateError, PlateMapping, PlateRecord, WellId};
    pub use crate::resources::ResourceLocator;
    pub use crate::task::{TaskContext, TaskError, TaskEvent, TaskHandle};
    pub use crate::time::{TimeConverter, TimeUnit};
    pub use crate::validator::{validate_annotation, validate_plate_mapping, ValidationReport};
}
