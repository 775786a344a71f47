//! # Marker Annotation Import
//!
//! Reads manual annotations exported by the ImageJ *Cell Counter* plugin and
//! indexes them by time point. An annotator clicks cells in a time-lapse stack;
//! each click becomes a marker with a class label (the counter type) and x/y/z
//! coordinates, where z is the 1-based slice of the stack.
//!
//! ## File Format
//!
//! ```xml
//! <CellCounter_Marker_File>
//!   <Image_Properties>
//!     <Image_Filename>movie.tif</Image_Filename>
//!   </Image_Properties>
//!   <Marker_Data>
//!     <Current_Type>1</Current_Type>
//!     <Marker_Type>
//!       <Type>1</Type>
//!       <Marker>
//!         <MarkerX>120</MarkerX>
//!         <MarkerY>84</MarkerY>
//!         <MarkerZ>3</MarkerZ>
//!       </Marker>
//!     </Marker_Type>
//!   </Marker_Data>
//! </CellCounter_Marker_File>
//! ```
//!
//! Annotation files for a screen are named `PL<plate>___P<position>.xml`
//! (optionally with further `___`-separated parts) so a directory of them can
//! be imported as an [`AnnotationSet`] keyed by plate and position.

mod error;
mod frames;
mod marker_file;
mod set;


pub use error::AnnotationError;
pub use frames::{Annotation, FrameMapping};
pub use marker_file::{Marker, MarkerFile};
pub use set::{AnnotationKey, AnnotationSet};
