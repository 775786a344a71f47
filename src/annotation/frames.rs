use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AnnotationError, Marker};
use crate::classes::ClassDefinitions;

/// Maps marker stack slices to movie frames
///
/// Annotation stacks are often sub-sampled from the movie: slice `z` (1-based)
/// corresponds to frame `first_frame + (z - 1) * step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMapping {
    first_frame: u32,
    step: u32,
}

impl Default for FrameMapping {
    fn default() -> Self {
        Self {
            first_frame: 1,
            step: 1,
        }
    }
}

impl FrameMapping {
    /// Create a mapping; `step` must be at least 1
    pub fn new(first_frame: u32, step: u32) -> Result<Self, AnnotationError> {
        if step == 0 {
            return Err(AnnotationError::InvalidFrameMapping(
                "frame step must be at least 1".to_string(),
            ));
        }
        Ok(Self { first_frame, step })
    }

    /// Frame of the first stack slice
    pub fn first_frame(&self) -> u32 {
        self.first_frame
    }

    /// Frames between two consecutive slices
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Frame for a 1-based slice index
    pub fn frame_for(&self, z: u32) -> u32 {
        self.first_frame
            .saturating_add(z.saturating_sub(1).saturating_mul(self.step))
    }
}

/// Markers grouped by frame, in ascending frame order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    frames: BTreeMap<u32, Vec<Marker>>,
}

impl Annotation {
    /// Group markers by the frame their slice maps to
    pub fn from_markers<'a, I>(markers: I, mapping: FrameMapping) -> Self
    where
        I: IntoIterator<Item = &'a Marker>,
    {
        let mut annotation = Self::default();
        for marker in markers {
            annotation.insert(mapping.frame_for(marker.z), *marker);
        }
        annotation
    }

    /// Add a marker at `frame`
    pub fn insert(&mut self, frame: u32, marker: Marker) {
        self.frames.entry(frame).or_default().push(marker);
    }

    /// Move every marker of `other` into this annotation
    pub fn merge(&mut self, other: Annotation) {
        for (frame, markers) in other.frames {
            self.frames.entry(frame).or_default().extend(markers);
        }
    }

    /// Annotated frames in ascending order
    pub fn frames(&self) -> impl Iterator<Item = u32> + '_ {
        self.frames.keys().copied()
    }

    /// Markers placed at `frame`
    pub fn markers_at(&self, frame: u32) -> &[Marker] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over `(frame, markers)` in frame order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Marker])> {
        self.frames.iter().map(|(f, m)| (*f, m.as_slice()))
    }

    /// Total number of markers
    pub fn len(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// True when no marker is present
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Marker count per class label
    pub fn count_by_class(&self) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for marker in self.frames.values().flatten() {
            *counts.entry(marker.class_label).or_insert(0) += 1;
        }
        counts
    }

    /// Class labels used by markers but absent from `classes`
    pub fn undefined_labels(&self, classes: &ClassDefinitions) -> Vec<i32> {
        self.count_by_class()
            .into_keys()
            .filter(|label| classes.by_label(*label).is_none())
            .collect()
    }
}
