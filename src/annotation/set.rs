use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{Annotation, AnnotationError, FrameMapping, MarkerFile};

/// Separator between the parts of an annotation file name
const NAME_SEPARATOR: &str = "___";

/// Plate and position an annotation file belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationKey {
    /// Plate identifier (without the `PL` prefix)
    pub plate: String,
    /// Position identifier (without the `P` prefix)
    pub position: String,
}

impl AnnotationKey {
    /// Create a key
    pub fn new(plate: &str, position: &str) -> Self {
        Self {
            plate: plate.to_string(),
            position: position.to_string(),
        }
    }

    /// Derive the key from a file name like `PLplate1___P0037___T00001.xml`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AnnotationError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AnnotationError::InvalidFilename(path.display().to_string()))?;

        let mut parts = stem.split(NAME_SEPARATOR);
        let plate = parts.next().and_then(|p| p.strip_prefix("PL"));
        let position = parts.next().and_then(|p| p.strip_prefix('P'));

        match (plate, position) {
            (Some(plate), Some(position)) if !plate.is_empty() && !position.is_empty() => {
                Ok(Self::new(plate, position))
            }
            _ => Err(AnnotationError::InvalidFilename(stem.to_string())),
        }
    }

    /// Canonical file name for this key
    pub fn file_name(&self) -> String {
        format!("PL{}{}P{}.xml", self.plate, NAME_SEPARATOR, self.position)
    }
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plate, self.position)
    }
}

/// Annotations of a whole screen, keyed by plate and position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    annotations: BTreeMap<AnnotationKey, Annotation>,
}

impl AnnotationSet {
    /// Import every `PL*___P*.xml` marker file in `dir`
    ///
    /// Files whose names do not follow the pattern are skipped. Several files
    /// for the same plate and position are merged.
    pub fn from_dir<P: AsRef<Path>>(dir: P, mapping: FrameMapping) -> Result<Self, AnnotationError> {
        Self::from_dir_with(dir, mapping, |_, _, _| Ok(()))
    }

    /// [`from_dir`](Self::from_dir), calling `on_file(done, total, path)`
    /// after each xml file
    ///
    /// `total` counts every xml file in the directory, skipped ones included.
    /// An error from the callback (usually [`AnnotationError::Cancelled`])
    /// ends the import.
    pub fn from_dir_with<P, F>(dir: P, mapping: FrameMapping, mut on_file: F) -> Result<Self, AnnotationError>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize, &Path) -> Result<(), AnnotationError>,
    {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AnnotationError::NotFound(dir.to_path_buf()));
        }

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
            })
            .collect();
        paths.sort();

        let total = paths.len();
        let mut set = Self::default();
        for (i, path) in paths.iter().enumerate() {
            match AnnotationKey::from_path(path) {
                Ok(key) => {
                    let file = MarkerFile::from_file(path)?;
                    set.insert(key, Annotation::from_markers(&file.markers, mapping));
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
            on_file(i + 1, total, path)?;
        }

        info!(
            "Imported annotations for {} position(s) ({} markers) from {}",
            set.len(),
            set.marker_count(),
            dir.display()
        );
        Ok(set)
    }

    /// Add (or merge) the annotation for `key`
    pub fn insert(&mut self, key: AnnotationKey, annotation: Annotation) {
        self.annotations.entry(key).or_default().merge(annotation);
    }

    /// Annotation for a plate and position
    pub fn get(&self, plate: &str, position: &str) -> Option<&Annotation> {
        self.annotations.get(&AnnotationKey::new(plate, position))
    }

    /// Iterate in plate/position order
    pub fn iter(&self) -> impl Iterator<Item = (&AnnotationKey, &Annotation)> {
        self.annotations.iter()
    }

    /// Number of annotated positions
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// True when nothing was imported
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Markers over all positions
    pub fn marker_count(&self) -> usize {
        self.annotations.values().map(Annotation::len).sum()
    }

    /// Positions annotated on `plate`
    pub fn positions(&self, plate: &str) -> Vec<&str> {
        self.annotations
            .keys()
            .filter(|k| k.plate == plate)
            .map(|k| k.position.as_str())
            .collect()
    }
}
