//! # Class Definitions
//!
//! The set of phenotype classes a classifier or annotator works with. Each class
//! has a numeric label (the marker type in annotation files), a name and a
//! display colour.
//!
//! Definitions are stored as tab-separated text:
//!
//! ```text
//! Label	Name	Color
//! 1	interphase	#00ff00
//! 2	prometaphase	#ff8000
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Errors that can occur while handling class definitions
#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    /// I/O error reading or writing a definition file
    #[error("Failed to access class definition file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error (including invalid colours)
    #[error("TSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Definition file does not exist
    #[error("Class definition file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Two classes share a label
    #[error("Duplicate class label: {0}")]
    DuplicateLabel(i32),

    /// Two classes share a name
    #[error("Duplicate class name: {0}")]
    DuplicateName(String),
}

/// A single phenotype class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// Numeric label
    #[serde(rename = "Label")]
    pub label: i32,
    /// Human-readable name
    #[serde(rename = "Name")]
    pub name: String,
    /// Display colour
    #[serde(rename = "Color")]
    pub color: Rgb,
}

impl ClassDefinition {
    /// Create a definition
    pub fn new(label: i32, name: &str, color: Rgb) -> Self {
        Self {
            label,
            name: name.to_string(),
            color,
        }
    }
}

/// Ordered collection of classes with unique labels and names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinitions {
    classes: Vec<ClassDefinition>,
}

impl ClassDefinitions {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Read definitions from a TSV file
    pub fn from_tsv_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ClassError::NotFound(path.to_path_buf()));
        }
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Read definitions from TSV data
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ClassError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut definitions = Self::new();
        for class in csv_reader.deserialize::<ClassDefinition>() {
            definitions.push(class?)?;
        }
        Ok(definitions)
    }

    /// Write definitions as TSV
    pub fn write_tsv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ClassError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Write definitions as TSV to any writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ClassError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(["Label", "Name", "Color"])?;
        for class in &self.classes {
            csv_writer.serialize(class)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Append a class, rejecting duplicate labels or names
    pub fn push(&mut self, class: ClassDefinition) -> Result<(), ClassError> {
        if self.by_label(class.label).is_some() {
            return Err(ClassError::DuplicateLabel(class.label));
        }
        if self.by_name(&class.name).is_some() {
            return Err(ClassError::DuplicateName(class.name));
        }
        self.classes.push(class);
        Ok(())
    }

    /// Class with the given label
    pub fn by_label(&self, label: i32) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.label == label)
    }

    /// Class with the given name
    pub fn by_name(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Name for a label, or the label itself if undefined
    pub fn name_for(&self, label: i32) -> String {
        self.by_label(label)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| label.to_string())
    }

    /// Labels in definition order
    pub fn labels(&self) -> Vec<i32> {
        self.classes.iter().map(|c| c.label).collect()
    }

    /// Position of a label in definition order (the HMM state index)
    pub fn index_of(&self, label: i32) -> Option<usize> {
        self.classes.iter().position(|c| c.label == label)
    }

    /// Iterate in definition order
    pub fn iter(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.iter()
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when no class is defined
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Labels from `labels` that are not defined here
    pub fn undefined<'a, I>(&self, labels: I) -> Vec<i32>
    where
        I: IntoIterator<Item = &'a i32>,
    {
        let mut seen = HashSet::new();
        labels
            .into_iter()
            .copied()
            .filter(|l| self.by_label(*l).is_none() && seen.insert(*l))
            .collect()
    }
}

impl FromIterator<ClassDefinition> for ClassDefinitions {
    /// Later duplicates are dropped
    fn from_iter<T: IntoIterator<Item = ClassDefinition>>(iter: T) -> Self {
        let mut definitions = Self::new();
        for class in iter {
            let _ = definitions.push(class);
        }
        definitions
    }
}
