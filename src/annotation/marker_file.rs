use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::AnnotationError;

/// One annotated point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker {
    /// Pixel column
    pub x: i32,
    /// Pixel row
    pub y: i32,
    /// 1-based stack slice (time point before frame mapping)
    pub z: u32,
    /// Counter type the marker was placed with
    pub class_label: i32,
}

/// Raw contents of a Cell Counter marker file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerFile {
    /// Image the markers were placed on, if recorded
    pub image_filename: Option<String>,
    /// All markers in file order
    pub markers: Vec<Marker>,
}

/// Element whose text content is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    ImageFilename,
    Type,
    X,
    Y,
    Z,
}

impl TextField {
    fn from_tag(tag: &[u8], in_marker: bool) -> Option<Self> {
        match (tag, in_marker) {
            (b"Image_Filename", _) => Some(TextField::ImageFilename),
            (b"Type", false) => Some(TextField::Type),
            (b"MarkerX", true) => Some(TextField::X),
            (b"MarkerY", true) => Some(TextField::Y),
            (b"MarkerZ", true) => Some(TextField::Z),
            _ => None,
        }
    }

    fn element(&self) -> &'static str {
        match self {
            TextField::ImageFilename => "Image_Filename",
            TextField::Type => "Type",
            TextField::X => "MarkerX",
            TextField::Y => "MarkerY",
            TextField::Z => "MarkerZ",
        }
    }
}

/// Coordinates collected for the `<Marker>` currently open
#[derive(Debug, Default)]
struct PendingMarker {
    x: Option<i32>,
    y: Option<i32>,
    z: Option<u32>,
}

impl MarkerFile {
    /// Parse a marker file; the path must exist and end in `.xml`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotationError> {
        let path = path.as_ref();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if !is_xml {
            return Err(AnnotationError::InvalidExtension(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(AnnotationError::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let parsed = Self::from_reader(BufReader::new(file))?;
        log::debug!(
            "Parsed {} markers from {}",
            parsed.markers.len(),
            path.display()
        );
        Ok(parsed)
    }

    /// Parse marker XML from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, AnnotationError> {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut result = MarkerFile::default();

        let mut current_type: Option<i32> = None;
        let mut pending: Option<PendingMarker> = None;
        let mut text_field: Option<TextField> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"Marker_Type" => current_type = None,
                    b"Marker" => pending = Some(PendingMarker::default()),
                    tag => text_field = TextField::from_tag(tag, pending.is_some()),
                },
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"Marker" {
                        return Err(AnnotationError::MissingElement("MarkerX".to_string()));
                    }
                }
                Event::Text(t) => {
                    if let Some(field) = text_field {
                        let text = t.unescape()?;
                        let text = text.trim();
                        match field {
                            TextField::ImageFilename => {
                                result.image_filename = Some(text.to_string());
                            }
                            TextField::Type => current_type = Some(parse_value(field, text)?),
                            TextField::X | TextField::Y | TextField::Z => {
                                if let Some(marker) = pending.as_mut() {
                                    match field {
                                        TextField::X => marker.x = Some(parse_value(field, text)?),
                                        TextField::Y => marker.y = Some(parse_value(field, text)?),
                                        _ => marker.z = Some(parse_value(field, text)?),
                                    }
                                }
                            }
                        }
                    }
                }
                Event::End(ref e) => {
                    text_field = None;
                    match e.name().as_ref() {
                        b"Marker" => {
                            if let Some(marker) = pending.take() {
                                result.markers.push(finish_marker(marker, current_type)?);
                            }
                        }
                        b"Marker_Type" => current_type = None,
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Distinct class labels in ascending order
    pub fn class_labels(&self) -> Vec<i32> {
        let mut labels: Vec<i32> = self.markers.iter().map(|m| m.class_label).collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }
}

fn parse_value<T: std::str::FromStr>(field: TextField, text: &str) -> Result<T, AnnotationError> {
    text.parse().map_err(|_| AnnotationError::InvalidValue {
        element: field.element().to_string(),
        value: text.to_string(),
    })
}

fn finish_marker(pending: PendingMarker, class_label: Option<i32>) -> Result<Marker, AnnotationError> {
    let missing = |name: &str| AnnotationError::MissingElement(name.to_string());

    let class_label = class_label.ok_or_else(|| missing("Type"))?;
    let x = pending.x.ok_or_else(|| missing("MarkerX"))?;
    let y = pending.y.ok_or_else(|| missing("MarkerY"))?;
    let z = pending.z.ok_or_else(|| missing("MarkerZ"))?;

    // Cell Counter slices are 1-based
    if z == 0 {
        return Err(AnnotationError::InvalidValue {
            element: "MarkerZ".to_string(),
            value: "0".to_string(),
        });
    }

    Ok(Marker { x, y, z, class_label })
}
