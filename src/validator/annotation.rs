use std::path::Path;

use super::{summarize, ValidationCheck, ValidationReport};
use crate::annotation::{Annotation, AnnotationError, AnnotationKey, FrameMapping, MarkerFile};
use crate::classes::ClassDefinitions;

/// Validate a marker annotation file
///
/// With `classes`, every marker type must be a defined class label.
pub fn validate_annotation(
    path: &Path,
    classes: Option<&ClassDefinitions>,
    mapping: FrameMapping,
) -> ValidationReport {
    let mut report = ValidationReport::new("Annotation", path.display().to_string());

    let file = match MarkerFile::from_file(path) {
        Ok(file) => {
            report.add_check(ValidationCheck::ok("Marker file parses"));
            file
        }
        Err(e @ AnnotationError::InvalidExtension(_)) => {
            report.add_check(ValidationCheck::failed("File extension", e.to_string()));
            return report;
        }
        Err(e @ AnnotationError::NotFound(_)) => {
            report.add_check(ValidationCheck::failed("File exists", e.to_string()));
            return report;
        }
        Err(e) => {
            report.add_check(ValidationCheck::failed("Marker file parses", e.to_string()));
            return report;
        }
    };

    match AnnotationKey::from_path(path) {
        Ok(key) => report.add_check(ValidationCheck::ok(format!("File name ({})", key))),
        Err(e) => report.add_check(ValidationCheck::warning("File name", e.to_string())),
    }

    let annotation = Annotation::from_markers(&file.markers, mapping);
    if annotation.is_empty() {
        report.add_check(ValidationCheck::warning("Markers present", "file contains no markers"));
    } else {
        report.add_check(ValidationCheck::ok(format!(
            "Markers present ({} in {} frames)",
            annotation.len(),
            annotation.frames().count()
        )));
    }

    if let Some(classes) = classes {
        let undefined = annotation.undefined_labels(classes);
        if undefined.is_empty() {
            report.add_check(ValidationCheck::ok("Class labels defined"));
        } else {
            report.add_check(ValidationCheck::failed(
                "Class labels defined",
                format!("undefined labels: {}", summarize(&undefined, 10)),
            ));
        }
    }

    report
}
