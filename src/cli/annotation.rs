use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use cecog::annotation::{Annotation, AnnotationError, AnnotationKey, AnnotationSet, FrameMapping, MarkerFile};
use cecog::classes::ClassDefinitions;
use cecog::task::{self, TaskError, TaskEvent};
use cecog::validator::validate_annotation;

use super::mapping::print_report;

fn load_classes(path: Option<&Path>) -> Result<Option<ClassDefinitions>> {
    path.map(|path| {
        ClassDefinitions::from_tsv_file(path)
            .with_context(|| format!("Failed to read class definitions: {}", path.display()))
    })
    .transpose()
}

fn class_name(classes: Option<&ClassDefinitions>, label: i32) -> String {
    match classes {
        Some(classes) => classes.name_for(label),
        None => label.to_string(),
    }
}

/// Print the markers of one file grouped by frame
pub fn show(file: PathBuf, classes: Option<PathBuf>, frames: FrameMapping, json: bool) -> Result<()> {
    let classes = load_classes(classes.as_deref())?;
    let marker_file = MarkerFile::from_file(&file)
        .with_context(|| format!("Failed to read marker file: {}", file.display()))?;
    let annotation = Annotation::from_markers(&marker_file.markers, frames);

    if json {
        println!("{}", serde_json::to_string_pretty(&annotation)?);
        return Ok(());
    }

    println!("Annotation: {}", file.display());
    if let Ok(key) = AnnotationKey::from_path(&file) {
        println!("Plate/Position: {}", key);
    }
    if let Some(image) = &marker_file.image_filename {
        println!("Image: {}", image);
    }
    println!("Markers: {}", annotation.len());
    println!();

    for (frame, markers) in annotation.iter() {
        println!("Frame {}:", frame);
        for marker in markers {
            println!(
                "  ({:>5}, {:>5})  {}",
                marker.x,
                marker.y,
                class_name(classes.as_ref(), marker.class_label)
            );
        }
    }

    if let Some(classes) = &classes {
        let undefined = annotation.undefined_labels(classes);
        if !undefined.is_empty() {
            warn!("Labels without a class definition: {:?}", undefined);
        }
    }

    Ok(())
}

/// Validate one annotation file
pub fn validate(file: PathBuf, classes: Option<PathBuf>, frames: FrameMapping, json: bool) -> Result<()> {
    info!("Annotation Validator");
    info!("File: {}", file.display());

    let classes = load_classes(classes.as_deref())?;
    let report = validate_annotation(&file, classes.as_ref(), frames);
    print_report(&report, json)?;

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Import a directory of annotation files on a worker thread
pub fn import(dir: PathBuf, classes: Option<PathBuf>, frames: FrameMapping) -> Result<()> {
    let classes = load_classes(classes.as_deref())?;

    info!("Importing annotations from {}", dir.display());

    let handle = task::spawn("import", move |ctx| {
        ctx.log(log::Level::Info, format!("Scanning {}", dir.display()));
        AnnotationSet::from_dir_with(&dir, frames, |done, total, path| {
            ctx.progress(done, total, path.display().to_string());
            if ctx.is_aborted() {
                return Err(AnnotationError::Cancelled);
            }
            Ok(())
        })
        .map_err(|e| match e {
            AnnotationError::Cancelled => TaskError::Aborted,
            e => TaskError::failed(e),
        })
    })?;

    for event in handle.events() {
        if task::relay_log("import", &event) {
            continue;
        }
        match event {
            TaskEvent::Progress { done, total, message } => {
                info!("[{}/{}] {}", done, total, message);
            }
            TaskEvent::Finished | TaskEvent::Failed(_) => break,
            TaskEvent::Log { .. } => {}
        }
    }

    let set = handle.join().context("Annotation import failed")?;

    println!("Imported {} positions, {} markers", set.len(), set.marker_count());
    println!();
    for (key, annotation) in set.iter() {
        let counts = annotation
            .count_by_class()
            .into_iter()
            .map(|(label, count)| format!("{}={}", class_name(classes.as_ref(), label), count))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<20} frames: {:>3}  markers: {:>4}  [{}]",
            key.to_string(),
            annotation.frames().count(),
            annotation.len(),
            counts
        );
    }

    if let Some(classes) = &classes {
        for (key, annotation) in set.iter() {
            let undefined = annotation.undefined_labels(classes);
            if !undefined.is_empty() {
                warn!("{}: labels without a class definition: {:?}", key, undefined);
            }
        }
    }

    Ok(())
}
