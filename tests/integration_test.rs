//! Integration tests for cecog
//!
//! These tests run whole workflows through the public API: writing and
//! re-reading mappings, importing an annotation directory, validating files
//! and correcting tracks.

use cecog::prelude::*;
use cecog::task;
use std::fs;
use tempfile::tempdir;

const CLASSES: &str = "Label\tName\tColor
1\tinterphase\t#00ff00
2\tprometaphase\t#ff8000
3\tapoptosis\t#ff0000
";

fn marker_xml(markers: &[(i32, i32, u32, i32)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<CellCounter_Marker_File>\n  <Marker_Data>\n",
    );
    let mut labels: Vec<i32> = markers.iter().map(|m| m.3).collect();
    labels.sort_unstable();
    labels.dedup();
    for label in labels {
        xml.push_str(&format!("    <Marker_Type>\n      <Type>{}</Type>\n", label));
        for &(x, y, z, _) in markers.iter().filter(|m| m.3 == label) {
            xml.push_str(&format!(
                "      <Marker><MarkerX>{}</MarkerX><MarkerY>{}</MarkerY><MarkerZ>{}</MarkerZ></Marker>\n",
                x, y, z
            ));
        }
        xml.push_str("    </Marker_Type>\n");
    }
    xml.push_str("  </Marker_Data>\n</CellCounter_Marker_File>\n");
    xml
}

/// Build a mapping, write it, and read it back into a fresh mapping
#[test]
fn test_mapping_write_read_cycle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plate01.txt");

    let positions = ["0001", "0002", "0003"];
    let mut mapping = PlateMapping::new(positions);

    // Writing an incomplete mapping is refused
    assert!(matches!(
        mapping.write_tsv_file(&path),
        Err(PlateError::Incomplete { .. })
    ));

    for (i, position) in positions.iter().enumerate() {
        let mut record = PlateRecord::from_well(&format!("B{:02}", i + 1)).unwrap();
        record.site = Some(1);
        record.gene_symbol = Some(if i == 0 { "scrambled" } else { "PLK1" }.to_string());
        record.group = Some(if i == 0 { "control" } else { "target" }.to_string());
        mapping.set(position, record).unwrap();
    }
    mapping.write_tsv_file(&path).unwrap();

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("Position\tWell\tSite\tRow\tColumn\tGene Symbol"));

    let mut reread = PlateMapping::new(positions);
    assert_eq!(reread.read_tsv_file(&path).unwrap(), 3);
    reread.validate().unwrap();
    assert_eq!(reread, mapping);
    assert_eq!(reread.positions_in_group("target"), vec!["0002", "0003"]);
    assert_eq!(reread.get("0003").unwrap().well_id().unwrap().to_string(), "B03");

    // A subset mapping only picks up its own positions
    let mut subset = PlateMapping::new(["0002", "0009"]);
    assert_eq!(subset.read_tsv_file(&path).unwrap(), 1);
    assert_eq!(subset.missing_positions(), vec!["0009".to_string()]);
    assert!(subset.validate().is_err());
}

/// Mapping files are looked up by plate id in a mapping directory
#[test]
fn test_find_mapping_by_plate() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("plate07.tsv"),
        "Position\tWell\n0001\tA01\n",
    )
    .unwrap();

    let path = cecog::plate::find_mapping_file(dir.path(), "plate07").unwrap();
    let mapping = PlateMapping::from_tsv_file(&path).unwrap();
    assert_eq!(mapping.positions(), ["0001".to_string()]);
    assert!(cecog::plate::find_mapping_file(dir.path(), "plate08").is_err());
}

/// Import an annotation directory and check per-class counts against the
/// class definitions
#[test]
fn test_annotation_import_with_classes() {
    let dir = tempdir().unwrap();
    let classes = ClassDefinitions::from_reader(CLASSES.as_bytes()).unwrap();

    fs::write(
        dir.path().join("PLplate1___P0001.xml"),
        marker_xml(&[(10, 10, 1, 1), (20, 20, 2, 2), (30, 30, 2, 2)]),
    )
    .unwrap();
    fs::write(
        dir.path().join("PLplate1___P0002.xml"),
        marker_xml(&[(5, 5, 3, 3), (6, 6, 3, 4)]),
    )
    .unwrap();

    let mapping = FrameMapping::new(1, 4).unwrap();
    let set = AnnotationSet::from_dir(dir.path(), mapping).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.marker_count(), 5);

    let first = set.get("plate1", "0001").unwrap();
    assert_eq!(first.frames().collect::<Vec<_>>(), vec![1, 5]);
    assert_eq!(first.count_by_class().get(&2), Some(&2));
    assert!(first.undefined_labels(&classes).is_empty());

    let second = set.get("plate1", "0002").unwrap();
    assert_eq!(second.markers_at(9).len(), 2);
    assert_eq!(second.undefined_labels(&classes), vec![4]);
    assert_eq!(classes.name_for(3), "apoptosis");
}

/// The validators report problems instead of failing
#[test]
fn test_validation_reports() {
    let dir = tempdir().unwrap();
    let mapping_path = dir.path().join("plate.txt");
    fs::write(
        &mapping_path,
        "Position\tWell\tSite\tRow\tColumn\tGene Symbol\tOligoID\tsiRNA ID\tGroup\n\
         0001\tA01\t1\tA\t1\tPLK1\to1\ts1\ttarget\n",
    )
    .unwrap();

    let expected = vec!["0001".to_string()];
    let report = validate_plate_mapping(&mapping_path, Some(&expected));
    assert!(!report.has_failures(), "{}", report);

    let expected = vec!["0001".to_string(), "0002".to_string()];
    let report = validate_plate_mapping(&mapping_path, Some(&expected));
    assert!(report.has_failures());
    assert!(report.to_string().contains("Validation FAILED"));

    let xml_path = dir.path().join("PLplate1___P0001.xml");
    fs::write(&xml_path, marker_xml(&[(1, 1, 1, 1), (2, 2, 1, 5)])).unwrap();
    let classes = ClassDefinitions::from_reader(CLASSES.as_bytes()).unwrap();
    let report = validate_annotation(&xml_path, Some(&classes), FrameMapping::default());
    assert!(report.has_failures());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kind"], "Annotation");
}

/// Correct a noisy classification track with a model estimated from clean
/// tracks
#[test]
fn test_track_correction() {
    let clean: Vec<Vec<usize>> = (0..20)
        .map(|i| {
            let mut track = vec![0; 6 + i % 3];
            track.extend(vec![1; 3]);
            track.extend(vec![2; 4]);
            track
        })
        .collect();

    let model = DiscreteHmm::estimate_from_labels(&clean, 3, 0.8, 0.0).unwrap();

    // A single misclassified frame inside a phase is smoothed away
    let noisy = vec![0, 0, 0, 2, 0, 0, 1, 1, 1, 2, 2, 2];
    let corrected = model.smooth(&noisy).unwrap();
    assert_eq!(corrected, vec![0, 0, 0, 0, 0, 0, 1, 1, 1, 2, 2, 2]);

    // Fitting on unlabelled tracks keeps impossible transitions impossible
    let mut fitted = model.clone();
    let report = fitted.fit(&clean, &FitOptions::default()).unwrap();
    assert!(report.iterations >= 1);
    assert_eq!(fitted.transition(2, 0), 0.0);
    assert_eq!(fitted.transition(1, 0), 0.0);
}

/// Run a background task to completion and collect its events
#[test]
fn test_background_import_task() {
    let dir = tempdir().unwrap();
    for position in ["0001", "0002", "0003"] {
        fs::write(
            dir.path().join(format!("PLp___P{}.xml", position)),
            marker_xml(&[(1, 1, 1, 1)]),
        )
        .unwrap();
    }

    let path = dir.path().to_path_buf();
    let handle = task::spawn("import", move |ctx| {
        let set = AnnotationSet::from_dir_with(&path, FrameMapping::default(), |done, total, file| {
            ctx.progress(done, total, file.display().to_string());
            Ok(())
        })
        .map_err(TaskError::failed)?;
        Ok(set.len())
    })
    .unwrap();

    let events: Vec<TaskEvent> = handle.events().collect();
    assert!(matches!(events.last(), Some(TaskEvent::Finished)));
    let progress: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|e| match e {
            TaskEvent::Progress { done, total, .. } => Some((*done, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(handle.join().unwrap(), 3);
}

#[test]
fn test_abort_stops_import_midway() {
    let dir = tempdir().unwrap();
    for position in ["0001", "0002", "0003"] {
        fs::write(
            dir.path().join(format!("PLp___P{}.xml", position)),
            marker_xml(&[(1, 1, 1, 1)]),
        )
        .unwrap();
    }

    // The worker waits after its first file until the test has aborted it
    let (release, gate) = crossbeam_channel::bounded::<()>(0);
    let path = dir.path().to_path_buf();
    let handle = task::spawn("import", move |ctx| {
        AnnotationSet::from_dir_with(&path, FrameMapping::default(), |done, total, file| {
            ctx.progress(done, total, file.display().to_string());
            let _ = gate.recv();
            if ctx.is_aborted() {
                return Err(AnnotationError::Cancelled);
            }
            Ok(())
        })
        .map_err(|e| match e {
            AnnotationError::Cancelled => TaskError::Aborted,
            e => TaskError::failed(e),
        })
    })
    .unwrap();

    let first = handle.events().next();
    assert!(matches!(first, Some(TaskEvent::Progress { done: 1, .. })));
    handle.abort();
    release.send(()).unwrap();

    let rest: Vec<TaskEvent> = handle.events().collect();
    assert!(!rest.iter().any(|e| matches!(e, TaskEvent::Progress { .. })));
    assert!(matches!(rest.last(), Some(TaskEvent::Failed(_))));
    assert!(matches!(handle.join(), Err(TaskError::Aborted)));
}

/// Frames, wall-clock time and colours used for plot axes and legends
#[test]
fn test_time_axis_and_colors() {
    let converter = TimeConverter::new(270.0).unwrap();
    let hours = converter.convert_all(&[0.0, 40.0, 80.0], TimeUnit::Frames, TimeUnit::Hours);
    assert_eq!(hours, vec![0.0, 3.0, 6.0]);
    assert_eq!(converter.frame_at(3.0 * 3600.0), 40);

    let classes = ClassDefinitions::from_reader(CLASSES.as_bytes()).unwrap();
    let colors: Vec<String> = classes.iter().map(|c| c.color.to_hex()).collect();
    assert_eq!(colors, vec!["#00ff00", "#ff8000", "#ff0000"]);
    assert_eq!("#FF8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
}
