use std::path::Path;

use super::*;
use crate::annotation::FrameMapping;
use crate::classes::{ClassDefinition, ClassDefinitions};
use crate::color::Rgb;

const GOOD_MAPPING: &str = "Position\tWell\tSite\tRow\tColumn\tGene Symbol\tOligoID\tsiRNA ID\tGroup
0001\tA01\t1\tA\t1\tPLK1\ts1\ts1\ttarget
0002\tA01\t2\tA\t1\tPLK1\ts1\ts1\ttarget";

const MARKERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CellCounter_Marker_File>
  <Marker_Data>
    <Marker_Type>
      <Type>1</Type>
      <Marker><MarkerX>1</MarkerX><MarkerY>2</MarkerY><MarkerZ>1</MarkerZ></Marker>
    </Marker_Type>
    <Marker_Type>
      <Type>7</Type>
      <Marker><MarkerX>3</MarkerX><MarkerY>4</MarkerY><MarkerZ>2</MarkerZ></Marker>
    </Marker_Type>
  </Marker_Data>
</CellCounter_Marker_File>"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_valid_mapping_passes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "plate.txt", GOOD_MAPPING);

    let report = validate_plate_mapping(&path, None);
    assert!(!report.has_failures(), "{}", report);
    assert!(!report.has_warnings(), "{}", report);
    assert!(report.to_string().contains("Validation PASSED"));
}

#[test]
fn test_missing_expected_position_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "plate.txt", GOOD_MAPPING);
    let expected = vec!["0001".to_string(), "0003".to_string()];

    let report = validate_plate_mapping(&path, Some(&expected));
    assert!(report.has_failures());
    let failed = report
        .checks
        .iter()
        .find(|c| c.name == "All expected positions mapped")
        .unwrap();
    assert_eq!(failed.status, CheckStatus::Failed("1 unset: 0003".to_string()));
    // 0002 is in the file but not expected
    assert!(report.has_warnings());
}

#[test]
fn test_inconsistent_wells_warn() {
    let data = "Position\tWell\tSite\tRow\tColumn\n0001\tA01\t1\tB\t1\n0002\tA01\t1\tA\t1\n0003\tXYZ\t1\t\t\n";
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "plate.txt", data);

    let report = validate_plate_mapping(&path, None);
    let status = |name: &str| {
        report
            .checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.status.clone())
            .unwrap()
    };
    assert!(matches!(status("Header complete"), CheckStatus::Warning(_)));
    assert!(matches!(status("Row/Column match well"), CheckStatus::Warning(_)));
    assert!(matches!(status("Well/site unique"), CheckStatus::Warning(_)));
    assert!(matches!(status("Well names valid"), CheckStatus::Failed(_)));
}

#[test]
fn test_blank_wells_warn() {
    let data = "Position\tWell\tSite\tRow\tColumn\tGene Symbol\tOligoID\tsiRNA ID\tGroup\n0001\t\t\t\t\t\t\t\t\n0002\tA01\t\t\t\t\t\t\t\n";
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "plate.txt", data);

    let report = validate_plate_mapping(&path, None);
    assert!(!report.has_failures(), "{}", report);
    let check = report
        .checks
        .iter()
        .find(|c| c.name == "Wells assigned")
        .unwrap();
    assert_eq!(check.status, CheckStatus::Warning("1 without well: 0001".to_string()));
}

#[test]
fn test_missing_mapping_file() {
    let report = validate_plate_mapping(Path::new("/nonexistent/plate.txt"), None);
    assert_eq!(report.checks.len(), 1);
    assert!(report.has_failures());
}

#[test]
fn test_annotation_with_undefined_class() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "PLplate1___P0001.xml", MARKERS);
    let classes: ClassDefinitions = [ClassDefinition::new(1, "interphase", Rgb::BLACK)]
        .into_iter()
        .collect();

    let report = validate_annotation(&path, Some(&classes), FrameMapping::default());
    assert!(report.has_failures());
    let check = report.checks.last().unwrap();
    assert_eq!(check.name, "Class labels defined");
    assert_eq!(check.status, CheckStatus::Failed("undefined labels: 7".to_string()));

    let report = validate_annotation(&path, None, FrameMapping::default());
    assert!(!report.has_failures(), "{}", report);
}

#[test]
fn test_annotation_wrong_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "markers.txt", MARKERS);
    let report = validate_annotation(&path, None, FrameMapping::default());
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].name, "File extension");
}

#[test]
fn test_report_serializes() {
    let mut report = ValidationReport::new("Plate Mapping", "x.txt");
    report.add_check(ValidationCheck::ok("a"));
    report.add_check(ValidationCheck::warning("b", "careful"));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["checks"][0]["status"]["result"], "ok");
    assert_eq!(json["checks"][1]["status"]["message"], "careful");
    assert_eq!(report.success_count(), 1);
    assert_eq!(report.warning_count(), 1);
}

#[test]
fn test_summarize_truncates() {
    let items = [1, 2, 3, 4];
    assert_eq!(summarize(&items, 2), "1, 2 (and 2 more)");
    assert_eq!(summarize(&items, 4), "1, 2, 3, 4");
}
