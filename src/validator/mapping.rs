use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{summarize, ValidationCheck, ValidationReport};
use crate::plate::{PlateMapping, MAPPING_HEADER};

/// Validate a plate mapping file
///
/// With `expected_positions`, the file must cover every one of them.
pub fn validate_plate_mapping(path: &Path, expected_positions: Option<&[String]>) -> ValidationReport {
    let mut report = ValidationReport::new("Plate Mapping", path.display().to_string());

    if !path.is_file() {
        report.add_check(ValidationCheck::failed(
            "File exists",
            format!("Not a file: {}", path.display()),
        ));
        return report;
    }
    report.add_check(ValidationCheck::ok("File exists"));

    check_header(path, &mut report);

    let mapping = match PlateMapping::from_tsv_file(path) {
        Ok(mapping) => {
            report.add_check(ValidationCheck::ok(format!(
                "Mapping parses ({} positions)",
                mapping.len()
            )));
            mapping
        }
        Err(e) => {
            report.add_check(ValidationCheck::failed("Mapping parses", e.to_string()));
            return report;
        }
    };

    if let Some(expected) = expected_positions {
        check_expected_positions(&mapping, expected, &mut report);
    }
    check_wells(&mapping, &mut report);

    report
}

fn check_header(path: &Path, report: &mut ValidationReport) {
    let first_line = File::open(path)
        .ok()
        .and_then(|f| BufReader::new(f).lines().next())
        .and_then(Result::ok)
        .unwrap_or_default();
    let columns: Vec<&str> = first_line.split('\t').map(str::trim).collect();

    let missing: Vec<&str> = MAPPING_HEADER
        .iter()
        .copied()
        .filter(|c| !columns.contains(c))
        .collect();

    if missing.is_empty() {
        report.add_check(ValidationCheck::ok("Header complete"));
    } else if missing.contains(&"Position") || missing.contains(&"Well") {
        report.add_check(ValidationCheck::failed(
            "Header complete",
            format!("missing columns: {}", summarize(&missing, 9)),
        ));
    } else {
        report.add_check(ValidationCheck::warning(
            "Header complete",
            format!("missing optional columns: {}", summarize(&missing, 9)),
        ));
    }
}

fn check_expected_positions(mapping: &PlateMapping, expected: &[String], report: &mut ValidationReport) {
    let missing: Vec<&String> = expected.iter().filter(|p| !mapping.contains(p)).collect();
    if missing.is_empty() {
        report.add_check(ValidationCheck::ok("All expected positions mapped"));
    } else {
        report.add_check(ValidationCheck::failed(
            "All expected positions mapped",
            format!("{} unset: {}", missing.len(), summarize(&missing, 10)),
        ));
    }

    let extra: Vec<&String> = mapping
        .positions()
        .iter()
        .filter(|p| !expected.contains(p))
        .collect();
    if !extra.is_empty() {
        report.add_check(ValidationCheck::warning(
            "No unexpected positions",
            format!("{} not expected: {}", extra.len(), summarize(&extra, 10)),
        ));
    }
}

fn check_wells(mapping: &PlateMapping, report: &mut ValidationReport) {
    let mut unassigned = Vec::new();
    let mut invalid = Vec::new();
    let mut inconsistent = Vec::new();
    let mut seen: HashMap<(String, Option<u32>), &str> = HashMap::new();
    let mut duplicates = Vec::new();

    for (position, record) in mapping.iter() {
        // Template files leave wells blank until the plate layout is known
        if record.well.is_empty() {
            unassigned.push(position.to_string());
            continue;
        }
        match record.well_id() {
            Ok(well) => {
                let row_mismatch = record.row.as_deref().is_some_and(|r| !r.eq_ignore_ascii_case(&well.row));
                let column_mismatch = record.column.is_some_and(|c| c != well.column);
                if row_mismatch || column_mismatch {
                    inconsistent.push(position.to_string());
                }
                if let Some(other) = seen.insert((well.to_string(), record.site), position) {
                    duplicates.push(format!("{}/{}", other, position));
                }
            }
            Err(_) => invalid.push(format!("{} ({:?})", position, record.well)),
        }
    }

    if !unassigned.is_empty() {
        report.add_check(ValidationCheck::warning(
            "Wells assigned",
            format!("{} without well: {}", unassigned.len(), summarize(&unassigned, 10)),
        ));
    }

    if invalid.is_empty() {
        report.add_check(ValidationCheck::ok("Well names valid"));
    } else {
        report.add_check(ValidationCheck::failed(
            "Well names valid",
            summarize(&invalid, 10),
        ));
    }

    if inconsistent.is_empty() {
        report.add_check(ValidationCheck::ok("Row/Column match well"));
    } else {
        report.add_check(ValidationCheck::warning(
            "Row/Column match well",
            format!("mismatch at {}", summarize(&inconsistent, 10)),
        ));
    }

    if duplicates.is_empty() {
        report.add_check(ValidationCheck::ok("Well/site unique"));
    } else {
        report.add_check(ValidationCheck::warning(
            "Well/site unique",
            format!("shared by {}", summarize(&duplicates, 10)),
        ));
    }
}
