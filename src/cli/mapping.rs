use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use cecog::plate::{find_mapping_file, PlateMapping, PlateRecord};
use cecog::validator::{validate_plate_mapping, ValidationReport};

/// Validate a plate mapping file
pub fn validate(file: PathBuf, positions: Vec<String>, json: bool) -> Result<()> {
    info!("Plate Mapping Validator");
    info!("File: {}", file.display());

    let expected = (!positions.is_empty()).then_some(positions.as_slice());
    let report = validate_plate_mapping(&file, expected);
    print_report(&report, json)?;

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

/// Print all records of a mapping file, resolving a plate id when a mapping
/// directory is known
pub fn show(file: PathBuf, mapping_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let path = match mapping_dir {
        Some(dir) if !file.exists() => {
            let plate = file.to_string_lossy();
            find_mapping_file(&dir, &plate)
                .with_context(|| format!("No mapping for plate '{}' in {}", plate, dir.display()))?
        }
        _ => file,
    };

    let mapping = PlateMapping::from_tsv_file(&path)
        .with_context(|| format!("Failed to read mapping: {}", path.display()))?;

    if json {
        let records: Vec<_> = mapping
            .iter()
            .map(|(position, record)| serde_json::json!({ "position": position, "record": record }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("Plate Mapping: {}", path.display());
    println!("Positions: {}", mapping.len());
    println!();
    println!(
        "{:<10} {:<6} {:>4}  {:<12} {:<10}",
        "Position", "Well", "Site", "Gene", "Group"
    );
    for (position, record) in mapping.iter() {
        println!(
            "{:<10} {:<6} {:>4}  {:<12} {:<10}",
            position,
            record.well,
            record.site.map(|s| s.to_string()).unwrap_or_default(),
            record.gene_symbol.as_deref().unwrap_or("-"),
            record.group.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

/// Write a mapping skeleton with one record per position
pub fn template(output: PathBuf, positions: Vec<String>, wells: Vec<String>) -> Result<()> {
    if !wells.is_empty() && wells.len() != positions.len() {
        anyhow::bail!(
            "Got {} wells for {} positions; pass one well per position",
            wells.len(),
            positions.len()
        );
    }

    let mut mapping = PlateMapping::new(&positions);
    if mapping.len() != positions.len() {
        anyhow::bail!("Position list contains duplicates");
    }

    for (i, position) in mapping.positions().to_vec().iter().enumerate() {
        let record = match wells.get(i) {
            Some(well) => PlateRecord::from_well(well)
                .with_context(|| format!("Invalid well for position {}", position))?,
            None => PlateRecord::new(""),
        };
        mapping.set(position, record)?;
    }

    mapping
        .write_tsv_file(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} positions to {}", mapping.len(), output.display());
    Ok(())
}

pub(super) fn print_report(report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    #[cfg(feature = "colorized_output")]
    {
        println!("{}", report.format_colored());
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("{}", report);
    }

    Ok(())
}
