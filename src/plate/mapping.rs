use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{PlateError, WellId};

/// Column names of a mapping file, in file order
pub const MAPPING_HEADER: [&str; 9] = [
    "Position",
    "Well",
    "Site",
    "Row",
    "Column",
    "Gene Symbol",
    "OligoID",
    "siRNA ID",
    "Group",
];

/// File extensions tried by [`find_mapping_file`], in order
const MAPPING_EXTENSIONS: [&str; 3] = ["txt", "tsv", "csv"];

/// Metadata for one plate position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateRecord {
    /// Well name (e.g. "A01")
    pub well: String,

    /// Imaging site within the well
    pub site: Option<u32>,

    /// Plate row label
    pub row: Option<String>,

    /// Plate column number
    pub column: Option<u32>,

    /// Targeted gene
    pub gene_symbol: Option<String>,

    /// Oligo identifier
    pub oligo_id: Option<String>,

    /// siRNA identifier
    pub sirna_id: Option<String>,

    /// Experimental group (e.g. "control", "target")
    pub group: Option<String>,
}

impl PlateRecord {
    /// Create a record for a well with all optional fields unset
    pub fn new(well: &str) -> Self {
        Self {
            well: well.trim().to_string(),
            ..Default::default()
        }
    }

    /// The record as a mapping file stores it: values trimmed, blank
    /// optional fields unset
    pub fn normalized(self) -> Self {
        Self {
            well: self.well.trim().to_string(),
            site: self.site,
            row: normalize_field(self.row),
            column: self.column,
            gene_symbol: normalize_field(self.gene_symbol),
            oligo_id: normalize_field(self.oligo_id),
            sirna_id: normalize_field(self.sirna_id),
            group: normalize_field(self.group),
        }
    }

    /// Create a record whose row and column are derived from the well name
    pub fn from_well(well: &str) -> Result<Self, PlateError> {
        let id = WellId::parse(well)?;
        Ok(Self {
            well: id.to_string(),
            row: Some(id.row),
            column: Some(id.column),
            ..Default::default()
        })
    }

    /// Parsed well coordinate
    pub fn well_id(&self) -> Result<WellId, PlateError> {
        WellId::parse(&self.well)
    }
}

/// One line of a mapping file
#[derive(Debug, Serialize, Deserialize)]
struct MappingRow {
    #[serde(rename = "Position")]
    position: String,
    #[serde(rename = "Well")]
    well: String,
    #[serde(rename = "Site")]
    site: Option<u32>,
    #[serde(rename = "Row")]
    row: Option<String>,
    #[serde(rename = "Column")]
    column: Option<u32>,
    #[serde(rename = "Gene Symbol")]
    gene_symbol: Option<String>,
    #[serde(rename = "OligoID")]
    oligo_id: Option<String>,
    #[serde(rename = "siRNA ID")]
    sirna_id: Option<String>,
    #[serde(rename = "Group")]
    group: Option<String>,
}

impl MappingRow {
    fn new(position: &str, record: &PlateRecord) -> Self {
        Self {
            position: position.to_string(),
            well: record.well.clone(),
            site: record.site,
            row: record.row.clone(),
            column: record.column,
            gene_symbol: record.gene_symbol.clone(),
            oligo_id: record.oligo_id.clone(),
            sirna_id: record.sirna_id.clone(),
            group: record.group.clone(),
        }
    }

    fn into_entry(self) -> (String, PlateRecord) {
        let record = PlateRecord {
            well: self.well,
            site: self.site,
            row: self.row,
            column: self.column,
            gene_symbol: self.gene_symbol,
            oligo_id: self.oligo_id,
            sirna_id: self.sirna_id,
            group: self.group,
        };
        (self.position, record.normalized())
    }
}

/// Position → metadata mapping for one plate
///
/// The set of positions is fixed when the mapping is created; each position
/// starts unset and is populated from a mapping file or with [`set`](Self::set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateMapping {
    positions: Vec<String>,
    records: HashMap<String, PlateRecord>,
}

impl PlateMapping {
    /// Create an unpopulated mapping for the given positions
    ///
    /// Positions are trimmed; blank and repeated ones are dropped.
    pub fn new<I, S>(positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let positions = positions
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();
        Self {
            positions,
            records: HashMap::new(),
        }
    }

    /// Build a mapping containing exactly the positions listed in a file
    pub fn from_tsv_file<P: AsRef<Path>>(path: P) -> Result<Self, PlateError> {
        let reader = open_mapping_file(path.as_ref())?;
        Self::from_reader(reader)
    }

    /// Build a mapping from TSV data; every row becomes an expected position
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, PlateError> {
        let rows = parse_rows(reader)?;
        let mut mapping = PlateMapping::new(rows.iter().map(|(p, _)| p.as_str()));
        mapping.records = rows.into_iter().collect();
        Ok(mapping)
    }

    /// Populate expected positions from a mapping file
    ///
    /// Rows for positions outside this mapping are skipped. Returns the number
    /// of positions that were populated.
    pub fn read_tsv_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, PlateError> {
        let path = path.as_ref();
        let reader = open_mapping_file(path)?;
        let populated = self.read_from(reader)?;
        info!(
            "Read plate mapping {}: {} of {} positions populated",
            path.display(),
            populated,
            self.positions.len()
        );
        Ok(populated)
    }

    /// Populate expected positions from TSV data
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> Result<usize, PlateError> {
        let mut populated = 0;
        for (position, record) in parse_rows(reader)? {
            if self.contains(&position) {
                self.records.insert(position, record);
                populated += 1;
            } else {
                debug!("Skipping mapping row for unexpected position {}", position);
            }
        }
        Ok(populated)
    }

    /// Write the mapping as TSV; every position must be populated
    pub fn write_tsv_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PlateError> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))?;
        info!(
            "Wrote plate mapping {} ({} positions)",
            path.as_ref().display(),
            self.positions.len()
        );
        Ok(())
    }

    /// Write the mapping as TSV to any writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), PlateError> {
        self.validate()?;

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(MAPPING_HEADER)?;
        for position in &self.positions {
            let record = self.get(position)?;
            csv_writer.serialize(MappingRow::new(position, record))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Expected positions in mapping order
    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    /// Whether `position` is one of the expected positions
    pub fn contains(&self, position: &str) -> bool {
        let position = position.trim();
        self.positions.iter().any(|p| p == position)
    }

    /// Number of expected positions
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when no position has been populated yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when every expected position has a record
    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(|p| self.records.contains_key(p))
    }

    /// Expected positions without a record, in mapping order
    pub fn missing_positions(&self) -> Vec<String> {
        self.positions
            .iter()
            .filter(|p| !self.records.contains_key(*p))
            .cloned()
            .collect()
    }

    /// Fail with [`PlateError::Incomplete`] if any position is unset
    pub fn validate(&self) -> Result<(), PlateError> {
        let missing = self.missing_positions();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PlateError::Incomplete { missing })
        }
    }

    /// Record for a position
    pub fn get(&self, position: &str) -> Result<&PlateRecord, PlateError> {
        let position = position.trim();
        if !self.contains(position) {
            return Err(PlateError::UnknownPosition(position.to_string()));
        }
        self.records
            .get(position)
            .ok_or_else(|| PlateError::UnsetPosition(position.to_string()))
    }

    /// Assign the record for an expected position
    ///
    /// The record is stored [normalized](PlateRecord::normalized).
    pub fn set(&mut self, position: &str, record: PlateRecord) -> Result<(), PlateError> {
        let position = position.trim();
        if !self.contains(position) {
            return Err(PlateError::UnknownPosition(position.to_string()));
        }
        self.records.insert(position.to_string(), record.normalized());
        Ok(())
    }

    /// Iterate over populated positions in mapping order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlateRecord)> {
        self.positions
            .iter()
            .filter_map(|p| self.records.get(p).map(|r| (p.as_str(), r)))
    }

    /// Positions whose record belongs to `group`
    pub fn positions_in_group(&self, group: &str) -> Vec<&str> {
        self.iter()
            .filter(|(_, r)| r.group.as_deref() == Some(group))
            .map(|(p, _)| p)
            .collect()
    }

    /// Positions targeting `gene_symbol` (case-insensitive)
    pub fn positions_for_gene(&self, gene_symbol: &str) -> Vec<&str> {
        self.iter()
            .filter(|(_, r)| {
                r.gene_symbol
                    .as_deref()
                    .is_some_and(|g| g.eq_ignore_ascii_case(gene_symbol))
            })
            .map(|(p, _)| p)
            .collect()
    }
}

/// Locate `<plate_id>.txt`, `.tsv` or `.csv` inside a mapping directory
pub fn find_mapping_file<P: AsRef<Path>>(dir: P, plate_id: &str) -> Result<PathBuf, PlateError> {
    let dir = dir.as_ref();
    MAPPING_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", plate_id, ext)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| PlateError::NotFound(dir.join(format!("{}.txt", plate_id))))
}

fn normalize_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn open_mapping_file(path: &Path) -> Result<BufReader<File>, PlateError> {
    if !path.is_file() {
        return Err(PlateError::NotFound(path.to_path_buf()));
    }
    Ok(BufReader::new(File::open(path)?))
}

/// Parse all rows, rejecting files without the key columns or with repeats
fn parse_rows<R: BufRead>(reader: R) -> Result<Vec<(String, PlateRecord)>, PlateError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for required in ["Position", "Well"] {
        if !headers.iter().any(|h| h == required) {
            return Err(PlateError::MissingColumn(required.to_string()));
        }
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<MappingRow>() {
        let (position, record) = row?.into_entry();
        if position.is_empty() {
            debug!("Skipping mapping row without position");
            continue;
        }
        if !seen.insert(position.clone()) {
            return Err(PlateError::DuplicatePosition(position));
        }
        rows.push((position, record));
    }
    Ok(rows)
}
