use std::{ffi::OsStr, path::Path};

use anyhow::{Context, Result};
use log::debug;

mod error;
pub use error::ReadError;

/// Recognized input-table formats, sniffed from the file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Tsv,
}

impl InputFormat {
    /// Sniff the table format from a file suffix.
    ///
    /// # Errors
    /// [`ReadError::UnrecognizedExtension`] for anything other than `.csv`, `.tsv` or `.txt`.
    pub fn detect(path: &Path) -> Result<Self, ReadError> {
        let extension = path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv")         => Ok(Self::Csv),
            Some("tsv" | "txt") => Ok(Self::Tsv),
            _ => Err(ReadError::UnrecognizedExtension{path: path.to_path_buf()}),
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// One row of a family genotype table.
/// - `id`       : sample identifier (first column of the table).
/// - `relation` : role of the sample within its family. Rows tagged as 'child' are excluded
///   from the analysis downstream.
/// - `gl_string`: combined haplotype string `<strand1>+<strand2>`.
#[derive(Debug, Clone)]
pub struct FamilyRecord {
    pub id       : String,
    pub relation : String,
    pub gl_string: String,
}

impl FamilyRecord {
    pub fn is_child(&self) -> bool {
        self.relation.trim().eq_ignore_ascii_case("child")
    }
}

/// A pre-normalized, column-oriented genotype table: two cells per locus per sample,
/// one per haplotype strand. `None` marks a missing allele.
#[derive(Debug)]
pub struct NormalizedTable {
    pub loci: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

#[derive(Debug)]
pub struct NormalizedRow {
    pub id   : String,
    pub cells: Vec<(Option<String>, Option<String>)>,
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let format = InputFormat::detect(path)?;
    csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open input table '{}'", path.display()))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn missing_to_none(cell: Option<&str>) -> Option<String> {
    match cell.map(str::trim) {
        None | Some("" | ".") => None,
        Some(value)           => Some(value.to_string()),
    }
}

/// Read a family genotype table: one row per subject, with a relation/role column and a
/// GL-string column. Column lookup is header-based and case-insensitive.
///
/// # Errors
/// - [`ReadError::UnrecognizedExtension`] on an unknown file suffix.
/// - [`ReadError::MissingColumn`] when either required column is absent from the header.
/// - [`ReadError::EmptyTable`] when no data rows are found.
pub fn read_family_table(path: &Path, relation_column: &str, gl_column: &str) -> Result<Vec<FamilyRecord>> {
    let mut reader  = open_reader(path)?;
    let headers     = reader.headers()
        .with_context(|| format!("Failed to parse the header row of '{}'", path.display()))?
        .clone();

    let missing = |column: &str| ReadError::MissingColumn{column: column.to_string()};
    let relation_idx = find_column(&headers, relation_column).ok_or_else(|| missing(relation_column))?;
    let gl_idx       = find_column(&headers, gl_column).ok_or_else(|| missing(gl_column))?;

    let mut records = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse record {} of '{}'", line + 2, path.display()))?;
        records.push(FamilyRecord {
            id       : record.get(0).unwrap_or("").trim().to_string(),
            relation : record.get(relation_idx).unwrap_or("").trim().to_string(),
            gl_string: record.get(gl_idx).unwrap_or("").trim().to_string(),
        });
    }

    if records.is_empty() {
        return Err(ReadError::EmptyTable{path: path.to_path_buf()}).context("While reading family table")
    }

    debug!("Parsed {} family records from '{}'", records.len(), path.display());
    Ok(records)
}

/// Read a pre-normalized column-oriented genotype table: a sample-id column, followed by
/// two adjacent columns per locus. The header of the first column of each pair names the
/// locus. Empty cells (or '.') mark missing alleles.
///
/// # Errors
/// - [`ReadError::UnrecognizedExtension`] on an unknown file suffix.
/// - [`ReadError::UnpairedColumns`] when the genotype columns cannot be grouped in pairs.
/// - [`ReadError::EmptyTable`] when no data rows are found.
pub fn read_normalized_table(path: &Path) -> Result<NormalizedTable> {
    let mut reader = open_reader(path)?;
    let headers    = reader.headers()
        .with_context(|| format!("Failed to parse the header row of '{}'", path.display()))?
        .clone();

    let genotype_columns = headers.len().saturating_sub(1);
    if genotype_columns == 0 || genotype_columns % 2 != 0 {
        return Err(ReadError::UnpairedColumns{found: genotype_columns})
            .with_context(|| format!("While reading normalized table '{}'", path.display()))
    }

    let loci: Vec<String> = headers.iter()
        .skip(1)
        .step_by(2)
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse record {} of '{}'", line + 2, path.display()))?;
        let cells = (0..loci.len())
            .map(|locus| {
                let column = 1 + 2 * locus;
                (missing_to_none(record.get(column)), missing_to_none(record.get(column + 1)))
            })
            .collect();
        rows.push(NormalizedRow {
            id: record.get(0).unwrap_or("").trim().to_string(),
            cells,
        });
    }

    if rows.is_empty() {
        return Err(ReadError::EmptyTable{path: path.to_path_buf()}).context("While reading normalized table")
    }

    debug!("Parsed {} samples * {} loci from '{}'", rows.len(), loci.len(), path.display());
    Ok(NormalizedTable{loci, rows})
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("Failed to create test input");
        write!(file, "{contents}").expect("Failed to write test input");
        path
    }

    #[test]
    fn format_detection() {
        assert_eq!(InputFormat::detect(Path::new("families.csv")).unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::detect(Path::new("families.TSV")).unwrap(), InputFormat::Tsv);
        assert_eq!(InputFormat::detect(Path::new("families.txt")).unwrap(), InputFormat::Tsv);
        assert!(matches!(
            InputFormat::detect(Path::new("families.xlsx")),
            Err(ReadError::UnrecognizedExtension{path: _})
        ));
    }

    #[test]
    fn family_table_csv() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = write_tmp(&tmpdir, "families.csv", "\
            Sample,Relation,GL String\n\
            F01-father,father,A*01+A*02\n\
            F01-child,Child,A*01+A*01\n"
        );

        let records = read_family_table(&path, "Relation", "GL String")?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "F01-father");
        assert_eq!(records[0].gl_string, "A*01+A*02");
        assert!(!records[0].is_child());
        assert!(records[1].is_child()); // case-insensitive
        Ok(())
    }

    #[test]
    fn family_table_missing_column() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = write_tmp(&tmpdir, "families.csv", "Sample,GL String\nF01,A*01+A*02\n");

        let result = read_family_table(&path, "Relation", "GL String");
        assert!(result.is_err_and(|e| {
            matches!(e.downcast_ref::<ReadError>(), Some(ReadError::MissingColumn{column}) if column == "Relation")
        }));
        Ok(())
    }

    #[test]
    fn normalized_table_tsv() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = write_tmp(&tmpdir, "genotypes.tsv", "\
            Sample\tA\tA_1\tB\tB_1\n\
            S1\tA*01\tA*02\tB*07\tB*08\n\
            S2\tA*01\t.\tB*07\t\n"
        );

        let table = read_normalized_table(&path)?;
        assert_eq!(table.loci, vec!["A", "B"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[0], (Some("A*01".to_string()), Some("A*02".to_string())));
        assert_eq!(table.rows[1].cells[0], (Some("A*01".to_string()), None));
        assert_eq!(table.rows[1].cells[1], (Some("B*07".to_string()), None));
        Ok(())
    }

    #[test]
    fn normalized_table_unpaired_columns() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = write_tmp(&tmpdir, "genotypes.csv", "Sample,A,A_1,B\nS1,A*01,A*02,B*07\n");

        let result = read_normalized_table(&path);
        assert!(result.is_err_and(|e| {
            matches!(e.downcast_ref::<ReadError>(), Some(ReadError::UnpairedColumns{found: 3}))
        }));
        Ok(())
    }
}
