// src/csv_io.rs
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pipeline::RunOutcome;
use crate::schema::{certs, criteria, hours, managers, master, stores};
use crate::table::{Cell, Table, Workbook};

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },
}

/// Every sheet name the loader looks for, one `<name>.csv` each.
pub fn known_sheets() -> Vec<&'static str> {
    let mut sheets: Vec<&'static str> = hours::TABLE_CANDIDATES.to_vec();
    sheets.extend([
        criteria::TABLE,
        certs::TABLE,
        master::TABLE,
        managers::TABLE,
        stores::TABLE,
        master::ROSTER_TABLE,
    ]);
    sheets
}

/// Loads every known sheet present in `dir`. Absent files are simply skipped.
pub fn load_workbook(dir: &Path) -> Result<Workbook, IoError> {
    let mut workbook = Workbook::new();
    for sheet in known_sheets() {
        let path = dir.join(format!("{}.csv", sheet));
        if !path.is_file() {
            debug!("Sheet file not present: {}", path.display());
            continue;
        }
        let table = read_table(&path, sheet)?;
        info!("Loaded '{}' ({} rows) from {}", sheet, table.len(), path.display());
        workbook.insert(table);
    }
    Ok(workbook)
}

/// Reads a CSV file into a table named `name`.
///
/// Cells are kept as text; whitespace-only cells become `Empty`.
pub fn read_table(path: &Path, name: &str) -> Result<Table, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(open_without_bom(path)?);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IoError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IoError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut table = Table::new(name, headers);
    for record in reader.records() {
        let record = record.map_err(|source| IoError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        table.push_row(record.iter().map(Cell::text).collect());
    }
    Ok(table)
}

/// Column names from the header row of an output template.
///
/// A template without a header row yields an empty schema, which the run
/// replaces with the built-in layout.
pub fn load_output_schema(path: &Path) -> Result<Vec<String>, IoError> {
    match read_table(path, "template") {
        Ok(table) => Ok(table.headers().to_vec()),
        Err(IoError::MissingHeader { path }) => {
            debug!("Template {} has no header row", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Writes headers and rows; dates render as `YYYY-MM-DD`, decimals normalized.
pub fn write_table(table: &Table, path: &Path) -> Result<(), IoError> {
    let io_err = |source| IoError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| IoError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_err)?;
    // BOM so spreadsheet tools pick up UTF-8 headers.
    file.write_all("\u{feff}".as_bytes()).map_err(io_err)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(table.headers()).map_err(csv_err)?;
    for row in table.rows() {
        writer
            .write_record(row.cells().iter().map(|c| c.to_string()))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(io_err)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Writes the result files of a run.
///
/// A completed run always writes both tables, header-only when empty, so
/// files left by an earlier run never survive. A run with nothing to process
/// removes them instead.
pub fn write_outputs(
    outcome: &RunOutcome,
    eligible_path: &Path,
    exclusions_path: &Path,
) -> Result<(), IoError> {
    match outcome {
        RunOutcome::Completed(report) => {
            write_table(&report.exclusions, exclusions_path)?;
            write_table(&report.eligible, eligible_path)?;
            if !report.has_eligible() {
                warn!("No eligible employees; {} has headers only", eligible_path.display());
            }
        }
        RunOutcome::NothingToProcess { .. } => {
            for path in [eligible_path, exclusions_path] {
                remove_stale(path)?;
            }
        }
    }
    Ok(())
}

fn remove_stale(path: &Path) -> Result<(), IoError> {
    if !path.is_file() {
        return Ok(());
    }
    fs::remove_file(path).map_err(|source| IoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    warn!("Removed output from a previous run: {}", path.display());
    Ok(())
}

fn open_without_bom(path: &Path) -> Result<std::io::Cursor<Vec<u8>>, IoError> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|source| IoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }
    Ok(std::io::Cursor::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn reads_bom_prefixed_csv_and_keeps_ids_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("基本数据.csv");
        fs::write(&path, "\u{feff}工号,职位\n00123,店长\n00124,  \n").unwrap();

        let table = read_table(&path, "基本数据").unwrap();
        assert_eq!(table.headers(), &["工号".to_string(), "职位".to_string()]);
        let first = table.row(0).unwrap();
        assert_eq!(first.get("工号"), &Cell::Text("00123".to_string()));
        assert_eq!(table.row(1).unwrap().get("职位"), &Cell::Empty);
    }

    #[test]
    fn workbook_only_contains_present_sheets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("累计工时.csv"), "工号,总工时\n1,10\n").unwrap();
        fs::write(dir.path().join("unrelated.csv"), "a\n1\n").unwrap();

        let workbook = load_workbook(dir.path()).unwrap();
        assert_eq!(workbook.len(), 1);
        assert!(workbook.contains("累计工时"));
    }

    #[test]
    fn written_dates_have_no_time_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut table = Table::new("out", vec!["入职日期".to_string(), "工时".to_string()]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()),
            Cell::Number(dec!(40.50)),
        ]);
        write_table(&table, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "\u{feff}入职日期,工时\n2025-10-01,40.5\n");
        assert_eq!(load_output_schema(&path).unwrap(), vec!["入职日期", "工时"]);
    }

    #[test]
    fn blank_template_gives_empty_schema() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        let blank_headers = dir.path().join("blank.csv");
        fs::write(&blank_headers, "\u{feff} , \n").unwrap();

        assert!(load_output_schema(&empty).unwrap().is_empty());
        assert!(load_output_schema(&blank_headers).unwrap().is_empty());
        assert!(matches!(
            read_table(&empty, "template"),
            Err(IoError::MissingHeader { .. })
        ));
    }
}
