// src/error.rs
use thiserror::Error;
use tracing::warn;

// --- Fatal Errors ---

/// Errors that abort a run before any classification happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Could not find an hours table (looked for: {})", .candidates.join(", "))]
    HoursTableMissing { candidates: Vec<String> },
}

// --- Non-fatal Diagnostics ---

/// Data-quality and configuration-shape problems that are absorbed locally.
/// None of these change whether a run succeeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("Table '{table}' not found; continuing with an empty index")]
    MissingTable { table: String },
    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },
    #[error("Table '{table}' has duplicate values in '{column}' ({}); keeping the first row for each", .keys.join(", "))]
    DuplicateKeys {
        table: String,
        column: String,
        keys: Vec<String>,
    },
    #[error("None of the filter columns exist in the combined data (available: {}); ignoring filter", .available.join(", "))]
    NoMatchingFilterColumns { available: Vec<String> },
    #[error("Column '{column}' not found in '{table}'; treating every valid certificate as held since {sentinel}")]
    CertificateDatesUnavailable {
        table: String,
        column: String,
        sentinel: chrono::NaiveDate,
    },
    #[error("{count} valid certificate grant(s) in '{table}' have no usable effective date and count as not held")]
    UndatedCertificates { table: String, count: usize },
    #[error("{count} value(s) in '{table}.{column}' are not numbers and were counted as 0")]
    UnparseableHours {
        table: String,
        column: String,
        count: usize,
    },
    #[error("Output template has no columns; using the built-in layout of {columns} columns")]
    EmptyOutputSchema { columns: usize },
    #[error("Invalid bonus month '{value}'; using default {fallback}")]
    InvalidBonusMonth {
        value: String,
        fallback: chrono::NaiveDate,
    },
}

/// Collects warnings for a run and logs each one as it is raised.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_warning_lists_every_key_once() {
        let warning = Warning::DuplicateKeys {
            table: "基本数据".to_string(),
            column: "工号".to_string(),
            keys: vec!["1001".to_string(), "1002".to_string()],
        };
        assert_eq!(
            warning.to_string(),
            "Table '基本数据' has duplicate values in '工号' (1001, 1002); keeping the first row for each"
        );
    }

    #[test]
    fn diagnostics_keep_insertion_order() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());
        diag.warn(Warning::MissingTable {
            table: "花名册".to_string(),
        });
        diag.warn(Warning::MissingColumn {
            table: "过岗数据".to_string(),
            column: "状态".to_string(),
        });
        let warnings = diag.into_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], Warning::MissingTable { .. }));
    }

    #[test]
    fn missing_hours_table_names_candidates() {
        let err = PipelineError::HoursTableMissing {
            candidates: vec!["工时数据".to_string(), "累计工时".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Could not find an hours table (looked for: 工时数据, 累计工时)"
        );
    }
}
