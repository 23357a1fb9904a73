// src/lib.rs
//! Monthly bonus eligibility over payroll hours, certificates and store data.

pub mod classifier;
pub mod config;
pub mod criteria;
pub mod csv_io;
pub mod error;
pub mod hours;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod projector;
pub mod resolve;
pub mod rules;
pub mod schema;
pub mod table;

#[cfg(test)]
mod classifier_tests;

pub use classifier::{Classifier, EligibilityDecision};
pub use criteria::{apply_criteria, FilterOutcome};
pub use error::{Diagnostics, PipelineError, Warning};
pub use index::{CertificateStatus, ReferenceIndex, ReferenceTables};
pub use pipeline::{run, BonusInputs, BonusReport, RunOutcome, RunSettings, RunSummary};
pub use rules::{EligibilityRule, IneligibleReason, Qualification};
pub use table::{Cell, Table, Workbook};
