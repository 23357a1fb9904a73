// src/pipeline.rs
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::{Classifier, EligibilityDecision};
use crate::criteria::{apply_criteria, FilterOutcome};
use crate::error::{Diagnostics, PipelineError, Warning};
use crate::hours::HoursAggregate;
use crate::index::{ReferenceIndex, ReferenceTables};
use crate::normalize::resolve_bonus_month;
use crate::projector::{exclusion_table, project_eligible};
use crate::schema::{certs, criteria, hours, managers, master, output, stores};
use crate::table::{Table, Workbook};

/// Every table one run consumes, already parsed.
#[derive(Debug, Clone, Default)]
pub struct BonusInputs {
    pub hours: Table,
    pub criteria: Option<Table>,
    pub certificates: Option<Table>,
    pub master: Option<Table>,
    pub managers: Option<Table>,
    pub stores: Option<Table>,
    pub roster: Option<Table>,
    pub output_schema: Vec<String>,
}

impl BonusInputs {
    /// Picks the known sheets out of a workbook.
    ///
    /// The hours sheet is the only hard requirement. Missing reference sheets
    /// are reported as warnings; the roster is optional and stays silent.
    pub fn from_workbook(
        mut workbook: Workbook,
        output_schema: Vec<String>,
        diag: &mut Diagnostics,
    ) -> Result<Self, PipelineError> {
        let hours_name = hours::TABLE_CANDIDATES
            .into_iter()
            .find(|name| workbook.contains(name))
            .ok_or_else(|| PipelineError::HoursTableMissing {
                candidates: hours::TABLE_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            })?;
        info!("Using main data sheet: {}", hours_name);
        let hours = workbook.take(hours_name).unwrap_or_default();

        let mut required = |name: &str| {
            let table = workbook.take(name);
            if table.is_none() {
                diag.warn(Warning::MissingTable {
                    table: name.to_string(),
                });
            }
            table
        };
        let criteria = required(criteria::TABLE);
        let certificates = required(certs::TABLE);
        let master = required(master::TABLE);
        let managers = required(managers::TABLE);
        let stores = required(stores::TABLE);
        let roster = workbook.take(master::ROSTER_TABLE);

        Ok(Self {
            hours,
            criteria,
            certificates,
            master,
            managers,
            stores,
            roster,
            output_schema,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    /// Overrides the `奖金月份` value from the criteria table.
    pub bonus_month: Option<String>,
}

/// Results of a run that got as far as classification.
#[derive(Debug, Clone)]
pub struct BonusReport {
    pub bonus_month_start: NaiveDate,
    pub filter: FilterOutcome,
    pub decisions: Vec<EligibilityDecision>,
    pub eligible: Table,
    pub exclusions: Table,
    pub warnings: Vec<Warning>,
}

impl BonusReport {
    pub fn has_eligible(&self) -> bool {
        !self.eligible.is_empty()
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    pub fn excluded_count(&self) -> usize {
        self.exclusions.len()
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No hours rows left to classify (empty input or nothing matched the criteria).
    NothingToProcess {
        bonus_month_start: NaiveDate,
        filter: FilterOutcome,
        warnings: Vec<Warning>,
    },
    Completed(BonusReport),
}

impl RunOutcome {
    pub fn warnings(&self) -> &[Warning] {
        match self {
            RunOutcome::NothingToProcess { warnings, .. } => warnings,
            RunOutcome::Completed(report) => &report.warnings,
        }
    }

    pub fn report(&self) -> Option<&BonusReport> {
        match self {
            RunOutcome::Completed(report) => Some(report),
            RunOutcome::NothingToProcess { .. } => None,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let (status, bonus_month_start, filter) = match self {
            RunOutcome::NothingToProcess {
                bonus_month_start,
                filter,
                ..
            } => ("nothing_to_process", *bonus_month_start, *filter),
            RunOutcome::Completed(report) if report.has_eligible() => {
                ("completed", report.bonus_month_start, report.filter)
            }
            RunOutcome::Completed(report) => {
                ("no_eligible_employees", report.bonus_month_start, report.filter)
            }
        };
        let report = self.report();
        RunSummary {
            status,
            bonus_month_start,
            filter: match filter {
                FilterOutcome::PassThrough => "pass_through",
                FilterOutcome::Ignored => "ignored",
                FilterOutcome::Applied { .. } => "applied",
            },
            rows_classified: report.map_or(0, |r| r.decisions.len()),
            eligible: report.map_or(0, BonusReport::eligible_count),
            excluded: report.map_or(0, BonusReport::excluded_count),
            warnings: self.warnings().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Machine-readable digest of a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub status: &'static str,
    pub bonus_month_start: NaiveDate,
    pub filter: &'static str,
    pub rows_classified: usize,
    pub eligible: usize,
    pub excluded: usize,
    pub warnings: Vec<String>,
}

/// Runs the whole eligibility batch over in-memory tables.
///
/// Only a missing hours table is fatal, and that is caught by
/// [`BonusInputs::from_workbook`]. An empty output schema falls back to the
/// built-in layout. Warnings raised before the call (e.g. while assembling `inputs`) are
/// carried over from `diag` into the outcome.
pub fn run(
    inputs: &BonusInputs,
    settings: &RunSettings,
    mut diag: Diagnostics,
) -> Result<RunOutcome, PipelineError> {
    let fallback_schema;
    let schema: &[String] = if inputs.output_schema.is_empty() {
        fallback_schema = output::default_schema();
        diag.warn(Warning::EmptyOutputSchema {
            columns: fallback_schema.len(),
        });
        &fallback_schema
    } else {
        &inputs.output_schema
    };

    let bonus_month_start = resolve_bonus_month(
        settings.bonus_month.as_deref(),
        inputs.criteria.as_ref(),
        &mut diag,
    );
    info!("Calculating bonus for month starting: {}", bonus_month_start);

    let index = ReferenceIndex::build(
        ReferenceTables {
            master: inputs.master.as_ref(),
            stores: inputs.stores.as_ref(),
            managers: inputs.managers.as_ref(),
            roster: inputs.roster.as_ref(),
            certificates: inputs.certificates.as_ref(),
        },
        &mut diag,
    );

    // Totals come from the unfiltered table so filtering never splits an employee's hours.
    let aggregate = HoursAggregate::from_table(&inputs.hours, &mut diag);

    let (filtered, filter) =
        apply_criteria(&inputs.hours, inputs.criteria.as_ref(), &index, &mut diag);
    if filtered.is_empty() {
        warn!("No data left after filtering.");
        return Ok(RunOutcome::NothingToProcess {
            bonus_month_start,
            filter,
            warnings: diag.into_warnings(),
        });
    }

    let classifier = Classifier::new(&index, &aggregate, bonus_month_start);
    let decisions = classifier.classify(&filtered);

    let eligible = project_eligible(&filtered, &decisions, &index, schema);
    let exclusions = exclusion_table(&decisions);
    if eligible.is_empty() {
        warn!("No eligible employees found.");
    } else {
        info!("Eligible employees found: {}", eligible.len());
    }

    Ok(RunOutcome::Completed(BonusReport {
        bonus_month_start,
        filter,
        decisions,
        eligible,
        exclusions,
        warnings: diag.into_warnings(),
    }))
}
