// src/classifier.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::hours::HoursAggregate;
use crate::index::ReferenceIndex;
use crate::resolve::{EmployeeField, EmployeeView};
use crate::rules::{decide, EligibilityRule, RuleFacts, RuleOutcome};
use crate::table::{Cell, Row, Table};

/// The verdict for one hours row.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityDecision {
    /// Position of the row in the (filtered) hours table.
    pub row_index: usize,
    pub employee_id: Cell,
    pub name: Cell,
    pub store_code: Cell,
    pub title: String,
    pub rule: Option<EligibilityRule>,
    pub cumulative_hours: Decimal,
    pub period_hours: Decimal,
    pub outcome: RuleOutcome,
}

impl EligibilityDecision {
    pub fn is_eligible(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn reason(&self) -> String {
        match &self.outcome {
            Ok(qualification) => qualification.to_string(),
            Err(reason) => reason.to_string(),
        }
    }
}

pub struct Classifier<'a> {
    index: &'a ReferenceIndex,
    hours: &'a HoursAggregate,
    bonus_month_start: NaiveDate,
}

impl<'a> Classifier<'a> {
    pub fn new(
        index: &'a ReferenceIndex,
        hours: &'a HoursAggregate,
        bonus_month_start: NaiveDate,
    ) -> Self {
        Self {
            index,
            hours,
            bonus_month_start,
        }
    }

    pub fn bonus_month_start(&self) -> NaiveDate {
        self.bonus_month_start
    }

    pub fn classify_row(&self, row: Row<'_>) -> EligibilityDecision {
        let view = EmployeeView::new(row, self.index);
        let employee_id = view.employee_id();
        let title = view.title();

        let facts = RuleFacts::new(
            self.bonus_month_start,
            self.hours.cumulative(employee_id),
            self.hours.period(employee_id),
            |name| self.index.certificates.status(employee_id, name),
            view.resolve_date(EmployeeField::EntryDate),
        );
        let (rule, outcome) = decide(&title, &facts);

        let decision = EligibilityDecision {
            row_index: row.index(),
            employee_id: employee_id.clone(),
            name: view.resolve(EmployeeField::Name).cloned().unwrap_or_default(),
            store_code: view.store_code().clone(),
            title,
            rule,
            cumulative_hours: facts.cumulative_hours,
            period_hours: facts.period_hours,
            outcome,
        };
        debug!(
            "{} {} ({}) at {}: {} - {}",
            if decision.is_eligible() { "kept" } else { "dropped" },
            decision.employee_id,
            decision.title,
            decision.store_code,
            decision.rule.map(EligibilityRule::label).unwrap_or("none"),
            decision.reason()
        );
        decision
    }

    /// Classifies every row, preserving row order.
    pub fn classify(&self, table: &Table) -> Vec<EligibilityDecision> {
        let decisions: Vec<EligibilityDecision> =
            table.rows().map(|row| self.classify_row(row)).collect();
        info!(
            "Classified {} rows: {} eligible, {} excluded",
            decisions.len(),
            decisions.iter().filter(|d| d.is_eligible()).count(),
            decisions.iter().filter(|d| !d.is_eligible()).count()
        );
        decisions
    }
}
