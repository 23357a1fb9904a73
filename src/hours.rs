// src/hours.rs
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::info;

use crate::error::{Diagnostics, Warning};
use crate::schema::hours;
use crate::table::{Cell, Table};

/// Per-employee hour totals across every row of the unfiltered hours table.
///
/// An employee working in several stores has one total, and that total is
/// what the eligibility rules see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoursAggregate {
    cumulative: HashMap<Cell, Decimal>,
    period: HashMap<Cell, Decimal>,
}

impl HoursAggregate {
    pub fn from_table(table: &Table, diag: &mut Diagnostics) -> Self {
        let cumulative = sum_column(table, hours::CUMULATIVE_HOURS, diag);
        let period = sum_column(table, hours::PERIOD_HOURS, diag);
        info!(
            "Aggregated hours for {} employees from {} rows",
            cumulative.len().max(period.len()),
            table.len()
        );
        Self { cumulative, period }
    }

    pub fn cumulative(&self, employee_id: &Cell) -> Decimal {
        self.cumulative
            .get(employee_id)
            .copied()
            .unwrap_or(dec!(0))
    }

    pub fn period(&self, employee_id: &Cell) -> Decimal {
        self.period.get(employee_id).copied().unwrap_or(dec!(0))
    }
}

/// Reads an hours cell. Blank is zero; anything else non-numeric is `None`.
pub fn parse_hours(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) if !crate::table::is_blank_text(s) => {
            let text = s.trim();
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .ok()
        }
        c if c.is_blank() => Some(dec!(0)),
        _ => None,
    }
}

fn sum_column(table: &Table, column: &str, diag: &mut Diagnostics) -> HashMap<Cell, Decimal> {
    let mut totals: HashMap<Cell, Decimal> = HashMap::new();
    if !table.has_column(column) {
        diag.warn(Warning::MissingColumn {
            table: table.name().to_string(),
            column: column.to_string(),
        });
        return totals;
    }

    let mut unparseable = 0;
    for row in table.rows() {
        let Some(employee) = row.value(hours::EMPLOYEE_ID) else {
            continue;
        };
        let value = parse_hours(row.get(column)).unwrap_or_else(|| {
            unparseable += 1;
            dec!(0)
        });
        *totals.entry(employee.clone()).or_insert(dec!(0)) += value;
    }

    if unparseable > 0 {
        diag.warn(Warning::UnparseableHours {
            table: table.name().to_string(),
            column: column.to_string(),
            count: unparseable,
        });
    }
    totals
}
