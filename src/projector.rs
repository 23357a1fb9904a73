// src/projector.rs
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::classifier::EligibilityDecision;
use crate::hours::parse_hours;
use crate::index::ReferenceIndex;
use crate::normalize::parse_date;
use crate::resolve::{first_present, EmployeeField, EmployeeView};
use crate::schema::{exclusions, hours, managers, output, stores};
use crate::table::{Cell, Table};

pub const ELIGIBLE_TABLE: &str = "筛选结果";

/// Projects every eligible decision onto `schema`, in decision order.
///
/// Known columns are filled from the reference indexes; unknown schema
/// columns stay empty.
pub fn project_eligible(
    hours_table: &Table,
    decisions: &[EligibilityDecision],
    index: &ReferenceIndex,
    schema: &[String],
) -> Table {
    let mut table = Table::new(ELIGIBLE_TABLE, schema.to_vec());
    for decision in decisions.iter().filter(|d| d.is_eligible()) {
        let Some(row) = hours_table.row(decision.row_index) else {
            continue;
        };
        let view = EmployeeView::new(row, index);
        let cells = schema
            .iter()
            .map(|column| output_cell(column, &view, decision, index))
            .collect();
        table.push_row(cells);
    }
    info!("Projected {} eligible rows", table.len());
    table
}

fn output_cell(
    column: &str,
    view: &EmployeeView<'_>,
    decision: &EligibilityDecision,
    index: &ReferenceIndex,
) -> Cell {
    let row = view.row();
    let store_code = view.store_code();
    let store_field = |col: &str| index.stores.field(store_code, col);
    let date_of = |cell: Option<&Cell>| Cell::from(cell.and_then(parse_date));

    match column {
        output::EMPLOYEE_ID => decision.employee_id.clone(),
        output::NAME => decision.name.clone(),
        output::NATIONAL_ID => cloned(view.resolve(EmployeeField::NationalId)),
        output::STORE_CODE => store_code.clone(),
        output::DEPARTMENT => cloned(index.managers.field(store_code, managers::DEPARTMENT_NAME)),
        output::THIRD_PARTY => cloned(view.resolve(EmployeeField::ThirdParty)),
        output::WORK_REGION => cloned(view.resolve(EmployeeField::WorkRegion)),
        output::TITLE => Cell::from(decision.title.as_str()),
        output::ENTRY_DATE => Cell::from(view.resolve_date(EmployeeField::EntryDate)),
        output::REGULARIZATION_DATE => {
            Cell::from(view.resolve_date(EmployeeField::RegularizationDate))
        }
        output::DEPARTURE_DATE => Cell::from(view.resolve_date(EmployeeField::DepartureDate)),
        output::ORG_TYPE => cloned(store_field(stores::BRAND)),
        output::REGION => cloned(first_present([
            row.value(hours::REGION),
            store_field(stores::REGION),
        ])),
        output::AREA_MANAGER => cloned(first_present([
            row.value(hours::AREA_MANAGER),
            store_field(stores::AREA_MANAGER),
        ])),
        output::OPEN_DATE => date_of(store_field(stores::OPEN_DATE)),
        output::CLOSE_DATE => date_of(store_field(stores::CLOSE_DATE)),
        output::HOURS => Cell::Number(row_hours(view, hours::CUMULATIVE_HOURS)),
        output::ANNUAL_LEAVE_HOURS => Cell::Number(row_hours(view, hours::ANNUAL_LEAVE_HOURS)),
        output::TOTAL_HOURS => Cell::Number(
            row_hours(view, hours::CUMULATIVE_HOURS) + row_hours(view, hours::ANNUAL_LEAVE_HOURS),
        ),
        output::IS_STORE_MANAGER => {
            let is_manager = index
                .membership
                .contains(store_code, &decision.employee_id);
            Cell::from(if is_manager { output::YES } else { output::NO })
        }
        _ => Cell::Empty,
    }
}

fn cloned(cell: Option<&Cell>) -> Cell {
    cell.cloned().unwrap_or_default()
}

fn row_hours(view: &EmployeeView<'_>, column: &str) -> Decimal {
    parse_hours(view.row().get(column)).unwrap_or(dec!(0))
}

/// One report row per excluded decision, in decision order.
pub fn exclusion_table(decisions: &[EligibilityDecision]) -> Table {
    let mut table = Table::new(
        exclusions::TABLE,
        exclusions::COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    for decision in decisions.iter().filter(|d| !d.is_eligible()) {
        table.push_row(vec![
            decision.employee_id.clone(),
            decision.name.clone(),
            Cell::from(decision.title.as_str()),
            decision.store_code.clone(),
            Cell::Number(decision.cumulative_hours),
            Cell::Number(decision.period_hours),
            Cell::from(decision.reason()),
        ]);
    }
    table
}
