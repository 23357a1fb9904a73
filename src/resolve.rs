// src/resolve.rs
use chrono::NaiveDate;

use crate::index::ReferenceIndex;
use crate::normalize::parse_date;
use crate::schema::{hours, master};
use crate::table::{Cell, Row};

/// First candidate carrying a usable (non-blank, non-"nan") value.
pub fn first_present<'a, I>(candidates: I) -> Option<&'a Cell>
where
    I: IntoIterator<Item = Option<&'a Cell>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|cell| !cell.is_blank())
}

/// Employee attributes that can come from master data, the roster, or the hours row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeField {
    Name,
    Title,
    NationalId,
    ThirdParty,
    WorkRegion,
    EntryDate,
    RegularizationDate,
    DepartureDate,
}

impl EmployeeField {
    /// Column in master data and the roster.
    fn reference_column(self) -> &'static str {
        match self {
            EmployeeField::Name => master::NAME,
            EmployeeField::Title => master::TITLE,
            EmployeeField::NationalId => master::NATIONAL_ID,
            EmployeeField::ThirdParty => master::THIRD_PARTY,
            EmployeeField::WorkRegion => master::WORK_REGION,
            EmployeeField::EntryDate => master::ENTRY_DATE,
            EmployeeField::RegularizationDate => master::REGULARIZATION_DATE,
            EmployeeField::DepartureDate => master::DEPARTURE_DATE,
        }
    }

    /// Column on the hours row. Only title and name differ from master data.
    fn hours_column(self) -> &'static str {
        match self {
            EmployeeField::Name => hours::NAME,
            EmployeeField::Title => hours::TITLE,
            other => other.reference_column(),
        }
    }
}

/// One hours row together with the master and roster records of its employee.
#[derive(Debug, Clone, Copy)]
pub struct EmployeeView<'a> {
    row: Row<'a>,
    master: Option<Row<'a>>,
    roster: Option<Row<'a>>,
}

impl<'a> EmployeeView<'a> {
    pub fn new(row: Row<'a>, index: &'a ReferenceIndex) -> Self {
        let employee_id = row.get(hours::EMPLOYEE_ID);
        Self {
            row,
            master: index.master.get(employee_id),
            roster: index.roster.get(employee_id),
        }
    }

    pub fn row(&self) -> Row<'a> {
        self.row
    }

    pub fn employee_id(&self) -> &'a Cell {
        self.row.get(hours::EMPLOYEE_ID)
    }

    pub fn store_code(&self) -> &'a Cell {
        self.row.get(hours::STORE_CODE)
    }

    /// master data → roster → hours row; the first usable value wins.
    pub fn resolve(&self, field: EmployeeField) -> Option<&'a Cell> {
        let column = field.reference_column();
        first_present([
            self.master.map(|r| r.get(column)),
            self.roster.map(|r| r.get(column)),
            Some(self.row.get(field.hours_column())),
        ])
    }

    pub fn resolve_text(&self, field: EmployeeField) -> Option<String> {
        self.resolve(field).and_then(Cell::as_text)
    }

    /// The resolved value read as a date. A present but unparseable value
    /// does not fall through to the next source; it yields `None`.
    pub fn resolve_date(&self, field: EmployeeField) -> Option<NaiveDate> {
        self.resolve(field).and_then(parse_date)
    }

    /// Resolved job title, or an empty string when no source has one.
    pub fn title(&self) -> String {
        self.resolve_text(EmployeeField::Title).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::index::{KeyedTable, ReferenceIndex};
    use crate::table::Table;

    fn index(master_rows: &[&[&str]], roster_rows: &[&[&str]]) -> ReferenceIndex {
        let mut diag = Diagnostics::new();
        let master = Table::from_strs("基本数据", &["工号", "职位", "入职日期"], master_rows);
        let roster = Table::from_strs("花名册", &["工号", "职位", "入职日期"], roster_rows);
        ReferenceIndex {
            master: KeyedTable::build(&master, "工号", &mut diag),
            roster: KeyedTable::build(&roster, "工号", &mut diag),
            ..Default::default()
        }
    }

    fn hours(rows: &[&[&str]]) -> Table {
        Table::from_strs("工时数据", &["工号", "职位名称", "门店编码"], rows)
    }

    #[test]
    fn first_present_skips_blank_and_nan() {
        let blank = Cell::text(" ");
        let nan = Cell::text("nan");
        let value = Cell::text("店长");
        assert_eq!(
            first_present([None, Some(&blank), Some(&nan), Some(&value)]),
            Some(&value)
        );
        assert_eq!(first_present([Some(&blank), None]), None);
    }

    #[test]
    fn title_prefers_master_then_roster_then_row() {
        let idx = index(
            &[&["1", "店长", ""], &["2", "nan", ""]],
            &[&["2", "副店长", ""], &["3", "", ""]],
        );
        let rows = hours(&[&["1", "兼职", "S1"], &["2", "兼职", "S1"], &["3", "兼职", "S1"], &["4", "", "S1"]]);
        let titles: Vec<String> = rows
            .rows()
            .map(|row| EmployeeView::new(row, &idx).title())
            .collect();
        assert_eq!(titles, vec!["店长", "副店长", "兼职", ""]);
    }

    #[test]
    fn date_resolution_falls_back_only_on_blank() {
        let idx = index(
            &[&["1", "副店长", ""], &["2", "副店长", "unknown"]],
            &[&["1", "", "2025-10-01"], &["2", "", "2025-10-01"]],
        );
        let rows = hours(&[&["1", "", "S1"], &["2", "", "S1"]]);
        let first = EmployeeView::new(rows.row(0).unwrap(), &idx);
        assert_eq!(
            first.resolve_date(EmployeeField::EntryDate),
            NaiveDate::from_ymd_opt(2025, 10, 1)
        );
        let second = EmployeeView::new(rows.row(1).unwrap(), &idx);
        assert_eq!(second.resolve_date(EmployeeField::EntryDate), None);
    }
}
