// src/criteria.rs
use tracing::{debug, info};

use crate::error::{Diagnostics, Warning};
use crate::index::{KeyedTable, ReferenceIndex};
use crate::schema::hours;
use crate::table::{Cell, Row, Table};

/// What the criteria filter did to the hours table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// No criteria, or only blank criteria.
    PassThrough,
    /// Criteria present, but none of their columns exist in the combined view.
    Ignored,
    Applied { before: usize, after: usize },
}

/// Joins every hours row to its master, store and manager records.
///
/// Column names are namespaced as `<table>-<column>`, including the hours
/// table's own columns. Lookups go through the deduplicated indexes, so the
/// view has exactly one row per hours row, at the same position.
pub fn denormalize(hours_table: &Table, index: &ReferenceIndex) -> Table {
    let joins: [(&KeyedTable, &str); 3] = [
        (&index.master, hours::EMPLOYEE_ID),
        (&index.stores, hours::STORE_CODE),
        (&index.managers, hours::STORE_CODE),
    ];
    // A join only happens when both sides have their key column.
    let joins: Vec<(&KeyedTable, &str)> = joins
        .into_iter()
        .filter(|(keyed, on)| keyed.key_column().is_some() && hours_table.has_column(on))
        .collect();

    let mut headers: Vec<String> = namespaced(hours_table.name(), hours_table.headers());
    for (keyed, _) in &joins {
        headers.extend(namespaced(keyed.table().name(), keyed.table().headers()));
    }

    let mut view = Table::new("denormalized", headers);
    for row in hours_table.rows() {
        let mut cells: Vec<Cell> = row.cells().to_vec();
        for (keyed, on) in &joins {
            match keyed.get(row.get(on)) {
                Some(joined) => cells.extend(joined.cells().iter().cloned()),
                None => cells.extend(std::iter::repeat(Cell::Empty).take(keyed.table().headers().len())),
            }
        }
        view.push_row(cells);
    }
    view
}

fn namespaced(table_name: &str, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| format!("{}-{}", table_name, h))
        .collect()
}

/// A conjunction of column = value constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaRule {
    constraints: Vec<(String, Cell)>,
}

impl CriteriaRule {
    fn from_row(row: Row<'_>, columns: &[String]) -> Self {
        let constraints = columns
            .iter()
            .filter_map(|column| row.value(column).map(|v| (column.clone(), v.clone())))
            .collect();
        Self { constraints }
    }

    pub fn constraints(&self) -> &[(String, Cell)] {
        &self.constraints
    }

    pub fn matches(&self, row: Row<'_>) -> bool {
        self.constraints
            .iter()
            .all(|(column, expected)| row.get(column) == expected)
    }
}

/// Keeps the hours rows that match at least one criteria row.
///
/// Rows come back in their original order. Criteria rows that are blank in
/// every column are ignored; within a rule, blank cells impose nothing.
pub fn apply_criteria(
    hours_table: &Table,
    criteria: Option<&Table>,
    index: &ReferenceIndex,
    diag: &mut Diagnostics,
) -> (Table, FilterOutcome) {
    let Some(criteria) = criteria.filter(|c| !c.is_empty() && !c.is_blank()) else {
        info!("No filters found in criteria table. Using all data.");
        return (hours_table.clone(), FilterOutcome::PassThrough);
    };

    let view = denormalize(hours_table, index);
    let columns: Vec<String> = criteria
        .headers()
        .iter()
        .filter(|c| view.has_column(c))
        .cloned()
        .collect();

    if columns.is_empty() {
        diag.warn(Warning::NoMatchingFilterColumns {
            available: view.headers().iter().take(10).cloned().collect(),
        });
        return (hours_table.clone(), FilterOutcome::Ignored);
    }
    info!("Using filter columns: {:?}", columns);

    let rules: Vec<CriteriaRule> = criteria
        .rows()
        .filter(|row| !row.cells().iter().all(Cell::is_blank))
        .map(|row| CriteriaRule::from_row(row, &columns))
        .collect();
    debug!("Built {} filter rules", rules.len());

    let mask: Vec<bool> = view
        .rows()
        .map(|row| rules.iter().any(|rule| rule.matches(row)))
        .collect();
    let filtered = hours_table.select_rows(&mask);

    info!("Rows after filtering: {}", filtered.len());
    let outcome = FilterOutcome::Applied {
        before: hours_table.len(),
        after: filtered.len(),
    };
    (filtered, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReferenceTables;

    fn hours_table() -> Table {
        Table::from_strs(
            "工时数据",
            &["工号", "门店编码", "职位名称"],
            &[
                &["1001", "S01", "店长"],
                &["1002", "S02", "兼职"],
                &["1003", "S03", "茶饮师"],
                &["1004", "S01", "副店长"],
            ],
        )
    }

    fn reference_index(diag: &mut Diagnostics) -> ReferenceIndex {
        let master = Table::from_strs(
            "基本数据",
            &["工号", "工作地区"],
            &[&["1001", "上海"], &["1002", "深圳"], &["1003", "上海"], &["1001", "北京"]],
        );
        let stores = Table::from_strs(
            "门店状态表",
            &["ERP门店编码", "品牌"],
            &[&["S01", "奈雪"], &["S02", "台盖"], &["S03", "奈雪"]],
        );
        let managers = Table::from_strs("门店负责人", &["部门编号", "店长"], &[&["S01", "1001"]]);
        ReferenceIndex::build(
            ReferenceTables {
                master: Some(&master),
                stores: Some(&stores),
                managers: Some(&managers),
                ..Default::default()
            },
            diag,
        )
    }

    fn ids(table: &Table) -> Vec<String> {
        table.rows().map(|r| r.get("工号").key_string()).collect()
    }

    #[test]
    fn denormalized_view_is_namespaced_and_row_aligned() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let view = denormalize(&hours_table(), &index);

        assert_eq!(view.len(), 4);
        assert!(view.has_column("工时数据-工号"));
        assert!(view.has_column("基本数据-工作地区"));
        assert!(view.has_column("门店状态表-品牌"));
        assert!(view.has_column("门店负责人-店长"));
        assert!(!view.has_column("工号"));

        let first = view.row(0).unwrap();
        // duplicate master key resolved to the first row
        assert_eq!(first.get("基本数据-工作地区"), &Cell::text("上海"));
        let last = view.row(3).unwrap();
        assert_eq!(last.get("基本数据-工作地区"), &Cell::Empty);
        assert_eq!(last.get("门店状态表-品牌"), &Cell::text("奈雪"));
    }

    #[test]
    fn rules_are_or_across_rows_and_and_within_a_row() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let criteria = Table::from_strs(
            "筛选条件",
            &["门店状态表-品牌", "基本数据-工作地区", "奖金月份"],
            &[&["台盖", "", "2025-11"], &["", "上海", ""]],
        );
        let (filtered, outcome) = apply_criteria(&hours_table(), Some(&criteria), &index, &mut diag);
        assert_eq!(ids(&filtered), vec!["1001", "1002", "1003"]);
        assert_eq!(outcome, FilterOutcome::Applied { before: 4, after: 3 });
    }

    #[test]
    fn conjunction_requires_every_constrained_column() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let criteria = Table::from_strs(
            "筛选条件",
            &["门店状态表-品牌", "工时数据-职位名称"],
            &[&["奈雪", "茶饮师"]],
        );
        let (filtered, _) = apply_criteria(&hours_table(), Some(&criteria), &index, &mut diag);
        assert_eq!(ids(&filtered), vec!["1003"]);
    }

    #[test]
    fn blank_criteria_pass_everything_through() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let criteria = Table::from_strs("筛选条件", &["门店状态表-品牌"], &[&[""], &["nan"]]);
        let (filtered, outcome) = apply_criteria(&hours_table(), Some(&criteria), &index, &mut diag);
        assert_eq!(outcome, FilterOutcome::PassThrough);
        assert_eq!(filtered.len(), 4);

        let (filtered, outcome) = apply_criteria(&hours_table(), None, &index, &mut diag);
        assert_eq!(outcome, FilterOutcome::PassThrough);
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn unknown_filter_columns_are_ignored_with_warning() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let before = diag.warnings().len();
        let criteria = Table::from_strs("筛选条件", &["品牌"], &[&["奈雪"]]);
        let (filtered, outcome) = apply_criteria(&hours_table(), Some(&criteria), &index, &mut diag);
        assert_eq!(outcome, FilterOutcome::Ignored);
        assert_eq!(filtered.len(), 4);
        assert!(matches!(
            &diag.warnings()[before..],
            [Warning::NoMatchingFilterColumns { .. }]
        ));
    }

    #[test]
    fn no_matches_yields_empty_table() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let criteria = Table::from_strs("筛选条件", &["门店状态表-品牌"], &[&["喜茶"]]);
        let (filtered, outcome) = apply_criteria(&hours_table(), Some(&criteria), &index, &mut diag);
        assert!(filtered.is_empty());
        assert_eq!(outcome, FilterOutcome::Applied { before: 4, after: 0 });
    }
}
