// src/index.rs
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{Diagnostics, Warning};
use crate::normalize::{dedupe_by_key, first_positions, parse_date};
use crate::schema::{certs, managers, master, stores};
use crate::table::{Cell, Row, Table};

// --- Keyed Lookups ---

/// A deduplicated table with O(1) lookup by its key column.
///
/// Keys compare by their native `Cell` value. The first row for a key wins.
#[derive(Debug, Clone, Default)]
pub struct KeyedTable {
    table: Table,
    key_column: Option<String>,
    positions: HashMap<Cell, usize>,
}

impl KeyedTable {
    pub fn build(table: &Table, key_column: &str, diag: &mut Diagnostics) -> Self {
        if !table.has_column(key_column) {
            diag.warn(Warning::MissingColumn {
                table: table.name().to_string(),
                column: key_column.to_string(),
            });
            return Self::empty(table.name());
        }
        let deduped = dedupe_by_key(table, key_column, diag);
        let positions = first_positions(&deduped, key_column);
        debug!(
            "Indexed {} keys from '{}' on '{}'",
            positions.len(),
            table.name(),
            key_column
        );
        Self {
            table: deduped,
            key_column: Some(key_column.to_string()),
            positions,
        }
    }

    pub fn empty(name: &str) -> Self {
        Self {
            table: Table::new(name, Vec::new()),
            key_column: None,
            positions: HashMap::new(),
        }
    }

    pub fn get(&self, key: &Cell) -> Option<Row<'_>> {
        if key.is_blank() {
            return None;
        }
        self.positions.get(key).and_then(|&i| self.table.row(i))
    }

    /// Non-blank value of `column` for the row keyed by `key`.
    pub fn field(&self, key: &Cell, column: &str) -> Option<&Cell> {
        self.get(key).and_then(|row| row.value(column))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// --- Store Manager Membership ---

/// Which employee is the designated manager of which store.
///
/// Both key parts are compared as trimmed strings so a numeric store code in
/// one table still matches a textual one in another.
#[derive(Debug, Clone, Default)]
pub struct ManagerMembership {
    pairs: HashSet<(String, String)>,
}

impl ManagerMembership {
    pub fn build(table: &Table) -> Self {
        let pairs = table
            .rows()
            .filter_map(|row| {
                let store = row.value(managers::STORE_CODE)?.key_string();
                let employee = row.value(managers::MANAGER_ID)?.key_string();
                Some((store, employee))
            })
            .collect();
        Self { pairs }
    }

    pub fn contains(&self, store_code: &Cell, employee_id: &Cell) -> bool {
        if store_code.is_blank() || employee_id.is_blank() {
            return false;
        }
        self.pairs
            .contains(&(store_code.key_string(), employee_id.key_string()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// --- Certificates ---

/// What the certificate table says about one (employee, certificate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    /// Valid grant; earliest usable effective date.
    Held(NaiveDate),
    /// Valid grant exists but none of its rows carries a usable date.
    Undated,
    Missing,
}

impl CertificateStatus {
    pub fn effective_date(self) -> Option<NaiveDate> {
        match self {
            CertificateStatus::Held(date) => Some(date),
            _ => None,
        }
    }

    /// Held with an effective date strictly before `cutoff`.
    pub fn held_before(self, cutoff: NaiveDate) -> bool {
        matches!(self, CertificateStatus::Held(date) if date < cutoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateMode {
    /// Dates come from the effective-date column.
    Dated,
    /// The table has no effective-date column; valid grants are dated at the sentinel.
    Undated,
}

pub fn undated_certificate_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone)]
pub struct CertificateIndex {
    mode: CertificateMode,
    grants: HashMap<Cell, BTreeMap<String, Option<NaiveDate>>>,
}

impl Default for CertificateIndex {
    fn default() -> Self {
        Self {
            mode: CertificateMode::Dated,
            grants: HashMap::new(),
        }
    }
}

impl CertificateIndex {
    /// Folds every valid grant into the earliest date per (employee, certificate).
    pub fn build(table: &Table, diag: &mut Diagnostics) -> Self {
        for column in [certs::EMPLOYEE_ID, certs::NAME, certs::STATUS] {
            if !table.has_column(column) {
                diag.warn(Warning::MissingColumn {
                    table: table.name().to_string(),
                    column: column.to_string(),
                });
                return Self::default();
            }
        }

        let mode = if table.has_column(certs::EFFECTIVE_DATE) {
            CertificateMode::Dated
        } else {
            diag.warn(Warning::CertificateDatesUnavailable {
                table: table.name().to_string(),
                column: certs::EFFECTIVE_DATE.to_string(),
                sentinel: undated_certificate_sentinel(),
            });
            CertificateMode::Undated
        };

        let mut grants: HashMap<Cell, BTreeMap<String, Option<NaiveDate>>> = HashMap::new();
        let valid_rows = table
            .rows()
            .filter(|row| row.get(certs::STATUS).as_text().as_deref() == Some(certs::VALID_STATUS));

        for row in valid_rows {
            let (Some(employee), Some(name)) =
                (row.value(certs::EMPLOYEE_ID), row.get(certs::NAME).as_text())
            else {
                continue;
            };
            let date = match mode {
                CertificateMode::Dated => parse_date(row.get(certs::EFFECTIVE_DATE)),
                CertificateMode::Undated => Some(undated_certificate_sentinel()),
            };
            let slot = grants
                .entry(employee.clone())
                .or_default()
                .entry(name)
                .or_insert(None);
            *slot = earliest(*slot, date);
        }

        let undated = grants
            .values()
            .flat_map(|by_name| by_name.values())
            .filter(|date| date.is_none())
            .count();
        if undated > 0 {
            diag.warn(Warning::UndatedCertificates {
                table: table.name().to_string(),
                count: undated,
            });
        }

        info!(
            "Indexed valid certificates for {} employees ({:?} mode)",
            grants.len(),
            mode
        );
        Self { mode, grants }
    }

    pub fn mode(&self) -> CertificateMode {
        self.mode
    }

    pub fn status(&self, employee_id: &Cell, certificate: &str) -> CertificateStatus {
        match self
            .grants
            .get(employee_id)
            .and_then(|by_name| by_name.get(certificate))
        {
            Some(Some(date)) => CertificateStatus::Held(*date),
            Some(None) => CertificateStatus::Undated,
            None => CertificateStatus::Missing,
        }
    }

    pub fn employee_count(&self) -> usize {
        self.grants.len()
    }
}

fn earliest(current: Option<NaiveDate>, candidate: Option<NaiveDate>) -> Option<NaiveDate> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

// --- Reference Index ---

/// Every lookup the classifier and projector need, built once per run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    pub master: KeyedTable,
    pub stores: KeyedTable,
    pub managers: KeyedTable,
    pub roster: KeyedTable,
    pub membership: ManagerMembership,
    pub certificates: CertificateIndex,
}

/// Tables the index is built from. Absent tables yield empty lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceTables<'a> {
    pub master: Option<&'a Table>,
    pub stores: Option<&'a Table>,
    pub managers: Option<&'a Table>,
    pub roster: Option<&'a Table>,
    pub certificates: Option<&'a Table>,
}

impl ReferenceIndex {
    pub fn build(tables: ReferenceTables<'_>, diag: &mut Diagnostics) -> Self {
        let master = match tables.master {
            Some(t) => KeyedTable::build(t, master::EMPLOYEE_ID, diag),
            None => KeyedTable::empty(master::TABLE),
        };
        let roster = match tables.roster {
            Some(t) => KeyedTable::build(t, master::EMPLOYEE_ID, diag),
            None => KeyedTable::empty(master::ROSTER_TABLE),
        };
        let stores = match tables.stores {
            Some(t) => build_store_index(t, diag),
            None => KeyedTable::empty(stores::TABLE),
        };
        let (managers, membership) = match tables.managers {
            Some(t) => (
                KeyedTable::build(t, managers::STORE_CODE, diag),
                ManagerMembership::build(t),
            ),
            None => (
                KeyedTable::empty(managers::TABLE),
                ManagerMembership::default(),
            ),
        };
        let certificates = match tables.certificates {
            Some(t) => CertificateIndex::build(t, diag),
            None => CertificateIndex::default(),
        };

        info!(
            "Reference index ready: {} employees, {} roster entries, {} stores, {} store managers",
            master.len(),
            roster.len(),
            stores.len(),
            membership.len()
        );

        Self {
            master,
            stores,
            managers,
            roster,
            membership,
            certificates,
        }
    }
}

/// Store status keyed by the canonical code column, or its alias when the
/// canonical one is absent. Neither present means an empty index.
fn build_store_index(table: &Table, diag: &mut Diagnostics) -> KeyedTable {
    match [stores::STORE_CODE, stores::STORE_CODE_ALIAS]
        .into_iter()
        .find(|column| table.has_column(column))
    {
        Some(column) => KeyedTable::build(table, column, diag),
        None => {
            diag.warn(Warning::MissingColumn {
                table: table.name().to_string(),
                column: stores::STORE_CODE.to_string(),
            });
            KeyedTable::empty(table.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn keyed_table_keeps_first_occurrence() {
        let table = Table::from_strs(
            "基本数据",
            &["工号", "入职日期"],
            &[&["1001", "2025-01-01"], &["1001", "2025-06-01"]],
        );
        let mut diag = Diagnostics::new();
        let index = KeyedTable::build(&table, "工号", &mut diag);
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.field(&Cell::text("1001"), "入职日期"),
            Some(&Cell::text("2025-01-01"))
        );
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn store_index_falls_back_to_alias_column() {
        let table = Table::from_strs("门店状态表", &["门店编码", "品牌"], &[&["S01", "奈雪"]]);
        let mut diag = Diagnostics::new();
        let index = build_store_index(&table, &mut diag);
        assert_eq!(index.key_column(), Some("门店编码"));
        assert_eq!(index.field(&Cell::text("S01"), "品牌"), Some(&Cell::text("奈雪")));
        assert!(diag.is_empty());
    }

    #[test]
    fn store_index_prefers_canonical_column() {
        let table = Table::from_strs(
            "门店状态表",
            &["门店编码", "ERP门店编码", "品牌"],
            &[&["OLD", "S01", "奈雪"]],
        );
        let mut diag = Diagnostics::new();
        let index = build_store_index(&table, &mut diag);
        assert_eq!(index.key_column(), Some("ERP门店编码"));
        assert!(index.get(&Cell::text("OLD")).is_none());
    }

    #[test]
    fn store_index_without_key_column_is_empty() {
        let table = Table::from_strs("门店状态表", &["品牌"], &[&["奈雪"]]);
        let mut diag = Diagnostics::new();
        let index = build_store_index(&table, &mut diag);
        assert!(index.is_empty());
        assert!(matches!(diag.warnings(), [Warning::MissingColumn { .. }]));
    }

    #[test]
    fn membership_normalizes_whitespace_and_types() {
        let table = Table::from_strs("门店负责人", &["部门编号", "店长"], &[&[" S01 ", "1001 "]]);
        let membership = ManagerMembership::build(&table);
        assert!(membership.contains(&Cell::text("S01"), &Cell::text("1001")));
        assert!(membership.contains(
            &Cell::text("S01"),
            &Cell::Number(rust_decimal_macros::dec!(1001))
        ));
        assert!(!membership.contains(&Cell::text("S02"), &Cell::text("1001")));
        assert!(!membership.contains(&Cell::Empty, &Cell::Empty));
    }

    #[test]
    fn certificates_keep_earliest_valid_date() {
        let table = Table::from_strs(
            "过岗数据",
            &["工号", "证书名称", "状态", "生效日期"],
            &[
                &["1001", "【奈雪】水吧岗证书", "有效", "2025-05-01"],
                &["1001", "【奈雪】水吧岗证书", "有效", "2025-03-01"],
                &["1001", "【奈雪】水吧岗证书", "失效", "2024-01-01"],
                &["1001", "【奈雪】后厨岗证书", "失效", "2024-01-01"],
            ],
        );
        let mut diag = Diagnostics::new();
        let index = CertificateIndex::build(&table, &mut diag);
        let emp = Cell::text("1001");
        assert_eq!(index.mode(), CertificateMode::Dated);
        assert_eq!(
            index.status(&emp, "【奈雪】水吧岗证书"),
            CertificateStatus::Held(d(2025, 3, 1))
        );
        assert_eq!(index.status(&emp, "【奈雪】后厨岗证书"), CertificateStatus::Missing);
        assert!(diag.is_empty());
    }

    #[test]
    fn unparseable_certificate_date_is_undated_not_held() {
        let table = Table::from_strs(
            "过岗数据",
            &["工号", "证书名称", "状态", "生效日期"],
            &[
                &["1001", "【奈雪】水吧岗证书", "有效", "soon"],
                &["1002", "【奈雪】水吧岗证书", "有效", "bad"],
                &["1002", "【奈雪】水吧岗证书", "有效", "2025-02-01"],
            ],
        );
        let mut diag = Diagnostics::new();
        let index = CertificateIndex::build(&table, &mut diag);
        let status = index.status(&Cell::text("1001"), "【奈雪】水吧岗证书");
        assert_eq!(status, CertificateStatus::Undated);
        assert!(!status.held_before(d(2099, 1, 1)));
        assert_eq!(
            index.status(&Cell::text("1002"), "【奈雪】水吧岗证书"),
            CertificateStatus::Held(d(2025, 2, 1))
        );
        assert!(matches!(
            diag.warnings(),
            [Warning::UndatedCertificates { count: 1, .. }]
        ));
    }

    #[test]
    fn missing_date_column_uses_sentinel() {
        let table = Table::from_strs(
            "过岗数据",
            &["工号", "证书名称", "状态"],
            &[&["1001", "【奈雪】后厨岗证书", "有效"]],
        );
        let mut diag = Diagnostics::new();
        let index = CertificateIndex::build(&table, &mut diag);
        assert_eq!(index.mode(), CertificateMode::Undated);
        assert_eq!(
            index.status(&Cell::text("1001"), "【奈雪】后厨岗证书"),
            CertificateStatus::Held(undated_certificate_sentinel())
        );
        assert!(matches!(
            diag.warnings(),
            [Warning::CertificateDatesUnavailable { .. }]
        ));
    }
}
