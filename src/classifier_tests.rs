// src/classifier_tests.rs

#[cfg(test)]
mod tests {
    use crate::classifier::*;
    use crate::error::Diagnostics;
    use crate::hours::HoursAggregate;
    use crate::index::{ReferenceIndex, ReferenceTables};
    use crate::rules::{EligibilityRule, IneligibleReason, PartTimeShortfall};
    use crate::table::{Cell, Table};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn month_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
    }

    fn hours_table() -> Table {
        Table::from_strs(
            "工时数据",
            &["工号", "姓名", "职位名称", "门店编码", "总工时", "考勤工时"],
            &[
                // part-timer split across two stores: 25 + 20 cumulative, 30 + 25 period
                &["2001", "王五", "兼职", "S01", "25", "30"],
                &["2001", "王五", "兼职", "S02", "20", "25"],
                &["2002", "赵六", "兼职", "S01", "39", "60"],
                // title comes from master data, not from this row
                &["2003", "", "兼职", "S01", "0", "0"],
                &["2004", "孙七", "区域督导", "S02", "100", "100"],
                &["2005", "", "", "S02", "100", "100"],
            ],
        )
    }

    fn reference_index(diag: &mut Diagnostics) -> ReferenceIndex {
        let master = Table::from_strs(
            "基本数据",
            &["工号", "姓名", "职位", "入职日期"],
            &[
                &["2003", "周八", "副店长", "2025-09-15"],
                &["2005", "吴九", "", ""],
            ],
        );
        let roster = Table::from_strs("花名册", &["工号", "职位"], &[&["2005", "店长"]]);
        let certificates = Table::from_strs(
            "过岗数据",
            &["工号", "证书名称", "状态", "生效日期"],
            &[
                &["2001", "【奈雪】水吧岗证书", "有效", "2025-08-01"],
                &["2002", "【奈雪】水吧岗证书", "有效", "2025-08-01"],
            ],
        );
        ReferenceIndex::build(
            ReferenceTables {
                master: Some(&master),
                roster: Some(&roster),
                certificates: Some(&certificates),
                ..Default::default()
            },
            diag,
        )
    }

    fn classify_all() -> Vec<EligibilityDecision> {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let table = hours_table();
        let hours = HoursAggregate::from_table(&table, &mut diag);
        Classifier::new(&index, &hours, month_start()).classify(&table)
    }

    #[test]
    fn test_decisions_follow_row_order() {
        let decisions = classify_all();
        let rows: Vec<usize> = decisions.iter().map(|d| d.row_index).collect();
        assert_eq!(rows, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_multi_store_hours_are_aggregated_per_employee() {
        let decisions = classify_all();
        for decision in &decisions[..2] {
            assert_eq!(decision.cumulative_hours, dec!(45));
            assert_eq!(decision.period_hours, dec!(55));
            assert!(decision.is_eligible(), "{}", decision.reason());
        }
        assert_eq!(decisions[0].store_code, Cell::text("S01"));
        assert_eq!(decisions[1].store_code, Cell::text("S02"));
    }

    #[test]
    fn test_part_timer_short_on_cumulative_hours_is_excluded() {
        let decision = &classify_all()[2];
        assert_eq!(decision.rule, Some(EligibilityRule::PartTimeOrIntern));
        assert_eq!(
            decision.outcome,
            Err(IneligibleReason::PartTimeRequirementsUnmet {
                shortfalls: vec![PartTimeShortfall::CumulativeHours { actual: dec!(39) }]
            })
        );
    }

    #[test]
    fn test_master_title_and_name_override_hours_row() {
        let decision = &classify_all()[3];
        assert_eq!(decision.title, "副店长");
        assert_eq!(decision.name, Cell::text("周八"));
        assert_eq!(decision.rule, Some(EligibilityRule::AssistantManager));
        // 2025-09-15 + 29 days = 2025-10-14, before the month start
        assert!(decision.is_eligible());
    }

    #[test]
    fn test_uncovered_title_is_excluded_with_reason() {
        let decision = &classify_all()[4];
        assert_eq!(decision.rule, None);
        assert_eq!(decision.reason(), "Role '区域督导' not covered by rules");
    }

    #[test]
    fn test_roster_fills_blank_master_title() {
        let decision = &classify_all()[5];
        assert_eq!(decision.title, "店长");
        assert_eq!(decision.name, Cell::text("吴九"));
        assert_eq!(decision.rule, Some(EligibilityRule::StoreManager));
        assert!(decision.is_eligible());
    }

    #[test]
    fn test_classify_row_matches_batch() {
        let mut diag = Diagnostics::new();
        let index = reference_index(&mut diag);
        let table = hours_table();
        let hours = HoursAggregate::from_table(&table, &mut diag);
        let classifier = Classifier::new(&index, &hours, month_start());
        assert_eq!(classifier.bonus_month_start(), month_start());

        let batch = classifier.classify(&table);
        let single = classifier.classify_row(table.row(3).unwrap());
        assert_eq!(single, batch[3]);
    }
}
