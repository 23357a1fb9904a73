// src/rules.rs
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use thiserror::Error;

use crate::index::CertificateStatus;
use crate::schema::{certs, titles};

// --- Thresholds ---

pub const MIN_CUMULATIVE_HOURS: Decimal = dec!(40);
pub const MIN_PERIOD_HOURS: Decimal = dec!(50);
/// Entry date plus this many days must fall before the bonus month.
pub const ASSISTANT_TENURE_OFFSET_DAYS: i64 = 29;

// --- Facts ---

/// A required certificate and what the certificate index knows about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateFact {
    pub name: &'static str,
    pub status: CertificateStatus,
}

/// Everything a rule may look at for one hours row.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFacts {
    pub bonus_month_start: NaiveDate,
    pub cumulative_hours: Decimal,
    pub period_hours: Decimal,
    pub certificates: [CertificateFact; 3],
    pub entry_date: Option<NaiveDate>,
}

impl RuleFacts {
    /// Builds facts with the required certificates in their canonical order.
    pub fn new(
        bonus_month_start: NaiveDate,
        cumulative_hours: Decimal,
        period_hours: Decimal,
        certificate_status: impl Fn(&str) -> CertificateStatus,
        entry_date: Option<NaiveDate>,
    ) -> Self {
        let certificates = certs::REQUIRED.map(|name| CertificateFact {
            name,
            status: certificate_status(name),
        });
        Self {
            bonus_month_start,
            cumulative_hours,
            period_hours,
            certificates,
            entry_date,
        }
    }
}

// --- Outcomes ---

/// Why a row qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualification {
    TeaMaster { latest_certificate: NaiveDate },
    PartTimeOrIntern,
    AssistantManager { cutoff: NaiveDate },
    StoreManager,
}

impl fmt::Display for Qualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualification::TeaMaster { latest_certificate } => write!(
                f,
                "Tea master: all required certificates held (latest {})",
                latest_certificate
            ),
            Qualification::PartTimeOrIntern => {
                write!(f, "Part-time/intern: hours and certificate requirements met")
            }
            Qualification::AssistantManager { cutoff } => {
                write!(f, "Assistant manager: tenure cutoff {} reached", cutoff)
            }
            Qualification::StoreManager => write!(f, "Store manager"),
        }
    }
}

/// One unmet condition of the part-time/intern rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartTimeShortfall {
    CumulativeHours { actual: Decimal },
    NoCertificateBeforeMonth,
    PeriodHours { actual: Decimal },
}

impl fmt::Display for PartTimeShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartTimeShortfall::CumulativeHours { actual } => write!(
                f,
                "cumulative hours {} < {}",
                actual.normalize(),
                MIN_CUMULATIVE_HOURS
            ),
            PartTimeShortfall::NoCertificateBeforeMonth => {
                write!(f, "no required certificate effective before the bonus month")
            }
            PartTimeShortfall::PeriodHours { actual } => write!(
                f,
                "period hours {} < {}",
                actual.normalize(),
                MIN_PERIOD_HOURS
            ),
        }
    }
}

/// Why a row was excluded. The text is for the exclusion report only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IneligibleReason {
    #[error("Tea master: missing certificate(s) {}", .missing.join(", "))]
    TeaMasterMissingCertificates { missing: Vec<String> },
    #[error("Tea master: certificate(s) without a usable effective date {}", .undated.join(", "))]
    TeaMasterUndatedCertificates { undated: Vec<String> },
    #[error("Tea master: latest certificate {latest} is not before {bonus_month_start}")]
    TeaMasterCertificateTooRecent {
        latest: NaiveDate,
        bonus_month_start: NaiveDate,
    },
    #[error("Part-time/intern: {}", join_shortfalls(.shortfalls))]
    PartTimeRequirementsUnmet { shortfalls: Vec<PartTimeShortfall> },
    #[error("Assistant manager: missing entry date")]
    AssistantMissingEntryDate,
    #[error("Assistant manager: not seasoned enough ({cutoff} >= {bonus_month_start})")]
    AssistantTenureTooShort {
        cutoff: NaiveDate,
        bonus_month_start: NaiveDate,
    },
    #[error("Role '{title}' not covered by rules")]
    RoleNotCovered { title: String },
}

fn join_shortfalls(shortfalls: &[PartTimeShortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type RuleOutcome = Result<Qualification, IneligibleReason>;

// --- Rules ---

/// The four role-specific eligibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EligibilityRule {
    TeaMaster,
    PartTimeOrIntern,
    AssistantManager,
    StoreManager,
}

impl EligibilityRule {
    /// Titles are tested against the rules in this order; the first match wins.
    pub const DISPATCH_ORDER: [EligibilityRule; 4] = [
        EligibilityRule::TeaMaster,
        EligibilityRule::PartTimeOrIntern,
        EligibilityRule::AssistantManager,
        EligibilityRule::StoreManager,
    ];

    pub fn matches_title(self, title: &str) -> bool {
        match self {
            EligibilityRule::TeaMaster => titles::TEA_MASTER.contains(&title),
            EligibilityRule::PartTimeOrIntern => {
                title.contains(titles::PART_TIME_MARKER) || title == titles::INTERN
            }
            EligibilityRule::AssistantManager => titles::ASSISTANT_MANAGER.contains(&title),
            EligibilityRule::StoreManager => titles::STORE_MANAGER.contains(&title),
        }
    }

    pub fn for_title(title: &str) -> Option<Self> {
        let title = title.trim();
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|rule| rule.matches_title(title))
    }

    pub fn evaluate(self, facts: &RuleFacts) -> RuleOutcome {
        match self {
            EligibilityRule::TeaMaster => evaluate_tea_master(facts),
            EligibilityRule::PartTimeOrIntern => evaluate_part_time(facts),
            EligibilityRule::AssistantManager => evaluate_assistant_manager(facts),
            // Title alone decides; formal manager status is reported separately.
            EligibilityRule::StoreManager => Ok(Qualification::StoreManager),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EligibilityRule::TeaMaster => "tea-master",
            EligibilityRule::PartTimeOrIntern => "part-time-or-intern",
            EligibilityRule::AssistantManager => "assistant-manager",
            EligibilityRule::StoreManager => "store-manager",
        }
    }
}

/// Dispatches on the resolved title and evaluates the matching rule.
pub fn decide(title: &str, facts: &RuleFacts) -> (Option<EligibilityRule>, RuleOutcome) {
    match EligibilityRule::for_title(title) {
        Some(rule) => (Some(rule), rule.evaluate(facts)),
        None => (
            None,
            Err(IneligibleReason::RoleNotCovered {
                title: title.trim().to_string(),
            }),
        ),
    }
}

/// All three certificates, with the latest of their earliest dates before the month.
fn evaluate_tea_master(facts: &RuleFacts) -> RuleOutcome {
    let names_with = |wanted: fn(CertificateStatus) -> bool| -> Vec<String> {
        facts
            .certificates
            .iter()
            .filter(|c| wanted(c.status))
            .map(|c| c.name.to_string())
            .collect()
    };

    let missing = names_with(|s| s == CertificateStatus::Missing);
    if !missing.is_empty() {
        return Err(IneligibleReason::TeaMasterMissingCertificates { missing });
    }
    let undated = names_with(|s| s == CertificateStatus::Undated);
    if !undated.is_empty() {
        return Err(IneligibleReason::TeaMasterUndatedCertificates { undated });
    }

    let latest = facts
        .certificates
        .iter()
        .filter_map(|c| c.status.effective_date())
        .max()
        .ok_or_else(|| IneligibleReason::TeaMasterMissingCertificates {
            missing: certs::REQUIRED.iter().map(|n| n.to_string()).collect(),
        })?;

    if latest < facts.bonus_month_start {
        Ok(Qualification::TeaMaster {
            latest_certificate: latest,
        })
    } else {
        Err(IneligibleReason::TeaMasterCertificateTooRecent {
            latest,
            bonus_month_start: facts.bonus_month_start,
        })
    }
}

/// Cumulative hours, one certificate before the month, and period hours: all required.
fn evaluate_part_time(facts: &RuleFacts) -> RuleOutcome {
    let mut shortfalls = Vec::new();

    if facts.cumulative_hours < MIN_CUMULATIVE_HOURS {
        shortfalls.push(PartTimeShortfall::CumulativeHours {
            actual: facts.cumulative_hours,
        });
    }
    let has_certificate = facts
        .certificates
        .iter()
        .any(|c| c.status.held_before(facts.bonus_month_start));
    if !has_certificate {
        shortfalls.push(PartTimeShortfall::NoCertificateBeforeMonth);
    }
    if facts.period_hours < MIN_PERIOD_HOURS {
        shortfalls.push(PartTimeShortfall::PeriodHours {
            actual: facts.period_hours,
        });
    }

    if shortfalls.is_empty() {
        Ok(Qualification::PartTimeOrIntern)
    } else {
        Err(IneligibleReason::PartTimeRequirementsUnmet { shortfalls })
    }
}

/// More than 29 elapsed days between entry and the first day of the bonus month.
fn evaluate_assistant_manager(facts: &RuleFacts) -> RuleOutcome {
    let entry = facts
        .entry_date
        .ok_or(IneligibleReason::AssistantMissingEntryDate)?;
    let cutoff = entry
        .checked_add_signed(Duration::days(ASSISTANT_TENURE_OFFSET_DAYS))
        .ok_or(IneligibleReason::AssistantMissingEntryDate)?;

    if cutoff < facts.bonus_month_start {
        Ok(Qualification::AssistantManager { cutoff })
    } else {
        Err(IneligibleReason::AssistantTenureTooShort {
            cutoff,
            bonus_month_start: facts.bonus_month_start,
        })
    }
}
