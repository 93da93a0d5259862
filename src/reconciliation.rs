//! Root-cause classification for balance reconciliation differences.
//!
//! One account's balance as reported by the internal ledger and by an
//! external counterpart goes through an ordered decision tree; exactly one
//! of seven mutually exclusive categories comes out. The tree is a total
//! function: every input reaches a terminal category.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rounding steps a difference may legitimately land on (kuruş rounding and
/// whole-lira truncation), each matched within ±0.005.
pub const ROUNDING_INCREMENTS: &[f64] = &[0.01, 0.02, 0.05, 0.10, 0.20, 0.25, 0.50, 1.00];

const ROUNDING_INCREMENT_EPSILON: f64 = 0.005;

/// Chart-of-accounts prefixes of the receivable classes subject to
/// doubtful-receivable provisioning.
pub const RECEIVABLE_CLASS_PREFIXES: &[&str] = &["12", "22"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReconciliationInput {
    pub account_code: String,
    pub internal_balance: f64,
    pub external_balance: f64,
    /// Days the balance has remained outstanding.
    pub aging_days: u32,
    pub last_internal_movement_date: Option<NaiveDate>,
    pub period_end_date: Option<NaiveDate>,
}

impl ReconciliationInput {
    pub fn difference(&self) -> f64 {
        (self.internal_balance - self.external_balance).abs()
    }

    /// Difference relative to the internal figure, as a percentage. Zero
    /// when the internal balance is zero.
    pub fn difference_pct(&self) -> f64 {
        if self.internal_balance == 0.0 {
            0.0
        } else {
            self.difference() / self.internal_balance.abs() * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationThresholds {
    /// Differences at or below this are a match.
    pub tolerance: f64,
    /// Aging beyond this makes a receivable doubtful.
    pub doubtful_days_threshold: u32,
    /// Maximum day gap between last movement and period end for a cut-off
    /// timing call.
    pub cutoff_window_days: i64,
    /// Differences at or below this are candidates for rounding.
    pub rounding_threshold: f64,
}

impl Default for ReconciliationThresholds {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            doubtful_days_threshold: 365,
            cutoff_window_days: 5,
            rounding_threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RootCause {
    #[schemars(description = "Balances agree within tolerance")]
    Matched,

    #[schemars(description = "Internal balance present but the counterpart reports nothing")]
    ExternalSourceMissing,

    #[schemars(description = "Counterpart reports a balance the ledger never recorded")]
    UnrecordedMovement,

    #[schemars(description = "Movement recorded on the other side of the period boundary")]
    PeriodCutoffTiming,

    #[schemars(description = "Difference sits on a canonical rounding increment")]
    Rounding,

    #[schemars(description = "Aged receivable past the statutory doubtful threshold")]
    DoubtfulReceivable,

    #[schemars(description = "No rule matched; manual investigation required")]
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CauseConfidence {
    Certain,
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RootCauseResult {
    pub category: RootCause,
    pub confidence: CauseConfidence,
    pub explanation: String,
}

fn is_rounding_increment(difference: f64) -> bool {
    ROUNDING_INCREMENTS
        .iter()
        .any(|step| (difference - step).abs() <= ROUNDING_INCREMENT_EPSILON)
}

/// Classify why two independently reported balances disagree. Ordered
/// rules, first match wins; exactly one category per evaluation.
pub fn classify_root_cause(
    input: &ReconciliationInput,
    thresholds: &ReconciliationThresholds,
) -> RootCauseResult {
    let difference = input.difference();

    if difference <= thresholds.tolerance {
        return RootCauseResult {
            category: RootCause::Matched,
            confidence: CauseConfidence::Certain,
            explanation: format!(
                "Balances agree within the {:.2} tolerance (difference {:.2}).",
                thresholds.tolerance, difference
            ),
        };
    }

    if input.internal_balance.abs() > thresholds.tolerance && input.external_balance == 0.0 {
        return RootCauseResult {
            category: RootCause::ExternalSourceMissing,
            confidence: CauseConfidence::Certain,
            explanation: format!(
                "The ledger carries {:.2} but the counterpart reports no balance at all; the \
                 external side is missing or was never requested.",
                input.internal_balance
            ),
        };
    }

    if input.internal_balance == 0.0 && input.external_balance.abs() > thresholds.tolerance {
        return RootCauseResult {
            category: RootCause::UnrecordedMovement,
            confidence: CauseConfidence::Certain,
            explanation: format!(
                "The counterpart reports {:.2} while the ledger shows nothing; a movement was \
                 never recorded internally.",
                input.external_balance
            ),
        };
    }

    if let (Some(movement), Some(period_end)) =
        (input.last_internal_movement_date, input.period_end_date)
    {
        let gap_days = (period_end - movement).num_days().abs();
        if gap_days <= thresholds.cutoff_window_days {
            return RootCauseResult {
                category: RootCause::PeriodCutoffTiming,
                confidence: CauseConfidence::Estimated,
                explanation: format!(
                    "The last internal movement on {} falls within {} days of the period end \
                     {}; the two sources likely booked it in different periods.",
                    movement, gap_days, period_end
                ),
            };
        }
    }

    if difference <= thresholds.rounding_threshold && is_rounding_increment(difference) {
        return RootCauseResult {
            category: RootCause::Rounding,
            confidence: CauseConfidence::Certain,
            explanation: format!(
                "The difference of {:.2} sits on a canonical rounding increment.",
                difference
            ),
        };
    }

    if input.aging_days > thresholds.doubtful_days_threshold
        && RECEIVABLE_CLASS_PREFIXES
            .iter()
            .any(|prefix| input.account_code.starts_with(prefix))
    {
        return RootCauseResult {
            category: RootCause::DoubtfulReceivable,
            confidence: CauseConfidence::Certain,
            explanation: format!(
                "Receivable {} has been outstanding for {} days, past the {}-day doubtful \
                 threshold.",
                input.account_code, input.aging_days, thresholds.doubtful_days_threshold
            ),
        };
    }

    RootCauseResult {
        category: RootCause::Undetermined,
        confidence: CauseConfidence::Estimated,
        explanation: format!(
            "A difference of {:.2} ({:.1}% of the internal balance) matched no known cause; \
             manual investigation required.",
            difference,
            input.difference_pct()
        ),
    }
}
