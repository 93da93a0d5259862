//! Regulatory risk heuristics over canonical accounts.
//!
//! Each heuristic is pure and independent of the others; within one
//! heuristic tiers are checked most severe first. A heuristic that does not
//! apply (zero denominator, non-positive numerator where a positive one is
//! required) produces nothing — absence of a finding is the clean result.

use crate::aggregate::{balance_of, group_total};
use crate::ratios::FinancialSnapshot;
use crate::schema::Account;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RiskSeverity {
    Informational,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RiskUnit {
    Percentage,
    Multiple,
    Days,
    Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskFinding {
    pub code: String,
    pub title: String,
    pub account_code: String,
    pub severity: RiskSeverity,
    pub observed_value: f64,
    pub threshold_value: f64,
    pub unit: RiskUnit,
    pub legal_reference: String,
    pub explanation: String,
    pub recommendation: String,
    pub flag_for_audit: bool,
}

/// Fixed heuristic thresholds. Immutable configuration injected alongside
/// the accounts so tests and other jurisdictions can swap values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub cash_to_assets_warning: f64,
    pub cash_to_assets_critical: f64,
    pub shareholder_receivable_to_capital_warning: f64,
    pub shareholder_receivable_to_capital_critical: f64,
    pub related_party_debt_to_equity_warning: f64,
    pub related_party_debt_to_equity_critical: f64,
    pub collection_period_warning_days: f64,
    pub collection_period_critical_days: f64,
    pub inventory_period_warning_days: f64,
    pub inventory_period_critical_days: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            cash_to_assets_warning: 0.05,
            cash_to_assets_critical: 0.15,
            shareholder_receivable_to_capital_warning: 0.10,
            shareholder_receivable_to_capital_critical: 0.50,
            related_party_debt_to_equity_warning: 2.0,
            related_party_debt_to_equity_critical: 3.0,
            collection_period_warning_days: 120.0,
            collection_period_critical_days: 240.0,
            inventory_period_warning_days: 180.0,
            inventory_period_critical_days: 365.0,
        }
    }
}

/// Accounts that must never carry a debit balance: trade and related-party
/// payables plus withholding/VAT liabilities.
const CREDIT_NORMAL_CODES: &[&str] = &["320", "321", "329", "331", "336", "340", "360", "361"];

/// Evaluate the full heuristic battery. Findings come back in evaluation
/// order; heuristics never see each other's output.
pub fn evaluate_risks(accounts: &[Account], thresholds: &RiskThresholds) -> Vec<RiskFinding> {
    let snapshot = FinancialSnapshot::from_accounts(accounts);
    let mut findings = Vec::new();

    findings.extend(check_cash(accounts, &snapshot, thresholds));
    findings.extend(check_shareholder_receivables(accounts, &snapshot, thresholds));
    findings.extend(check_related_party_debt(accounts, &snapshot, thresholds));
    findings.extend(check_collection_period(&snapshot, thresholds));
    findings.extend(check_inventory_period(&snapshot, thresholds));
    findings.extend(check_abnormal_balance_direction(accounts));

    debug!("Risk evaluation produced {} findings", findings.len());
    findings
}

/// A negative cash balance is a data-integrity failure and always critical,
/// regardless of the cash/assets ratio. Otherwise a disproportionate cash
/// holding signals undocumented outflows taxed as deemed distributions.
fn check_cash(
    accounts: &[Account],
    snapshot: &FinancialSnapshot,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    let cash = balance_of(accounts, "100");

    if cash < 0.0 {
        return Some(RiskFinding {
            code: "KASA-01".to_string(),
            title: "Kasa hesabı negatif bakiye veriyor".to_string(),
            account_code: "100".to_string(),
            severity: RiskSeverity::Critical,
            observed_value: cash,
            threshold_value: 0.0,
            unit: RiskUnit::Amount,
            legal_reference: "VUK md. 30".to_string(),
            explanation: "The cash account closed with a credit balance, which is physically \
                          impossible and indicates unrecorded revenue or misposted payments."
                .to_string(),
            recommendation: "Reconcile cash movements day by day and locate the entries that \
                             pushed the balance negative before the period is closed."
                .to_string(),
            flag_for_audit: true,
        });
    }

    if snapshot.total_assets <= 0.0 {
        return None;
    }
    let ratio = cash / snapshot.total_assets;
    let (severity, threshold) = if ratio > thresholds.cash_to_assets_critical {
        (RiskSeverity::Critical, thresholds.cash_to_assets_critical)
    } else if ratio > thresholds.cash_to_assets_warning {
        (RiskSeverity::Warning, thresholds.cash_to_assets_warning)
    } else {
        return None;
    };

    Some(RiskFinding {
        code: "KASA-02".to_string(),
        title: "Kasa bakiyesi aktif toplamına göre yüksek".to_string(),
        account_code: "100".to_string(),
        severity,
        observed_value: ratio * 100.0,
        threshold_value: threshold * 100.0,
        unit: RiskUnit::Percentage,
        legal_reference: "KVK md. 13".to_string(),
        explanation: "An unusually large share of total assets is held as physical cash, a \
                      pattern tax inspectors treat as a proxy for undeclared shareholder \
                      withdrawals subject to deemed interest."
            .to_string(),
        recommendation: "Document the business need for the cash balance or sweep it into bank \
                         accounts; book deemed interest for any shareholder use."
            .to_string(),
        flag_for_audit: severity == RiskSeverity::Critical,
    })
}

/// Net receivable from shareholders against paid-in capital. Only
/// evaluated when the position is a net receivable.
fn check_shareholder_receivables(
    accounts: &[Account],
    snapshot: &FinancialSnapshot,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    let receivable = group_total(accounts, "131") + group_total(accounts, "231");
    let payable = -(group_total(accounts, "331") + group_total(accounts, "431"));
    let net_receivable = receivable - payable;
    if net_receivable <= 0.0 || snapshot.paid_in_capital <= 0.0 {
        return None;
    }

    let ratio = net_receivable / snapshot.paid_in_capital;
    let (severity, threshold) = if ratio > thresholds.shareholder_receivable_to_capital_critical {
        (
            RiskSeverity::Critical,
            thresholds.shareholder_receivable_to_capital_critical,
        )
    } else if ratio > thresholds.shareholder_receivable_to_capital_warning {
        (
            RiskSeverity::Warning,
            thresholds.shareholder_receivable_to_capital_warning,
        )
    } else {
        return None;
    };

    Some(RiskFinding {
        code: "ORTAK-01".to_string(),
        title: "Ortaklardan net alacak sermayeye göre yüksek".to_string(),
        account_code: "131".to_string(),
        severity,
        observed_value: ratio * 100.0,
        threshold_value: threshold * 100.0,
        unit: RiskUnit::Percentage,
        legal_reference: "TTK md. 358".to_string(),
        explanation: "Shareholders owe the company more than the statutory comfort level \
                      relative to paid-in capital; borrowing from the company is restricted \
                      unless capital commitments are fully paid."
            .to_string(),
        recommendation: "Collect or formally document shareholder balances and apply arm's \
                         length interest to the outstanding amount."
            .to_string(),
        flag_for_audit: true,
    })
}

/// Related-party borrowings against equity (thin capitalization).
fn check_related_party_debt(
    accounts: &[Account],
    snapshot: &FinancialSnapshot,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    let debt = -(group_total(accounts, "331")
        + group_total(accounts, "431")
        + group_total(accounts, "336")
        + group_total(accounts, "436"));
    if debt <= 0.0 || snapshot.equity <= 0.0 {
        return None;
    }

    let ratio = debt / snapshot.equity;
    let (severity, threshold) = if ratio > thresholds.related_party_debt_to_equity_critical {
        (
            RiskSeverity::Critical,
            thresholds.related_party_debt_to_equity_critical,
        )
    } else if ratio > thresholds.related_party_debt_to_equity_warning {
        (
            RiskSeverity::Warning,
            thresholds.related_party_debt_to_equity_warning,
        )
    } else {
        return None;
    };

    Some(RiskFinding {
        code: "SERMAYE-01".to_string(),
        title: "İlişkili taraf borçları özkaynakları aşıyor".to_string(),
        account_code: "331".to_string(),
        severity,
        observed_value: ratio,
        threshold_value: threshold,
        unit: RiskUnit::Multiple,
        legal_reference: "KVK md. 12".to_string(),
        explanation: "Borrowings from shareholders and related parties exceed the equity \
                      multiple beyond which the excess is treated as disguised capital and \
                      its interest is non-deductible."
            .to_string(),
        recommendation: "Convert the excess related-party debt to capital or repay it before \
                         the fiscal year closes."
            .to_string(),
        flag_for_audit: true,
    })
}

fn check_collection_period(
    snapshot: &FinancialSnapshot,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    if snapshot.net_sales <= 0.0 || snapshot.trade_receivables <= 0.0 {
        return None;
    }
    let days = snapshot.trade_receivables / snapshot.net_sales * 365.0;
    let (severity, threshold) = if days > thresholds.collection_period_critical_days {
        (
            RiskSeverity::Critical,
            thresholds.collection_period_critical_days,
        )
    } else if days > thresholds.collection_period_warning_days {
        (
            RiskSeverity::Warning,
            thresholds.collection_period_warning_days,
        )
    } else {
        return None;
    };

    Some(RiskFinding {
        code: "ALACAK-01".to_string(),
        title: "Alacak tahsil süresi uzun".to_string(),
        account_code: "120".to_string(),
        severity,
        observed_value: days,
        threshold_value: threshold,
        unit: RiskUnit::Days,
        legal_reference: "VUK md. 323".to_string(),
        explanation: "Trade receivables are outstanding far longer than the sales cycle \
                      implies; aged receivables may require doubtful-receivable provisioning."
            .to_string(),
        recommendation: "Age the receivable ledger, start collection proceedings where \
                         justified, and book provisions for balances under legal follow-up."
            .to_string(),
        flag_for_audit: severity == RiskSeverity::Critical,
    })
}

fn check_inventory_period(
    snapshot: &FinancialSnapshot,
    thresholds: &RiskThresholds,
) -> Option<RiskFinding> {
    if snapshot.cost_of_goods_sold <= 0.0 || snapshot.inventory <= 0.0 {
        return None;
    }
    let days = snapshot.inventory / snapshot.cost_of_goods_sold * 365.0;
    let (severity, threshold) = if days > thresholds.inventory_period_critical_days {
        (
            RiskSeverity::Critical,
            thresholds.inventory_period_critical_days,
        )
    } else if days > thresholds.inventory_period_warning_days {
        (
            RiskSeverity::Warning,
            thresholds.inventory_period_warning_days,
        )
    } else {
        return None;
    };

    Some(RiskFinding {
        code: "STOK-01".to_string(),
        title: "Stok tutma süresi uzun".to_string(),
        account_code: "153".to_string(),
        severity,
        observed_value: days,
        threshold_value: threshold,
        unit: RiskUnit::Days,
        legal_reference: "VUK md. 274".to_string(),
        explanation: "Inventory turns over far slower than the cost of sales implies, \
                      pointing at obsolete stock or fictitious inventory kept on the books."
            .to_string(),
        recommendation: "Run a physical count, write impaired stock down to net realizable \
                         value, and investigate items without movement."
            .to_string(),
        flag_for_audit: severity == RiskSeverity::Critical,
    })
}

/// Credit-normal accounts reporting a debit balance. Fixed severity,
/// independent of magnitude.
fn check_abnormal_balance_direction(accounts: &[Account]) -> Vec<RiskFinding> {
    accounts
        .iter()
        .filter(|account| {
            account.debit_balance > 0.0
                && CREDIT_NORMAL_CODES
                    .iter()
                    .any(|code| account.code == *code || account.code.starts_with(&format!("{}.", code)))
        })
        .map(|account| RiskFinding {
            code: "TERS-01".to_string(),
            title: format!("{} hesabı ters bakiye veriyor", account.code),
            account_code: account.code.clone(),
            severity: RiskSeverity::Warning,
            observed_value: account.debit_balance,
            threshold_value: 0.0,
            unit: RiskUnit::Amount,
            legal_reference: "Tek Düzen Hesap Planı".to_string(),
            explanation: "A normally credit-balance account closed on the debit side, which \
                          usually means advances or offsets were posted to the wrong account."
                .to_string(),
            recommendation: "Reclassify the debit portion to the matching advance or \
                             receivable account."
                .to_string(),
            flag_for_audit: true,
        })
        .collect()
}
