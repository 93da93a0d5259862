//! # Mizan Audit
//!
//! A library for normalizing heterogeneous bookkeeping exports and
//! classifying financial anomalies in an accounting-audit workflow.
//!
//! ## Core Concepts
//!
//! - **Classification**: uploaded files are typed by name and content
//!   sample (trial balance, e-Defter, e-Fatura, declaration, statement);
//!   unrecognized content degrades to `Unknown`, never an error
//! - **Normalization**: trial balance grids from ~8 bookkeeping dialects
//!   are parsed into canonical [`Account`] records through a typed
//!   [`ColumnMapping`](parser::ColumnMapping)
//! - **Analysis**: a fixed battery of financial ratios and regulatory risk
//!   heuristics runs over the canonical accounts
//! - **Reconciliation**: the same balance reported by two sources goes
//!   through a seven-way root-cause decision tree
//!
//! Every component is a pure function over its inputs; the only
//! process-wide data is the immutable [`BankRegistry`].
//!
//! ## Example
//!
//! ```rust
//! use mizan_audit::*;
//!
//! let grid: RawGrid = vec![
//!     vec!["Hesap Kodu".into(), "Hesap Adı".into(), "Borç".into(), "Alacak".into()],
//!     vec!["100".into(), "Kasa".into(), "1500.50".into(), "0".into()],
//! ];
//!
//! let report = analyze_trial_balance(&grid, &RiskThresholds::default()).unwrap();
//! assert_eq!(report.trial_balance.accounts[0].code, "100");
//! ```

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod evidence;
pub mod numeric;
pub mod parser;
pub mod ratios;
pub mod reconciliation;
pub mod registry;
pub mod risk;
pub mod schema;

pub use aggregate::{balance_of, group_total};
pub use classifier::{classify, ContentSample};
pub use error::{AuditError, Result};
pub use evidence::{EvidenceBundle, EvidenceState};
pub use numeric::{parse_locale_number, parse_numeric_cell, NumericIssue};
pub use parser::{parse_trial_balance, TrialBalance, TrialBalanceTotals};
pub use ratios::{compute_ratios, RatioCategory, RatioResult, RatioStatus, RatioUnit};
pub use reconciliation::{
    classify_root_cause, CauseConfidence, ReconciliationInput, ReconciliationThresholds,
    RootCause, RootCauseResult,
};
pub use registry::{BankRegistry, Institution};
pub use risk::{evaluate_risks, RiskFinding, RiskSeverity, RiskThresholds, RiskUnit};
pub use schema::{
    Account, Cell, ClassificationDetails, ClassificationResult, Dialect, DocumentType, RawGrid,
};

use log::info;
use serde::{Deserialize, Serialize};

/// Combined output of one analysis pass over a trial balance grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub trial_balance: TrialBalance,
    pub ratios: Vec<RatioResult>,
    pub findings: Vec<RiskFinding>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse a raw grid and run the full ratio and risk battery over it.
///
/// The two structural parse failures ([`AuditError::HeaderNotFound`],
/// [`AuditError::AccountCodeColumnMissing`]) propagate; everything else
/// degrades inside the individual components.
pub fn analyze_trial_balance(
    grid: &RawGrid,
    thresholds: &RiskThresholds,
) -> Result<AnalysisReport> {
    let trial_balance = parse_trial_balance(grid)?;
    let ratios = compute_ratios(&trial_balance.accounts);
    let findings = evaluate_risks(&trial_balance.accounts, thresholds);

    info!(
        "Analysis complete: {} accounts, {} ratios, {} findings",
        trial_balance.accounts.len(),
        ratios.len(),
        findings.len()
    );

    Ok(AnalysisReport {
        trial_balance,
        ratios,
        findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        rows.iter()
            .map(|row| row.iter().map(|c| Cell::from(*c)).collect())
            .collect()
    }

    #[test]
    fn test_end_to_end_analysis() {
        let grid = grid(&[
            &["Hesap Kodu", "Hesap Adı", "Borç", "Alacak"],
            &["100", "Kasa", "40000", "0"],
            &["102", "Bankalar", "60000", "0"],
            &["320", "Satıcılar", "0", "30000"],
            &["500", "Sermaye", "0", "70000"],
        ]);
        let report = analyze_trial_balance(&grid, &RiskThresholds::default()).unwrap();

        assert_eq!(report.trial_balance.accounts.len(), 4);
        assert!(report.trial_balance.totals.is_balanced(0.01));
        assert!(!report.ratios.is_empty());
        // 40% of assets held as cash trips the critical cash heuristic.
        let cash = report.findings.iter().find(|f| f.code == "KASA-02").unwrap();
        assert_eq!(cash.severity, RiskSeverity::Critical);
    }

    #[test]
    fn test_structural_failure_propagates() {
        let grid = grid(&[&["A", "B", "C"], &["1", "2", "3"]]);
        assert!(matches!(
            analyze_trial_balance(&grid, &RiskThresholds::default()),
            Err(AuditError::HeaderNotFound { .. })
        ));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let grid = grid(&[
            &["Hesap Kodu", "Hesap Adı", "Borç", "Alacak"],
            &["100", "Kasa", "1000", "0"],
        ]);
        let report = analyze_trial_balance(&grid, &RiskThresholds::default()).unwrap();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"Kasa\""));
        assert!(json.contains("trial_balance"));
    }
}
