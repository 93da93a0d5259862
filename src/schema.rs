use crate::registry::Institution;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single untyped cell as delivered by the upstream spreadsheet/CSV reader.
///
/// The core never reads files itself; callers decode whatever container the
/// upload came in (XLSX sheet, delimited text) into a grid of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text content of the cell. Numbers are rendered with their natural
    /// display form so header matching and IBAN scanning can treat every
    /// cell uniformly.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Empty => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Raw tabular input: rows of untyped cells, no schema assumed.
pub type RawGrid = Vec<Vec<Cell>>;

/// Canonical ledger line produced by the trial balance parser.
///
/// At most one of `debit_balance` / `credit_balance` is non-zero; the pair
/// encodes a single signed balance split by bookkeeping convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Account {
    /// Numeric-prefixed chart-of-accounts code, unique within one parse.
    pub code: String,
    pub name: String,
    pub debit_total: f64,
    pub credit_total: f64,
    pub debit_balance: f64,
    pub credit_balance: f64,
}

impl Account {
    /// Signed net balance: positive when the account carries a debit
    /// balance, negative for a credit balance.
    pub fn net_balance(&self) -> f64 {
        self.debit_balance - self.credit_balance
    }
}

/// Bookkeeping software dialect recognized from a trial balance header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Dialect {
    Luca,
    LogoTiger,
    Mikro,
    Eta,
    Zirve,
    Orka,
    Netsis,
    GenericEnglish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    #[schemars(description = "Tax declaration rendered as PDF (KDV, muhtasar, kurumlar, gelir)")]
    DeclarationPdf,

    #[schemars(description = "Tax assessment notice rendered as PDF (tahakkuk fişi)")]
    AssessmentPdf,

    #[schemars(description = "Trial balance exported as a spreadsheet (XLS/XLSX)")]
    TrialBalanceSpreadsheet,

    #[schemars(description = "Trial balance exported as delimited text (CSV/TXT)")]
    TrialBalanceText,

    #[schemars(description = "Electronic ledger (e-Defter) XML or archive thereof")]
    ElectronicLedgerArchive,

    #[schemars(description = "Bank account statement, identified by embedded IBANs")]
    BankStatement,

    #[schemars(description = "Electronic invoice (e-Fatura) UBL XML")]
    ElectronicInvoice,

    #[schemars(description = "No known layout matched")]
    Unknown,
}

/// Side-channel metadata extracted during classification. Every field is
/// best-effort; absence means the signal was not present, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationDetails {
    pub institution: Option<Institution>,
    pub dialect: Option<Dialect>,
    /// Reporting period as found in the source, e.g. "202312".
    pub period: Option<String>,
    /// 10-digit tax identity number embedded in e-Defter file names.
    pub tax_id: Option<String>,
    /// Header cells preserved for diagnostics when nothing matched.
    pub headers: Option<Vec<String>>,
    /// Message of a content-sampling failure that degraded the result.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    pub document_type: DocumentType,
    /// 0.0 to 1.0. Zero only when `document_type` is `Unknown`.
    pub confidence: f64,
    pub details: ClassificationDetails,
}

impl ClassificationResult {
    /// A recognized document. `confidence` is clamped away from zero so the
    /// `confidence == 0 ⇔ unknown` invariant holds by construction.
    pub fn recognized(
        document_type: DocumentType,
        confidence: f64,
        details: ClassificationDetails,
    ) -> Self {
        debug_assert!(document_type != DocumentType::Unknown);
        Self {
            document_type,
            confidence: confidence.clamp(0.01, 1.0),
            details,
        }
    }

    pub fn unknown(details: ClassificationDetails) -> Self {
        Self {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            details,
        }
    }

    /// Unknown result caused by a content-sampling failure; the message is
    /// preserved for diagnostics instead of propagating as an error.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::unknown(ClassificationDetails {
            error: Some(message.into()),
            ..Default::default()
        })
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_emptiness() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::Text("   ".to_string()).is_empty());
        assert!(!Cell::Text("100".to_string()).is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(Cell::Number(100.0).as_text(), "100");
        assert_eq!(Cell::Number(1500.5).as_text(), "1500.5");
        assert_eq!(Cell::Text("Kasa".to_string()).as_text(), "Kasa");
        assert_eq!(Cell::Empty.as_text(), "");
    }

    #[test]
    fn test_account_net_balance() {
        let account = Account {
            code: "100".to_string(),
            name: "Kasa".to_string(),
            debit_total: 5000.0,
            credit_total: 3500.0,
            debit_balance: 1500.0,
            credit_balance: 0.0,
        };
        assert_eq!(account.net_balance(), 1500.0);
    }

    #[test]
    fn test_unknown_has_zero_confidence() {
        let result = ClassificationResult::unknown(ClassificationDetails::default());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.document_type, DocumentType::Unknown);
    }

    #[test]
    fn test_recognized_confidence_never_zero() {
        let result = ClassificationResult::recognized(
            DocumentType::BankStatement,
            0.0,
            ClassificationDetails::default(),
        );
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn test_degraded_preserves_message() {
        let result = ClassificationResult::degraded("invalid utf-8 at byte 17");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(
            result.details.error.as_deref(),
            Some("invalid utf-8 at byte 17")
        );
    }
}
