//! Trial balance parsing: header discovery across bookkeeping dialects,
//! typed column mapping, and row extraction into canonical [`Account`]s.
//!
//! Parsing is two-phase. Phase one scans the untyped grid for a header row
//! and resolves it into a [`ColumnMapping`]; phase two reads every data row
//! through that mapping, so field access after header resolution is fully
//! typed.

use crate::error::{AuditError, Result};
use crate::numeric::parse_numeric_cell;
use crate::schema::{Account, Cell, Dialect, RawGrid};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// How many leading rows may precede the header (report titles, company
/// banners, date lines).
pub const HEADER_SEARCH_WINDOW: usize = 10;

const CODE_SYNONYMS: &[&str] = &[
    "hesap kodu",
    "hesap no",
    "hes. kodu",
    "hes.kodu",
    "hesap kod",
    "kod",
    "account code",
    "account no",
];

const NAME_SYNONYMS: &[&str] = &[
    "hesap adı",
    "hesap adi",
    "hesap ismi",
    "hesap açıklaması",
    "açıklama",
    "aciklama",
    "unvan",
    "account name",
    "description",
];

const DEBIT_TOTAL_SYNONYMS: &[&str] = &[
    "borç",
    "borc",
    "borç tutarı",
    "borc tutari",
    "borç tutar",
    "borç toplamı",
    "borç toplam",
    "toplam borç",
    "debit",
    "debit total",
];

const CREDIT_TOTAL_SYNONYMS: &[&str] = &[
    "alacak",
    "alacak tutarı",
    "alacak tutari",
    "alacak tutar",
    "alacak toplamı",
    "alacak toplam",
    "toplam alacak",
    "credit",
    "credit total",
];

const DEBIT_BALANCE_SYNONYMS: &[&str] = &[
    "borç bakiye",
    "borc bakiye",
    "borç bakiyesi",
    "bakiye borç",
    "borç kalan",
    "debit balance",
];

const CREDIT_BALANCE_SYNONYMS: &[&str] = &[
    "alacak bakiye",
    "alacak bakiyesi",
    "bakiye alacak",
    "alacak kalan",
    "credit balance",
];

/// Dialect signatures, most specific first. A dialect matches when every
/// marker appears among the normalized header cells.
const DIALECT_SIGNATURES: &[(Dialect, &[&str])] = &[
    (Dialect::Luca, &["hesap kodu", "borç tutarı", "alacak tutarı"]),
    (Dialect::Mikro, &["hes. kodu", "borç toplamı", "alacak toplamı"]),
    (Dialect::Eta, &["hesap no", "borç tutar", "alacak tutar"]),
    (Dialect::Zirve, &["hesap kodu", "toplam borç", "toplam alacak"]),
    (
        Dialect::Orka,
        &["kod", "açıklama", "borç bakiyesi", "alacak bakiyesi"],
    ),
    (Dialect::Netsis, &["hesap kodu", "borç bakiye", "alacak bakiye"]),
    (
        Dialect::GenericEnglish,
        &["account code", "debit", "credit"],
    ),
    (Dialect::LogoTiger, &["hesap kodu", "borç", "alacak"]),
];

/// Lower-cases with Turkish dotted/dotless-i folding and collapses runs of
/// whitespace. `str::to_lowercase` maps 'İ' to "i\u{307}", which would
/// break exact synonym matching.
pub(crate) fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            'İ' => out.push('i'),
            'I' => out.push('ı'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn matches_vocabulary(normalized: &str, vocabulary: &[&str]) -> bool {
    vocabulary.iter().any(|syn| *syn == normalized)
}

/// Resolved positions of the canonical columns within one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub header_row: usize,
    pub code: usize,
    pub name: Option<usize>,
    pub debit_total: Option<usize>,
    pub credit_total: Option<usize>,
    pub debit_balance: Option<usize>,
    pub credit_balance: Option<usize>,
}

/// Column sums across all accepted rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub debit_total: f64,
    pub credit_total: f64,
    pub debit_balance: f64,
    pub credit_balance: f64,
}

impl TrialBalanceTotals {
    /// A trial balance should close: total debits equal total credits
    /// within `tolerance`.
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        (self.debit_total - self.credit_total).abs() <= tolerance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Accounts in source row order.
    pub accounts: Vec<Account>,
    pub totals: TrialBalanceTotals,
}

impl TrialBalance {
    /// Accounts re-ordered by chart-of-accounts code, for callers that
    /// want normalized ordering instead of source order.
    pub fn sorted_by_code(&self) -> Vec<Account> {
        let mut sorted = self.accounts.clone();
        sorted.sort_by(|a, b| a.code.cmp(&b.code));
        sorted
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Detect which bookkeeping dialect produced a header row. Consumed by the
/// document classifier; `None` means the row is not a known trial balance
/// header.
pub fn detect_dialect(header_cells: &[Cell]) -> Option<Dialect> {
    let normalized: Vec<String> = header_cells
        .iter()
        .map(|c| normalize_header(&c.as_text()))
        .collect();
    for (dialect, markers) in DIALECT_SIGNATURES {
        if markers
            .iter()
            .all(|m| normalized.iter().any(|h| h == m))
        {
            return Some(*dialect);
        }
    }
    None
}

/// A row qualifies as a header when it has at least three non-empty cells,
/// one matching the account-code vocabulary, and one matching an amount
/// vocabulary. Balance columns count as amount cells: the Orka and Netsis
/// exports carry only balance columns, no totals.
fn qualifies_as_header(row: &[Cell]) -> bool {
    let normalized: Vec<String> = row
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| normalize_header(&c.as_text()))
        .collect();
    if normalized.len() < 3 {
        return false;
    }
    let has_code = normalized
        .iter()
        .any(|h| matches_vocabulary(h, CODE_SYNONYMS));
    let has_amount = normalized.iter().any(|h| {
        matches_vocabulary(h, DEBIT_TOTAL_SYNONYMS)
            || matches_vocabulary(h, CREDIT_TOTAL_SYNONYMS)
            || matches_vocabulary(h, DEBIT_BALANCE_SYNONYMS)
            || matches_vocabulary(h, CREDIT_BALANCE_SYNONYMS)
    });
    has_code && has_amount
}

fn find_column(row: &[Cell], vocabulary: &[&str]) -> Option<usize> {
    row.iter()
        .position(|c| matches_vocabulary(&normalize_header(&c.as_text()), vocabulary))
}

/// Phase one: locate the header row and resolve the column mapping.
pub fn resolve_columns(grid: &RawGrid) -> Result<ColumnMapping> {
    let searched = grid.len().min(HEADER_SEARCH_WINDOW);
    let (header_row, row) = grid
        .iter()
        .take(HEADER_SEARCH_WINDOW)
        .enumerate()
        .find(|(_, row)| qualifies_as_header(row))
        .ok_or(AuditError::HeaderNotFound { searched })?;

    debug!("Header row found at index {}", header_row);

    // A qualifying row always contains a code synonym, so this error can
    // only fire if the qualification rule and the vocabularies drift
    // apart. Kept as a named structural failure: a mapping without a code
    // column is useless downstream.
    let code = find_column(row, CODE_SYNONYMS)
        .ok_or(AuditError::AccountCodeColumnMissing { header_row })?;

    Ok(ColumnMapping {
        header_row,
        code,
        name: find_column(row, NAME_SYNONYMS),
        debit_total: find_column(row, DEBIT_TOTAL_SYNONYMS),
        credit_total: find_column(row, CREDIT_TOTAL_SYNONYMS),
        debit_balance: find_column(row, DEBIT_BALANCE_SYNONYMS),
        credit_balance: find_column(row, CREDIT_BALANCE_SYNONYMS),
    })
}

/// Numeric cells that fail locale parsing fall back to zero; the lenient
/// policy lives here at the call site, not inside the numeric parser.
fn numeric_at(row: &[Cell], column: Option<usize>) -> f64 {
    column
        .and_then(|i| row.get(i))
        .map(|cell| parse_numeric_cell(cell).unwrap_or(0.0))
        .unwrap_or(0.0)
}

/// Phase two over phase one: parse a raw grid into canonical accounts with
/// running totals. Accounts keep source row order.
pub fn parse_trial_balance(grid: &RawGrid) -> Result<TrialBalance> {
    let mapping = resolve_columns(grid)?;
    let mut accounts = Vec::new();
    let mut totals = TrialBalanceTotals::default();

    for row in grid.iter().skip(mapping.header_row + 1) {
        let code_text = row
            .get(mapping.code)
            .map(|c| c.as_text().trim().to_string())
            .unwrap_or_default();

        // Subtotal and footer rows carry labels instead of account codes.
        if !code_text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }

        let name = mapping
            .name
            .and_then(|i| row.get(i))
            .map(|c| c.as_text().trim().to_string())
            .unwrap_or_default();

        let debit_total = numeric_at(row, mapping.debit_total);
        let credit_total = numeric_at(row, mapping.credit_total);
        let mut debit_balance = numeric_at(row, mapping.debit_balance);
        let mut credit_balance = numeric_at(row, mapping.credit_balance);

        let has_balance_columns =
            mapping.debit_balance.is_some() || mapping.credit_balance.is_some();
        if !has_balance_columns || (debit_balance != 0.0 && credit_balance != 0.0) {
            // A single signed balance split by convention; at most one
            // side may be non-zero.
            let net = if has_balance_columns {
                debit_balance - credit_balance
            } else {
                debit_total - credit_total
            };
            if net >= 0.0 {
                debit_balance = net;
                credit_balance = 0.0;
            } else {
                debit_balance = 0.0;
                credit_balance = -net;
            }
        }

        totals.debit_total += debit_total;
        totals.credit_total += credit_total;
        totals.debit_balance += debit_balance;
        totals.credit_balance += credit_balance;

        accounts.push(Account {
            code: code_text,
            name,
            debit_total,
            credit_total,
            debit_balance,
            credit_balance,
        });
    }

    info!(
        "Parsed {} accounts (debit total {:.2}, credit total {:.2})",
        accounts.len(),
        totals.debit_total,
        totals.credit_total
    );

    Ok(TrialBalance { accounts, totals })
}
