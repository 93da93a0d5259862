//! Static registry of financial institutions, keyed by the 5-digit bank
//! code embedded in Turkish IBANs, plus pattern scanning for the IBAN
//! grammar inside free text.
//!
//! The registry is process-wide immutable data: built once, never mutated.
//! Callers that need a different jurisdiction table construct their own
//! `BankRegistry` and pass it in.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Institution {
    /// 5-digit institution code as it appears in the IBAN.
    pub code: String,
    pub name: String,
}

/// TR IBAN: country code, 2 check digits, 5-digit institution code,
/// 16-digit account body. Whitespace between digit groups is tolerated.
static IBAN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bTR\s?\d{2}(?:\s?\d){21}\b").expect("IBAN pattern is valid"));

const KNOWN_BANKS: &[(&str, &str)] = &[
    ("00010", "T.C. Ziraat Bankası"),
    ("00012", "Türkiye Halk Bankası"),
    ("00015", "Türkiye Vakıflar Bankası"),
    ("00032", "Türk Ekonomi Bankası"),
    ("00046", "Akbank"),
    ("00059", "Şekerbank"),
    ("00062", "Garanti BBVA"),
    ("00064", "Türkiye İş Bankası"),
    ("00067", "Yapı ve Kredi Bankası"),
    ("00099", "ING Bank"),
    ("00103", "Fibabanka"),
    ("00111", "QNB Finansbank"),
    ("00123", "HSBC Bank"),
    ("00134", "Denizbank"),
    ("00203", "Albaraka Türk"),
    ("00205", "Kuveyt Türk"),
    ("00206", "Türkiye Finans"),
];

#[derive(Debug, Clone)]
pub struct BankRegistry {
    institutions: Vec<Institution>,
}

impl Default for BankRegistry {
    fn default() -> Self {
        Self {
            institutions: KNOWN_BANKS
                .iter()
                .map(|(code, name)| Institution {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                })
                .collect(),
        }
    }
}

impl BankRegistry {
    /// Registry with a custom institution table, e.g. for another
    /// jurisdiction or a test fixture.
    pub fn with_institutions(institutions: Vec<Institution>) -> Self {
        Self { institutions }
    }

    /// Look up an institution by its 5-digit code. Malformed or unknown
    /// codes yield `None`, never an error.
    pub fn lookup_institution(&self, id: &str) -> Option<&Institution> {
        let id = id.trim();
        self.institutions.iter().find(|i| i.code == id)
    }

    /// Scan free text for account numbers matching the national IBAN
    /// grammar. Matches are returned normalized: upper-cased with all
    /// whitespace removed.
    pub fn find_account_number_patterns(&self, text: &str) -> Vec<String> {
        IBAN_PATTERN
            .find_iter(text)
            .map(|m| normalize_iban(m.as_str()))
            .collect()
    }

    /// Extract the embedded institution code from an account number and
    /// resolve it against the registry.
    pub fn institution_from_account_number(&self, acct: &str) -> Option<&Institution> {
        let normalized = normalize_iban(acct);
        if !normalized.starts_with("TR") || normalized.len() != 25 {
            return None;
        }
        let body = &normalized[2..];
        if !body.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // Layout after "TR": 2 check digits, then the institution code.
        self.lookup_institution(&body[2..7])
    }
}

fn normalize_iban(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}
