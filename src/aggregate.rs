//! Pure lookups over canonical accounts. These form the vocabulary the
//! ratio/risk engine and the reconciliation classifier consume.

use crate::schema::Account;

/// Wildcard marker for range lookups, e.g. `"131*"` for every account
/// under prefix 131.
pub const WILDCARD: char = '*';

/// Net balance for a single account code.
///
/// Without a wildcard this returns the first account whose code equals or
/// starts with `code` (single-account lookup). With a trailing `*` it sums
/// the net balance of every account under the prefix. The first-match vs
/// sum-all asymmetry is deliberate and kept as-is pending product review.
pub fn balance_of(accounts: &[Account], code: &str) -> f64 {
    if let Some(prefix) = code.strip_suffix(WILDCARD) {
        return group_total(accounts, prefix);
    }
    accounts
        .iter()
        .find(|a| a.code == code || a.code.starts_with(code))
        .map(Account::net_balance)
        .unwrap_or(0.0)
}

/// Sum of net balances over every account whose code starts with `prefix`.
/// Total function: no matches means 0.
pub fn group_total(accounts: &[Account], prefix: &str) -> f64 {
    accounts
        .iter()
        .filter(|a| a.code.starts_with(prefix))
        .map(Account::net_balance)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(code: &str, debit_balance: f64, credit_balance: f64) -> Account {
        Account {
            code: code.to_string(),
            name: format!("Hesap {}", code),
            debit_total: debit_balance,
            credit_total: credit_balance,
            debit_balance,
            credit_balance,
        }
    }

    fn sample() -> Vec<Account> {
        vec![
            account("100", 1500.0, 0.0),
            account("102.01", 20000.0, 0.0),
            account("102.02", 5000.0, 0.0),
            account("120", 8000.0, 0.0),
            account("320", 0.0, 6000.0),
        ]
    }

    #[test]
    fn test_exact_lookup() {
        let accounts = sample();
        assert_eq!(balance_of(&accounts, "100"), 1500.0);
        assert_eq!(balance_of(&accounts, "320"), -6000.0);
    }

    #[test]
    fn test_prefix_lookup_returns_first_match_only() {
        let accounts = sample();
        // "102" matches 102.01 first; the sibling 102.02 is not summed.
        assert_eq!(balance_of(&accounts, "102"), 20000.0);
    }

    #[test]
    fn test_wildcard_sums_all_matches() {
        let accounts = sample();
        assert_eq!(balance_of(&accounts, "102*"), 25000.0);
    }

    #[test]
    fn test_group_total() {
        let accounts = sample();
        assert_eq!(group_total(&accounts, "102"), 25000.0);
        assert_eq!(group_total(&accounts, "1"), 34500.0);
        assert_eq!(group_total(&accounts, "3"), -6000.0);
    }

    #[test]
    fn test_no_match_is_zero() {
        let accounts = sample();
        assert_eq!(balance_of(&accounts, "700"), 0.0);
        assert_eq!(balance_of(&accounts, "700*"), 0.0);
        assert_eq!(group_total(&accounts, "700"), 0.0);
        assert_eq!(balance_of(&[], "100"), 0.0);
    }
}
