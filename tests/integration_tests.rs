use anyhow::Result;
use mizan_audit::*;

/// Build a grid from delimited text through the csv crate, the same way
/// the upload layer feeds exported files into the core.
fn grid_from_csv(data: &str, delimiter: u8) -> Result<RawGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(Cell::from).collect());
    }
    Ok(grid)
}

const LUCA_EXPORT: &str = "\
ACME Ticaret A.Ş.;;;
Mizan Raporu - Aralık 2023;;;
Hesap Kodu;Hesap Adı;Borç Tutarı;Alacak Tutarı
100;Kasa;185.000,00;5.000,00
102;Bankalar;420.000,00;120.000,00
120;Alıcılar;260.000,00;60.000,00
131;Ortaklardan Alacaklar;90.000,00;0,00
153;Ticari Mallar;150.000,00;30.000,00
320;Satıcılar;40.000,00;190.000,00
500;Sermaye;0,00;100.000,00
600;Yurtiçi Satışlar;0,00;900.000,00
621;Satılan Ticari Mal Maliyeti;560.000,00;0,00
TOPLAM;;1.705.000,00;1.405.000,00
";

#[test]
fn test_luca_export_full_pipeline() -> Result<()> {
    let grid = grid_from_csv(LUCA_EXPORT, b';')?;
    let report = analyze_trial_balance(&grid, &RiskThresholds::default())?;

    // Nine account rows; title, banner and TOPLAM footer are skipped.
    assert_eq!(report.trial_balance.accounts.len(), 9);

    let kasa = &report.trial_balance.accounts[0];
    assert_eq!(kasa.code, "100");
    assert_eq!(kasa.debit_balance, 180_000.0);
    assert_eq!(kasa.credit_balance, 0.0);

    for account in &report.trial_balance.accounts {
        assert!(
            account.debit_balance == 0.0 || account.credit_balance == 0.0,
            "account {} carries a double balance",
            account.code
        );
    }

    // 180k cash on an 890k asset base is past the critical share.
    let cash = report
        .findings
        .iter()
        .find(|f| f.code == "KASA-02")
        .expect("cash heuristic should fire");
    assert_eq!(cash.severity, RiskSeverity::Critical);
    assert_eq!(cash.legal_reference, "KVK md. 13");

    // 90k shareholder receivable against 100k paid-in capital.
    let shareholder = report
        .findings
        .iter()
        .find(|f| f.code == "ORTAK-01")
        .expect("shareholder receivable heuristic should fire");
    assert_eq!(shareholder.severity, RiskSeverity::Critical);

    let current = report
        .ratios
        .iter()
        .find(|r| r.name == "Cari Oran")
        .expect("current ratio should be defined");
    assert!(current.value > 1.0);

    Ok(())
}

#[test]
fn test_classification_then_parse_roundtrip() -> Result<()> {
    let registry = BankRegistry::default();
    let sample = ContentSample::Text(LUCA_EXPORT.to_string());

    let classification = classify("mizan_2023-12.csv", &sample, &registry);
    assert_eq!(classification.document_type, DocumentType::TrialBalanceText);
    assert_eq!(classification.details.dialect, Some(Dialect::Luca));
    assert_eq!(classification.details.period.as_deref(), Some("202312"));
    assert!(classification.confidence >= 0.9);

    // The same sample parses cleanly once classified.
    let grid = grid_from_csv(LUCA_EXPORT, b';')?;
    let trial_balance = parse_trial_balance(&grid)?;
    assert_eq!(trial_balance.accounts.len(), 9);
    Ok(())
}

#[test]
fn test_unrecognized_layout_fails_loudly_not_silently() -> Result<()> {
    let data = "Sipariş No,Ürün,Adet\n1001,Vida,500\n";
    let grid = grid_from_csv(data, b',')?;
    let err = parse_trial_balance(&grid).unwrap_err();
    assert!(matches!(err, AuditError::HeaderNotFound { .. }));
    Ok(())
}

#[test]
fn test_bank_statement_classification_via_registry() -> Result<()> {
    let registry = BankRegistry::default();
    let data = "Tarih;Açıklama;Tutar\n04.12.2023;Havale TR12 00046 0001 2345 6789 0123;7.500,00\n";
    let result = classify("aralik_hareketler.csv", &ContentSample::Text(data.to_string()), &registry);

    assert_eq!(result.document_type, DocumentType::BankStatement);
    let institution = result.details.institution.expect("institution expected");
    assert_eq!(institution.name, "Akbank");
    Ok(())
}

#[test]
fn test_reconciliation_scenarios() {
    let thresholds = ReconciliationThresholds::default();

    // Counterpart silent while the ledger carries a balance.
    let missing = ReconciliationInput {
        account_code: "320.14".to_string(),
        internal_balance: 10_000.0,
        external_balance: 0.0,
        aging_days: 30,
        last_internal_movement_date: None,
        period_end_date: None,
    };
    let result = classify_root_cause(&missing, &thresholds);
    assert_eq!(result.category, RootCause::ExternalSourceMissing);
    assert_eq!(result.confidence, CauseConfidence::Certain);

    // Half-lira difference is rounding, not an investigation case.
    let rounded = ReconciliationInput {
        account_code: "102.01".to_string(),
        internal_balance: 84_312.50,
        external_balance: 84_312.00,
        aging_days: 0,
        last_internal_movement_date: None,
        period_end_date: None,
    };
    let result = classify_root_cause(&rounded, &thresholds);
    assert_eq!(result.category, RootCause::Rounding);

    // Aged trade receivable with a real discrepancy.
    let aged = ReconciliationInput {
        account_code: "120.05".to_string(),
        internal_balance: 44_000.0,
        external_balance: 21_500.0,
        aging_days: 400,
        last_internal_movement_date: None,
        period_end_date: None,
    };
    let result = classify_root_cause(&aged, &thresholds);
    assert_eq!(result.category, RootCause::DoubtfulReceivable);
}

#[test]
fn test_every_dialect_classifies_and_parses() -> Result<()> {
    // A dialect the classifier advertises must also make it through the
    // parser; balance-only layouts (Orka, Netsis) included.
    let layouts: &[(Dialect, &[&str])] = &[
        (
            Dialect::Luca,
            &["Hesap Kodu", "Hesap Adı", "Borç Tutarı", "Alacak Tutarı"],
        ),
        (
            Dialect::Mikro,
            &["Hes. Kodu", "Hesap İsmi", "Borç Toplamı", "Alacak Toplamı"],
        ),
        (
            Dialect::Eta,
            &["Hesap No", "Açıklama", "Borç Tutar", "Alacak Tutar"],
        ),
        (
            Dialect::Zirve,
            &["Hesap Kodu", "Hesap Adı", "Toplam Borç", "Toplam Alacak"],
        ),
        (
            Dialect::Orka,
            &["Kod", "Açıklama", "Borç Bakiyesi", "Alacak Bakiyesi"],
        ),
        (
            Dialect::Netsis,
            &["Hesap Kodu", "Hesap Adı", "Borç Bakiye", "Alacak Bakiye"],
        ),
        (
            Dialect::GenericEnglish,
            &["Account Code", "Account Name", "Debit", "Credit"],
        ),
        (
            Dialect::LogoTiger,
            &["Hesap Kodu", "Hesap Adı", "Borç", "Alacak"],
        ),
    ];

    let registry = BankRegistry::default();
    for (expected, headers) in layouts {
        let grid: RawGrid = vec![
            headers.iter().map(|c| Cell::from(*c)).collect(),
            vec!["100".into(), "Kasa".into(), "1500".into(), "0".into()],
        ];

        let classification = classify("mizan.csv", &ContentSample::Grid(grid.clone()), &registry);
        assert_eq!(
            classification.document_type,
            DocumentType::TrialBalanceText,
            "dialect {:?} not recognized as a trial balance",
            expected
        );
        assert_eq!(classification.details.dialect, Some(*expected));

        let trial_balance = parse_trial_balance(&grid)
            .unwrap_or_else(|e| panic!("dialect {:?} failed to parse: {}", expected, e));
        assert_eq!(trial_balance.accounts.len(), 1);
        assert_eq!(trial_balance.accounts[0].code, "100");
        assert_eq!(trial_balance.accounts[0].debit_balance, 1500.0);
    }
    Ok(())
}

#[test]
fn test_wildcard_and_group_lookups_over_parsed_accounts() -> Result<()> {
    let data = "\
Hesap Kodu;Hesap Adı;Borç;Alacak
102.01;Vadesiz TL;50.000,00;10.000,00
102.02;Vadeli TL;200.000,00;0,00
320;Satıcılar;0,00;75.000,00
";
    let grid = grid_from_csv(data, b';')?;
    let trial_balance = parse_trial_balance(&grid)?;
    let accounts = &trial_balance.accounts;

    // Non-wildcard prefix lookup stops at the first match.
    assert_eq!(balance_of(accounts, "102"), 40_000.0);
    // Wildcard sums the whole range.
    assert_eq!(balance_of(accounts, "102*"), 240_000.0);
    assert_eq!(group_total(accounts, "102"), 240_000.0);
    assert_eq!(group_total(accounts, "3"), -75_000.0);
    Ok(())
}
