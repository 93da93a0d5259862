//! Document classification for uploaded bookkeeping exports.
//!
//! Classification is an ordered rule cascade, first match wins: extension
//! fast paths, e-Defter filename identifiers, markup keyword scans, PDF
//! filename keywords, then tabular dialect sniffing with an IBAN fallback.
//! Nothing in here fails hard; every irregularity degrades to `Unknown`
//! with the cause kept in `details`.

use crate::parser::{detect_dialect, normalize_header, HEADER_SEARCH_WINDOW};
use crate::registry::BankRegistry;
use crate::schema::{
    Cell, ClassificationDetails, ClassificationResult, DocumentType, RawGrid,
};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Content sample handed in by the upload layer. Raw bytes are attempted as
/// UTF-8; a decode failure degrades the classification instead of erroring.
#[derive(Debug, Clone)]
pub enum ContentSample {
    /// No content available, filename heuristics only.
    Empty,
    Text(String),
    Grid(RawGrid),
    Bytes(Vec<u8>),
}

/// e-Defter naming convention: 10-digit tax id, 6-digit period (YYYYMM),
/// sub-type tag (Y yevmiye, K kebir, B berat variants), part number.
static ELEDGER_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{10})-(\d{6})-(YB|KB|Y|K|DB)-(\d{4,6})\.xml$")
        .expect("e-ledger filename pattern is valid")
});

/// Reporting period embedded in a filename, e.g. "mizan_2023-12.xlsx".
static FILENAME_PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(20\d{2})[-_./ ]?(0[1-9]|1[0-2])").expect("period pattern is valid")
});

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "ods"];
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "txt"];

const ASSESSMENT_KEYWORDS: &[&str] = &["tahakkuk"];
const DECLARATION_KEYWORDS: &[&str] = &[
    "beyanname",
    "kdv",
    "muhtasar",
    "kurumlar",
    "gelir vergisi",
    "geçici vergi",
    "gecici vergi",
    "damga",
];
const STATEMENT_KEYWORDS: &[&str] = &["ekstre", "hesap özeti", "hesap ozeti", "hesapozeti"];

const INVOICE_MARKERS: &[&str] = &[
    "urn:oasis:names:specification:ubl",
    "<invoice",
    "e-fatura",
    "efatura",
    "faturatip",
];
const LEDGER_MARKERS: &[&str] = &["edefter", "gl-cor", "xbrli", "yevmiye", "defter-i kebir"];

/// Classify a file by name and content sample. Never fails: anything
/// unrecognized comes back as `Unknown` with confidence 0.
pub fn classify(
    filename: &str,
    sample: &ContentSample,
    registry: &BankRegistry,
) -> ClassificationResult {
    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| *ext != filename)
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    debug!("Classifying '{}' (extension '{}')", filename, extension);

    if ARCHIVE_EXTENSIONS.contains(&extension.as_str()) {
        // Detail extraction happens after an external unpacking step.
        return ClassificationResult::recognized(
            DocumentType::ElectronicLedgerArchive,
            0.6,
            ClassificationDetails {
                period: period_from_filename(filename),
                ..Default::default()
            },
        );
    }

    if extension == "xml" {
        return classify_markup(filename, sample);
    }

    if extension == "pdf" {
        return classify_pdf_filename(filename);
    }

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        return classify_tabular(
            filename,
            sample,
            registry,
            DocumentType::TrialBalanceSpreadsheet,
        );
    }

    if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        return classify_tabular(filename, sample, registry, DocumentType::TrialBalanceText);
    }

    ClassificationResult::unknown(ClassificationDetails::default())
}

fn classify_markup(filename: &str, sample: &ContentSample) -> ClassificationResult {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    if let Some(caps) = ELEDGER_FILENAME.captures(basename) {
        return ClassificationResult::recognized(
            DocumentType::ElectronicLedgerArchive,
            0.98,
            ClassificationDetails {
                tax_id: Some(caps[1].to_string()),
                period: Some(caps[2].to_string()),
                ..Default::default()
            },
        );
    }

    let text = match sample_text(sample) {
        Ok(Some(text)) => text,
        Ok(None) => return ClassificationResult::unknown(ClassificationDetails::default()),
        Err(message) => return ClassificationResult::degraded(message),
    };
    let lowered = text.to_lowercase();

    if INVOICE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ClassificationResult::recognized(
            DocumentType::ElectronicInvoice,
            0.7,
            ClassificationDetails::default(),
        );
    }
    if LEDGER_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ClassificationResult::recognized(
            DocumentType::ElectronicLedgerArchive,
            0.7,
            ClassificationDetails::default(),
        );
    }

    ClassificationResult::unknown(ClassificationDetails::default())
}

fn classify_pdf_filename(filename: &str) -> ClassificationResult {
    // Separators vary per export tool; fold them to spaces before matching.
    let folded = normalize_header(&filename.replace(['_', '-', '.'], " "));
    let details = ClassificationDetails {
        period: period_from_filename(filename),
        ..Default::default()
    };

    // Assessment first: a "tahakkuk" filename often also names the
    // declaration it settles.
    if ASSESSMENT_KEYWORDS.iter().any(|k| folded.contains(k)) {
        return ClassificationResult::recognized(DocumentType::AssessmentPdf, 0.6, details);
    }
    if DECLARATION_KEYWORDS.iter().any(|k| folded.contains(k)) {
        return ClassificationResult::recognized(DocumentType::DeclarationPdf, 0.6, details);
    }
    if STATEMENT_KEYWORDS.iter().any(|k| folded.contains(k)) {
        return ClassificationResult::recognized(DocumentType::BankStatement, 0.6, details);
    }

    ClassificationResult::unknown(ClassificationDetails::default())
}

fn classify_tabular(
    filename: &str,
    sample: &ContentSample,
    registry: &BankRegistry,
    trial_balance_type: DocumentType,
) -> ClassificationResult {
    let grid = match sample_grid(sample) {
        Ok(Some(grid)) => grid,
        Ok(None) => return ClassificationResult::unknown(ClassificationDetails::default()),
        Err(message) => return ClassificationResult::degraded(message),
    };

    for row in grid.iter().take(HEADER_SEARCH_WINDOW) {
        if let Some(dialect) = detect_dialect(row) {
            debug!("Trial balance dialect detected: {:?}", dialect);
            return ClassificationResult::recognized(
                trial_balance_type,
                0.9,
                ClassificationDetails {
                    dialect: Some(dialect),
                    period: period_from_filename(filename),
                    headers: Some(row.iter().map(Cell::as_text).collect()),
                    ..Default::default()
                },
            );
        }
    }

    for row in &grid {
        for cell in row {
            let text = cell.as_text();
            if let Some(account_number) = registry.find_account_number_patterns(&text).first() {
                let institution = registry
                    .institution_from_account_number(account_number)
                    .cloned();
                return ClassificationResult::recognized(
                    DocumentType::BankStatement,
                    0.7,
                    ClassificationDetails {
                        institution,
                        ..Default::default()
                    },
                );
            }
        }
    }

    let headers = grid
        .iter()
        .find(|row| row.iter().any(|c| !c.is_empty()))
        .map(|row| row.iter().map(Cell::as_text).collect());
    ClassificationResult::unknown(ClassificationDetails {
        headers,
        ..Default::default()
    })
}

fn period_from_filename(filename: &str) -> Option<String> {
    FILENAME_PERIOD
        .captures(filename)
        .map(|caps| format!("{}{}", &caps[1], &caps[2]))
}

/// Text content of a sample, or an error message if the bytes are not
/// valid UTF-8.
fn sample_text(sample: &ContentSample) -> std::result::Result<Option<String>, String> {
    match sample {
        ContentSample::Text(text) => Ok(Some(text.clone())),
        ContentSample::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Some(text.to_string())),
            Err(e) => Err(format!("content sample is not valid UTF-8: {}", e)),
        },
        ContentSample::Grid(_) | ContentSample::Empty => Ok(None),
    }
}

/// Grid view of a sample. Text samples are split on the dominant delimiter
/// of their first line (`;`, tab, or comma).
fn sample_grid(sample: &ContentSample) -> std::result::Result<Option<RawGrid>, String> {
    match sample {
        ContentSample::Grid(grid) => Ok(Some(grid.clone())),
        ContentSample::Text(text) => Ok(Some(text_to_grid(text))),
        ContentSample::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Some(text_to_grid(text))),
            Err(e) => Err(format!("content sample is not valid UTF-8: {}", e)),
        },
        ContentSample::Empty => Ok(None),
    }
}

fn text_to_grid(text: &str) -> RawGrid {
    let delimiter = text
        .lines()
        .next()
        .map(|line| {
            let counts = [
                (';', line.matches(';').count()),
                ('\t', line.matches('\t').count()),
                (',', line.matches(',').count()),
            ];
            counts
                .iter()
                .max_by_key(|(_, n)| *n)
                .map(|(d, _)| *d)
                .unwrap_or(';')
        })
        .unwrap_or(';');

    text.lines()
        .map(|line| line.split(delimiter).map(Cell::from).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Dialect;

    fn registry() -> BankRegistry {
        BankRegistry::default()
    }

    fn grid_sample(rows: &[&[&str]]) -> ContentSample {
        ContentSample::Grid(
            rows.iter()
                .map(|row| row.iter().map(|c| Cell::from(*c)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_archive_fast_path() {
        let result = classify("edefter_2023_12.zip", &ContentSample::Empty, &registry());
        assert_eq!(result.document_type, DocumentType::ElectronicLedgerArchive);
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.details.period.as_deref(), Some("202312"));
    }

    #[test]
    fn test_eledger_filename_identifiers() {
        let result = classify(
            "1234567890-202312-Y-000000.xml",
            &ContentSample::Empty,
            &registry(),
        );
        assert_eq!(result.document_type, DocumentType::ElectronicLedgerArchive);
        assert!(result.confidence > 0.95);
        assert_eq!(result.details.tax_id.as_deref(), Some("1234567890"));
        assert_eq!(result.details.period.as_deref(), Some("202312"));
    }

    #[test]
    fn test_invoice_markup_content() {
        let content = ContentSample::Text(
            r#"<?xml version="1.0"?><Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2">"#
                .to_string(),
        );
        let result = classify("export.xml", &content, &registry());
        assert_eq!(result.document_type, DocumentType::ElectronicInvoice);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_ledger_markup_content() {
        let content =
            ContentSample::Text("<xbrli:xbrl xmlns:gl-cor=\"...\">yevmiye</xbrli:xbrl>".to_string());
        let result = classify("defter.xml", &content, &registry());
        assert_eq!(result.document_type, DocumentType::ElectronicLedgerArchive);
    }

    #[test]
    fn test_pdf_declaration_keywords() {
        let result = classify(
            "KDV_Beyanname_2023_11.pdf",
            &ContentSample::Empty,
            &registry(),
        );
        assert_eq!(result.document_type, DocumentType::DeclarationPdf);
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.details.period.as_deref(), Some("202311"));
    }

    #[test]
    fn test_pdf_assessment_wins_over_declaration() {
        let result = classify(
            "kdv_beyanname_tahakkuk.pdf",
            &ContentSample::Empty,
            &registry(),
        );
        assert_eq!(result.document_type, DocumentType::AssessmentPdf);
    }

    #[test]
    fn test_pdf_statement_keywords() {
        let result = classify("hesap_ozeti_aralik.pdf", &ContentSample::Empty, &registry());
        assert_eq!(result.document_type, DocumentType::BankStatement);
    }

    #[test]
    fn test_spreadsheet_trial_balance() {
        let sample = grid_sample(&[
            &["Hesap Kodu", "Hesap Adı", "Borç", "Alacak"],
            &["100", "Kasa", "1500.50", "0"],
        ]);
        let result = classify("mizan.xlsx", &sample, &registry());
        assert_eq!(result.document_type, DocumentType::TrialBalanceSpreadsheet);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.details.dialect, Some(Dialect::LogoTiger));
    }

    #[test]
    fn test_delimited_trial_balance() {
        let sample = ContentSample::Text(
            "Hesap Kodu;Hesap Adı;Borç Tutarı;Alacak Tutarı\n100;Kasa;1500,50;0\n".to_string(),
        );
        let result = classify("mizan.csv", &sample, &registry());
        assert_eq!(result.document_type, DocumentType::TrialBalanceText);
        assert_eq!(result.details.dialect, Some(Dialect::Luca));
    }

    #[test]
    fn test_tabular_iban_fallback() {
        let sample = grid_sample(&[
            &["Tarih", "Açıklama", "Tutar"],
            &["01.12.2023", "Havale TR33000640000112345678901", "5.000,00"],
        ]);
        let result = classify("hareketler.csv", &sample, &registry());
        assert_eq!(result.document_type, DocumentType::BankStatement);
        assert_eq!(result.confidence, 0.7);
        assert_eq!(
            result.details.institution.as_ref().map(|i| i.name.as_str()),
            Some("Türkiye İş Bankası")
        );
    }

    #[test]
    fn test_unrecognized_tabular_keeps_headers() {
        let sample = grid_sample(&[&["Sipariş No", "Ürün", "Adet"]]);
        let result = classify("siparisler.csv", &sample, &registry());
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(
            result.details.headers,
            Some(vec![
                "Sipariş No".to_string(),
                "Ürün".to_string(),
                "Adet".to_string()
            ])
        );
    }

    #[test]
    fn test_invalid_utf8_degrades() {
        let sample = ContentSample::Bytes(vec![0xff, 0xfe, 0x00, 0x42]);
        let result = classify("dump.csv", &sample, &registry());
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.details.error.is_some());
    }

    #[test]
    fn test_unknown_extension() {
        let result = classify("backup.bak", &ContentSample::Empty, &registry());
        assert_eq!(result.document_type, DocumentType::Unknown);
        assert_eq!(result.confidence, 0.0);
    }
}
