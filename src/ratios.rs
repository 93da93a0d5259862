//! Financial ratio computation over canonical accounts.
//!
//! A fixed table of 14 ratios across four categories, each with a
//! hard-coded normal band. Status is a pure function of the value against
//! the band: outside it by up to [`WARNING_DEVIATION`] of the violated
//! bound is a warning, beyond that critical. Ratios whose denominator is
//! zero are skipped, not reported.

use crate::aggregate::{balance_of, group_total};
use crate::schema::Account;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Relative deviation from the violated band bound that still counts as a
/// warning; anything further is critical.
pub const WARNING_DEVIATION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RatioCategory {
    Liquidity,
    CapitalStructure,
    Activity,
    Profitability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RatioUnit {
    Percentage,
    Multiple,
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RatioStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RatioResult {
    pub category: RatioCategory,
    pub name: String,
    /// Human-readable description of the formula.
    pub formula: String,
    pub value: f64,
    pub unit: RatioUnit,
    pub normal_range: (f64, f64),
    pub status: RatioStatus,
    pub sector_average: Option<f64>,
}

/// Aggregated balances the ratio table and the risk battery both read.
/// Liability, equity and revenue classes are credit-normal, so their net
/// balances are negated into positive magnitudes here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialSnapshot {
    pub cash: f64,
    pub banks: f64,
    pub securities: f64,
    pub trade_receivables: f64,
    pub inventory: f64,
    pub current_assets: f64,
    pub fixed_assets: f64,
    pub total_assets: f64,
    pub current_liabilities: f64,
    pub long_term_liabilities: f64,
    pub total_liabilities: f64,
    pub trade_payables: f64,
    pub equity: f64,
    pub paid_in_capital: f64,
    pub net_sales: f64,
    pub cost_of_goods_sold: f64,
    pub net_profit: f64,
}

impl FinancialSnapshot {
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let current_assets = group_total(accounts, "1");
        let fixed_assets = group_total(accounts, "2");
        let current_liabilities = -group_total(accounts, "3");
        let long_term_liabilities = -group_total(accounts, "4");
        // 61x sales deductions are debit-normal contra accounts, so summing
        // the 60x and 61x nets yields sales net of returns and discounts.
        let net_sales = -(group_total(accounts, "60") + group_total(accounts, "61"));
        Self {
            cash: balance_of(accounts, "100"),
            banks: group_total(accounts, "102"),
            securities: group_total(accounts, "11"),
            trade_receivables: group_total(accounts, "120") + group_total(accounts, "121"),
            inventory: group_total(accounts, "15"),
            current_assets,
            fixed_assets,
            total_assets: current_assets + fixed_assets,
            current_liabilities,
            long_term_liabilities,
            total_liabilities: current_liabilities + long_term_liabilities,
            trade_payables: -(group_total(accounts, "320") + group_total(accounts, "321")),
            equity: -group_total(accounts, "5"),
            paid_in_capital: -balance_of(accounts, "500"),
            net_sales,
            cost_of_goods_sold: group_total(accounts, "62"),
            net_profit: -group_total(accounts, "59"),
        }
    }
}

/// Status from a value and its normal band. Deterministic, no hidden state.
pub fn status_for(value: f64, (min, max): (f64, f64)) -> RatioStatus {
    if value >= min && value <= max {
        return RatioStatus::Normal;
    }
    let bound = if value < min { min } else { max };
    let deviation = (value - bound).abs() / bound.abs().max(f64::EPSILON);
    if deviation <= WARNING_DEVIATION {
        RatioStatus::Warning
    } else {
        RatioStatus::Critical
    }
}

struct RatioSpec {
    category: RatioCategory,
    name: &'static str,
    formula: &'static str,
    unit: RatioUnit,
    normal_range: (f64, f64),
    sector_average: Option<f64>,
}

impl RatioSpec {
    /// `None` when the computation is undefined (zero denominator); the
    /// ratio is then silently skipped.
    fn evaluate(&self, value: Option<f64>) -> Option<RatioResult> {
        let value = value?;
        Some(RatioResult {
            category: self.category,
            name: self.name.to_string(),
            formula: self.formula.to_string(),
            value,
            unit: self.unit,
            normal_range: self.normal_range,
            status: status_for(value, self.normal_range),
            sector_average: self.sector_average,
        })
    }
}

fn div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn pct(numerator: f64, denominator: f64) -> Option<f64> {
    div(numerator, denominator).map(|v| v * 100.0)
}

fn days(numerator: f64, denominator: f64) -> Option<f64> {
    div(numerator, denominator).map(|v| v * 365.0)
}

/// Compute the fixed ratio battery. Order is stable; undefined ratios are
/// omitted from the output.
pub fn compute_ratios(accounts: &[Account]) -> Vec<RatioResult> {
    let s = FinancialSnapshot::from_accounts(accounts);
    let quick_assets = s.current_assets - s.inventory;
    let liquid_assets = s.cash + s.banks + s.securities;
    let gross_profit = s.net_sales - s.cost_of_goods_sold;

    let table: [(RatioSpec, Option<f64>); 14] = [
        (
            RatioSpec {
                category: RatioCategory::Liquidity,
                name: "Cari Oran",
                formula: "Dönen Varlıklar / Kısa Vadeli Yabancı Kaynaklar",
                unit: RatioUnit::Multiple,
                normal_range: (1.5, 2.5),
                sector_average: Some(1.8),
            },
            div(s.current_assets, s.current_liabilities),
        ),
        (
            RatioSpec {
                category: RatioCategory::Liquidity,
                name: "Asit-Test Oranı",
                formula: "(Dönen Varlıklar - Stoklar) / Kısa Vadeli Yabancı Kaynaklar",
                unit: RatioUnit::Multiple,
                normal_range: (0.8, 1.5),
                sector_average: Some(1.0),
            },
            div(quick_assets, s.current_liabilities),
        ),
        (
            RatioSpec {
                category: RatioCategory::Liquidity,
                name: "Nakit Oranı",
                formula: "(Hazır Değerler + Menkul Kıymetler) / Kısa Vadeli Yabancı Kaynaklar",
                unit: RatioUnit::Multiple,
                normal_range: (0.2, 0.8),
                sector_average: None,
            },
            div(liquid_assets, s.current_liabilities),
        ),
        (
            RatioSpec {
                category: RatioCategory::CapitalStructure,
                name: "Kaldıraç Oranı",
                formula: "Toplam Yabancı Kaynaklar / Aktif Toplamı",
                unit: RatioUnit::Percentage,
                normal_range: (30.0, 60.0),
                sector_average: Some(50.0),
            },
            pct(s.total_liabilities, s.total_assets),
        ),
        (
            RatioSpec {
                category: RatioCategory::CapitalStructure,
                name: "Borç / Özkaynak Oranı",
                formula: "Toplam Yabancı Kaynaklar / Özkaynaklar",
                unit: RatioUnit::Multiple,
                normal_range: (0.5, 1.5),
                sector_average: None,
            },
            div(s.total_liabilities, s.equity),
        ),
        (
            RatioSpec {
                category: RatioCategory::CapitalStructure,
                name: "Özkaynak Oranı",
                formula: "Özkaynaklar / Aktif Toplamı",
                unit: RatioUnit::Percentage,
                normal_range: (40.0, 70.0),
                sector_average: None,
            },
            pct(s.equity, s.total_assets),
        ),
        (
            RatioSpec {
                category: RatioCategory::CapitalStructure,
                name: "Kısa Vadeli Borç Payı",
                formula: "Kısa Vadeli Yabancı Kaynaklar / Toplam Yabancı Kaynaklar",
                unit: RatioUnit::Percentage,
                normal_range: (40.0, 70.0),
                sector_average: None,
            },
            pct(s.current_liabilities, s.total_liabilities),
        ),
        (
            RatioSpec {
                category: RatioCategory::Activity,
                name: "Alacak Tahsil Süresi",
                formula: "Ticari Alacaklar / Net Satışlar x 365",
                unit: RatioUnit::Days,
                normal_range: (30.0, 90.0),
                sector_average: Some(60.0),
            },
            days(s.trade_receivables, s.net_sales),
        ),
        (
            RatioSpec {
                category: RatioCategory::Activity,
                name: "Stok Tutma Süresi",
                formula: "Stoklar / Satılan Malın Maliyeti x 365",
                unit: RatioUnit::Days,
                normal_range: (30.0, 120.0),
                sector_average: None,
            },
            days(s.inventory, s.cost_of_goods_sold),
        ),
        (
            RatioSpec {
                category: RatioCategory::Activity,
                name: "Borç Ödeme Süresi",
                formula: "Ticari Borçlar / Satılan Malın Maliyeti x 365",
                unit: RatioUnit::Days,
                normal_range: (30.0, 90.0),
                sector_average: None,
            },
            days(s.trade_payables, s.cost_of_goods_sold),
        ),
        (
            RatioSpec {
                category: RatioCategory::Activity,
                name: "Aktif Devir Hızı",
                formula: "Net Satışlar / Aktif Toplamı",
                unit: RatioUnit::Multiple,
                normal_range: (0.8, 2.5),
                sector_average: None,
            },
            div(s.net_sales, s.total_assets),
        ),
        (
            RatioSpec {
                category: RatioCategory::Profitability,
                name: "Brüt Kâr Marjı",
                formula: "(Net Satışlar - Satılan Malın Maliyeti) / Net Satışlar",
                unit: RatioUnit::Percentage,
                normal_range: (15.0, 45.0),
                sector_average: Some(30.0),
            },
            pct(gross_profit, s.net_sales),
        ),
        (
            RatioSpec {
                category: RatioCategory::Profitability,
                name: "Net Kâr Marjı",
                formula: "Dönem Net Kârı / Net Satışlar",
                unit: RatioUnit::Percentage,
                normal_range: (5.0, 20.0),
                sector_average: None,
            },
            pct(s.net_profit, s.net_sales),
        ),
        (
            RatioSpec {
                category: RatioCategory::Profitability,
                name: "Özkaynak Kârlılığı",
                formula: "Dönem Net Kârı / Özkaynaklar",
                unit: RatioUnit::Percentage,
                normal_range: (10.0, 30.0),
                sector_average: None,
            },
            pct(s.net_profit, s.equity),
        ),
    ];

    let results: Vec<RatioResult> = table
        .into_iter()
        .filter_map(|(spec, value)| spec.evaluate(value))
        .collect();

    debug!("Computed {} of 14 ratios", results.len());
    results
}
