use serde::{Deserialize, Serialize};

/// Rounds a currency amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Cash,
    Credit,
}

/// Funds snapshot. Cash snapshots fill the balance fields, credit snapshots
/// fill the margin fields; the other group stays at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: String,
    pub asset_type: AssetType,

    pub balance: f64,
    pub available: f64,
    pub frozen: f64,
    pub buying_power: f64,
    pub withholding_amount: f64,
    pub fund_buy_amount: f64,

    pub all_asset: f64,
    pub all_debt: f64,
    pub guaranty: f64,
    pub maintenance_ratio: f64,
    pub line_of_credit: f64,
}

impl AccountRecord {
    pub fn new(account_id: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            account_id: account_id.into(),
            asset_type,
            balance: 0.0,
            available: 0.0,
            frozen: 0.0,
            buying_power: 0.0,
            withholding_amount: 0.0,
            fund_buy_amount: 0.0,
            all_asset: 0.0,
            all_debt: 0.0,
            guaranty: 0.0,
            maintenance_ratio: 0.0,
            line_of_credit: 0.0,
        }
    }
}
