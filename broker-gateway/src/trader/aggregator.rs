//! Position and fund snapshots from query responses.

use crate::codes;
use crate::error::{GatewayError, Result};
use crate::wire::{RawAsset, RawCreditFund, RawDebt, RawPosition};
use std::collections::BTreeMap;
use trading::model::account::round_cents;
use trading::{AccountRecord, AssetType, ContractKey, Direction, PositionRecord};

/// Account flavour detected from a cash asset response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Cash,
    Margin,
    Option,
}

/// Sums borrowed-security debt across the pages of one debt query.
///
/// [`ShortPositionAccumulator::reset`] starts a cycle, and
/// [`ShortPositionAccumulator::flush`] ends it on the last page. A cycle marked
/// with [`ShortPositionAccumulator::discard`] publishes nothing.
#[derive(Debug, Default)]
pub struct ShortPositionAccumulator {
    positions: BTreeMap<ContractKey, PositionRecord>,
    discarded: bool,
}

impl ShortPositionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one debt record. Records other than borrowed securities are ignored.
    pub fn add(&mut self, debt: &RawDebt) -> Result<()> {
        if self.discarded || debt.debt_type != codes::DEBT_TYPE_SECURITY {
            return Ok(());
        }
        let exchange = codes::exchange_from_market(debt.market).ok_or(GatewayError::UnknownCode {
            field: "market",
            code: debt.market,
        })?;
        let key = ContractKey::new(debt.ticker.clone(), exchange);
        self.positions
            .entry(key.clone())
            .or_insert_with(|| PositionRecord::new(key, Direction::Short))
            .volume += debt.remain_qty as f64;
        Ok(())
    }

    /// Hands out the accumulated short positions and resets.
    pub fn flush(&mut self) -> Vec<PositionRecord> {
        let positions = std::mem::take(&mut self.positions);
        if std::mem::take(&mut self.discarded) {
            return Vec::new();
        }
        positions.into_values().collect()
    }

    /// Drops partial totals from an abandoned cycle.
    pub fn reset(&mut self) {
        self.positions.clear();
        self.discarded = false;
    }

    /// Marks the current cycle as failed: its totals are dropped and later
    /// pages of the same cycle are ignored until the next flush or reset.
    pub fn discard(&mut self) {
        self.positions.clear();
        self.discarded = true;
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Converts one position page. Pages on the placeholder market yield `None`.
pub fn position_from_raw(raw: &RawPosition) -> Result<Option<PositionRecord>> {
    if raw.market == codes::MARKET_UNKNOWN {
        return Ok(None);
    }
    let exchange = codes::exchange_from_market(raw.market).ok_or(GatewayError::UnknownCode {
        field: "market",
        code: raw.market,
    })?;
    let direction = codes::position_direction_from_vendor(raw.position_direction).ok_or(
        GatewayError::UnknownCode {
            field: "position_direction",
            code: raw.position_direction,
        },
    )?;

    let mut position = PositionRecord::new(ContractKey::new(raw.ticker.clone(), exchange), direction);
    position.volume = raw.total_qty as f64;
    position.frozen = (raw.total_qty - raw.sellable_qty).max(0) as f64;
    position.price = raw.avg_price;
    position.pnl = raw.unrealized_pnl;
    position.yd_volume = raw.yesterday_position as f64;
    Ok(Some(position))
}

/// Builds the cash account snapshot and reports which account flavour it is.
pub fn account_from_asset(raw: &RawAsset, account_id: &str) -> (AccountRecord, AccountKind) {
    let mut account = AccountRecord::new(account_id, AssetType::Cash);
    account.balance = round_cents(raw.total_asset);
    account.frozen = round_cents(raw.withholding_amount);
    account.withholding_amount = round_cents(raw.withholding_amount);
    account.buying_power = round_cents(raw.buying_power);
    account.fund_buy_amount = round_cents(raw.fund_buy_amount);
    account.available = round_cents(raw.buying_power);

    let kind = match raw.account_type {
        codes::ACCOUNT_TYPE_MARGIN => AccountKind::Margin,
        codes::ACCOUNT_TYPE_OPTION => {
            account.frozen =
                round_cents(account.balance - account.available - raw.security_asset);
            AccountKind::Option
        }
        _ => AccountKind::Cash,
    };
    (account, kind)
}

pub fn account_from_credit_fund(raw: &RawCreditFund, account_id: &str) -> AccountRecord {
    let mut account = AccountRecord::new(account_id, AssetType::Credit);
    account.all_asset = round_cents(raw.all_asset);
    account.all_debt = round_cents(raw.all_debt);
    account.guaranty = round_cents(raw.guaranty);
    account.maintenance_ratio = round_cents(raw.maintenance_ratio);
    account.line_of_credit = round_cents(raw.line_of_credit);
    account
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading::Exchange;

    fn debt(ticker: &str, market: i32, debt_type: i32, remain_qty: i64) -> RawDebt {
        RawDebt {
            ticker: ticker.to_string(),
            market,
            debt_type,
            remain_qty,
        }
    }

    #[test]
    fn test_debt_pages_sum_per_contract() {
        let mut shorts = ShortPositionAccumulator::new();
        shorts.add(&debt("000001", 1, 1, 200)).unwrap();
        shorts.add(&debt("000001", 1, 1, 50)).unwrap();
        shorts.add(&debt("000001", 1, 0, 999)).unwrap();

        let positions = shorts.flush();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].key, ContractKey::new("000001", Exchange::Szse));
        assert_eq!(positions[0].direction, Direction::Short);
        assert_eq!(positions[0].volume, 250.0);
        assert!(shorts.is_empty());
        assert!(shorts.flush().is_empty());
    }

    #[test]
    fn test_reset_drops_partial_cycle() {
        let mut shorts = ShortPositionAccumulator::new();
        shorts.add(&debt("000001", 1, 1, 200)).unwrap();
        shorts.reset();
        shorts.add(&debt("000001", 1, 1, 50)).unwrap();

        let positions = shorts.flush();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].volume, 50.0);
    }

    #[test]
    fn test_discarded_cycle_publishes_nothing() {
        let mut shorts = ShortPositionAccumulator::new();
        shorts.add(&debt("000001", 1, 1, 200)).unwrap();
        shorts.discard();
        shorts.add(&debt("000001", 1, 1, 50)).unwrap();
        assert!(shorts.flush().is_empty());

        // the next cycle accumulates again
        shorts.add(&debt("000001", 1, 1, 70)).unwrap();
        assert_eq!(shorts.flush()[0].volume, 70.0);
    }

    #[test]
    fn test_position_page_conversion() {
        let raw = RawPosition {
            ticker: "600000".to_string(),
            market: 2,
            position_direction: 0,
            total_qty: 1000,
            sellable_qty: 600,
            avg_price: 10.5,
            unrealized_pnl: -12.0,
            yesterday_position: 600,
        };
        let position = position_from_raw(&raw).unwrap().unwrap();
        assert_eq!(position.key, ContractKey::new("600000", Exchange::Sse));
        assert_eq!(position.direction, Direction::Net);
        assert_eq!(position.frozen, 400.0);
        assert_eq!(position.yd_volume, 600.0);

        let placeholder = RawPosition { market: 0, ..raw };
        assert_eq!(position_from_raw(&placeholder).unwrap(), None);
    }

    #[test]
    fn test_option_account_recomputes_frozen() {
        let raw = RawAsset {
            account_type: 2,
            total_asset: 100_000.004,
            withholding_amount: 10.0,
            buying_power: 60_000.0,
            fund_buy_amount: 0.0,
            security_asset: 30_000.0,
        };
        let (account, kind) = account_from_asset(&raw, "acct");
        assert_eq!(kind, AccountKind::Option);
        assert_eq!(account.balance, 100_000.0);
        assert_eq!(account.available, 60_000.0);
        assert_eq!(account.frozen, 10_000.0);
        assert_eq!(account.asset_type, AssetType::Cash);
    }

    #[test]
    fn test_margin_account_detection() {
        let raw = RawAsset {
            account_type: 1,
            withholding_amount: 12.346,
            ..Default::default()
        };
        let (account, kind) = account_from_asset(&raw, "acct");
        assert_eq!(kind, AccountKind::Margin);
        assert_eq!(account.frozen, 12.35);
    }

    #[test]
    fn test_credit_fund_conversion() {
        let raw = RawCreditFund {
            all_asset: 500_000.126,
            all_debt: 100_000.0,
            guaranty: 400_000.0,
            maintenance_ratio: 4.999,
            line_of_credit: 1_000_000.0,
        };
        let account = account_from_credit_fund(&raw, "acct");
        assert_eq!(account.asset_type, AssetType::Credit);
        assert_eq!(account.all_asset, 500_000.13);
        assert_eq!(account.maintenance_ratio, 5.0);
        assert_eq!(account.balance, 0.0);
    }
}
