//! Outbound order validation and encoding.
//!
//! Every check here runs before the venue is called; a failed check means
//! nothing was sent.

use crate::codes;
use crate::error::{GatewayError, Result};
use crate::wire::RawOrderInsert;
use trading::{InstrumentClass, Offset, OrderRequest};

/// Account capabilities learned from the asset query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFlags {
    pub margin_trading: bool,
    pub option_trading: bool,
}

pub fn encode_order(req: &OrderRequest, flags: AccountFlags) -> Result<RawOrderInsert> {
    let market = codes::exchange_to_market(req.key.exchange)
        .ok_or(GatewayError::UnsupportedExchange(req.key.exchange))?;
    if flags.margin_trading && req.offset == Offset::None {
        return Err(GatewayError::MissingOffset);
    }
    if !(req.volume.is_finite() && req.volume >= 1.0) {
        return Err(GatewayError::InvalidVolume(req.volume));
    }

    let class = req.key.class();
    let price_type = codes::order_type_to_vendor(class, req.order_type).ok_or(
        GatewayError::UnsupportedOrderType {
            class,
            order_type: req.order_type,
        },
    )?;

    let (side, position_effect, business_type) = match class {
        InstrumentClass::Option => {
            let side = codes::option_side_to_vendor(req.direction).ok_or(
                GatewayError::UnsupportedDirection {
                    direction: req.direction,
                    offset: req.offset,
                },
            )?;
            (
                side,
                codes::offset_to_vendor(req.offset),
                codes::BUSINESS_TYPE_OPTION,
            )
        }
        InstrumentClass::Star | InstrumentClass::Equity => {
            // collateral trades on a margin account keep the plain buy/sell side
            let side_offset = if flags.margin_trading && req.margin_financed == Some(true) {
                req.offset
            } else {
                Offset::None
            };
            let side = codes::stock_side_to_vendor(req.direction, side_offset).ok_or(
                GatewayError::UnsupportedDirection {
                    direction: req.direction,
                    offset: side_offset,
                },
            )?;
            let business_type = if flags.margin_trading {
                codes::BUSINESS_TYPE_MARGIN
            } else {
                codes::BUSINESS_TYPE_CASH
            };
            (side, codes::offset_to_vendor(Offset::None), business_type)
        }
    };

    Ok(RawOrderInsert {
        ticker: req.key.symbol.clone(),
        market,
        price: req.price,
        quantity: req.volume as i64,
        side,
        position_effect,
        price_type,
        business_type,
    })
}
