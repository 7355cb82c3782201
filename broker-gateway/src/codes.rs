//! Vendor code tables.
//!
//! The quote and trade feeds number exchanges differently: quotes use
//! `1 = SSE, 2 = SZSE`, trading uses `1 = SZSE, 2 = SSE`.

use trading::{Direction, Exchange, InstrumentClass, Offset, OptionType, OrderStatus, OrderType, Product};

pub const PROTOCOL_TCP: i32 = 1;
pub const PROTOCOL_UDP: i32 = 2;

pub const BUSINESS_TYPE_CASH: i32 = 0;
pub const BUSINESS_TYPE_MARGIN: i32 = 4;
pub const BUSINESS_TYPE_OPTION: i32 = 10;

pub const ACCOUNT_TYPE_MARGIN: i32 = 1;
pub const ACCOUNT_TYPE_OPTION: i32 = 2;

/// Debt records of this type are borrowed securities, i.e. short positions.
pub const DEBT_TYPE_SECURITY: i32 = 1;

/// Positions reported under this market code are placeholders.
pub const MARKET_UNKNOWN: i32 = 0;

pub fn exchange_to_quote(exchange: Exchange) -> Option<i32> {
    match exchange {
        Exchange::Sse => Some(1),
        Exchange::Szse => Some(2),
        Exchange::Bse => None,
    }
}

pub fn exchange_from_quote(code: i32) -> Option<Exchange> {
    match code {
        1 => Some(Exchange::Sse),
        2 => Some(Exchange::Szse),
        _ => None,
    }
}

pub fn exchange_to_market(exchange: Exchange) -> Option<i32> {
    match exchange {
        Exchange::Szse => Some(1),
        Exchange::Sse => Some(2),
        Exchange::Bse => None,
    }
}

pub fn exchange_from_market(code: i32) -> Option<Exchange> {
    match code {
        1 => Some(Exchange::Szse),
        2 => Some(Exchange::Sse),
        _ => None,
    }
}

/// Equity side for a direction / offset pair.
pub fn stock_side_to_vendor(direction: Direction, offset: Offset) -> Option<i32> {
    match (direction, offset) {
        (Direction::Long, Offset::None) => Some(1),
        (Direction::Short, Offset::None) => Some(2),
        (Direction::Long, Offset::Open) => Some(21),
        (Direction::Short, Offset::Open) => Some(22),
        (Direction::Short, Offset::Close) => Some(23),
        (Direction::Long, Offset::Close) => Some(24),
        _ => None,
    }
}

pub fn stock_side_from_vendor(side: i32) -> Option<(Direction, Offset)> {
    match side {
        1 => Some((Direction::Long, Offset::None)),
        2 => Some((Direction::Short, Offset::None)),
        21 => Some((Direction::Long, Offset::Open)),
        22 => Some((Direction::Short, Offset::Open)),
        23 => Some((Direction::Short, Offset::Close)),
        24 => Some((Direction::Long, Offset::Close)),
        _ => None,
    }
}

pub fn option_side_to_vendor(direction: Direction) -> Option<i32> {
    match direction {
        Direction::Long => Some(1),
        Direction::Short => Some(2),
        Direction::Net => None,
    }
}

pub fn option_side_from_vendor(side: i32) -> Option<Direction> {
    match side {
        1 => Some(Direction::Long),
        2 => Some(Direction::Short),
        _ => None,
    }
}

pub fn is_buy_side(side: i32) -> bool {
    matches!(side, 1 | 21 | 24)
}

pub fn position_direction_from_vendor(code: i32) -> Option<Direction> {
    match code {
        0 => Some(Direction::Net),
        1 => Some(Direction::Long),
        2 | 3 => Some(Direction::Short),
        _ => None,
    }
}

/// Price type for an order type. Each instrument class has its own table.
pub fn order_type_to_vendor(class: InstrumentClass, order_type: OrderType) -> Option<i32> {
    match (class, order_type) {
        (_, OrderType::Limit) => Some(1),
        (InstrumentClass::Option, OrderType::Market) => Some(2),
        (InstrumentClass::Option, OrderType::Fok) => Some(8),
        (InstrumentClass::Equity, OrderType::Market) => Some(4),
        (InstrumentClass::Star, OrderType::Market) => Some(7),
        _ => None,
    }
}

/// Inverse of [`order_type_to_vendor`]; unknown price types read as market orders.
pub fn order_type_from_vendor(class: InstrumentClass, price_type: i32) -> OrderType {
    match (class, price_type) {
        (_, 1) => OrderType::Limit,
        (InstrumentClass::Option, 8) => OrderType::Fok,
        _ => OrderType::Market,
    }
}

pub fn status_from_vendor(code: i32) -> Option<OrderStatus> {
    match code {
        0 | 7 => Some(OrderStatus::Submitting),
        1 => Some(OrderStatus::AllTraded),
        2 => Some(OrderStatus::PartTraded),
        3 | 5 => Some(OrderStatus::Cancelled),
        4 => Some(OrderStatus::NotTraded),
        6 => Some(OrderStatus::Rejected),
        _ => None,
    }
}

pub fn status_to_vendor(status: OrderStatus) -> i32 {
    match status {
        OrderStatus::Submitting => 0,
        OrderStatus::AllTraded => 1,
        OrderStatus::PartTraded => 2,
        OrderStatus::NotTraded => 4,
        OrderStatus::Cancelled => 5,
        OrderStatus::Rejected => 6,
    }
}

pub fn product_from_vendor(code: i32) -> Option<Product> {
    match code {
        0 | 5 => Some(Product::Equity),
        1 => Some(Product::Index),
        2 | 6 => Some(Product::Fund),
        3 => Some(Product::Bond),
        4 => Some(Product::Option),
        _ => None,
    }
}

pub fn offset_to_vendor(offset: Offset) -> i32 {
    match offset {
        Offset::None => 0,
        Offset::Open => 1,
        Offset::Close => 2,
        Offset::CloseToday => 4,
        Offset::CloseYesterday => 5,
    }
}

pub fn offset_from_vendor(code: i32) -> Offset {
    match code {
        1 => Offset::Open,
        2 => Offset::Close,
        4 => Offset::CloseToday,
        5 => Offset::CloseYesterday,
        _ => Offset::None,
    }
}

pub fn option_type_from_vendor(code: i32) -> Option<OptionType> {
    match code {
        1 => Some(OptionType::Call),
        2 => Some(OptionType::Put),
        _ => None,
    }
}

/// SDK log level by name, case-insensitive.
pub fn log_level_code(name: &str) -> Option<i32> {
    match name.to_ascii_uppercase().as_str() {
        "FATAL" => Some(0),
        "ERROR" => Some(1),
        "WARNING" => Some(2),
        "INFO" => Some(3),
        "DEBUG" => Some(4),
        "TRACE" => Some(5),
        _ => None,
    }
}
