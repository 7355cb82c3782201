use super::contract::*;
use super::market_data::*;
use super::order::*;
use crate::error::ModelError;

#[test]
fn test_contract_key_round_trips_through_display() {
    let key: ContractKey = "600000.SSE".parse().unwrap();
    assert_eq!(key, ContractKey::new("600000", Exchange::Sse));
    assert_eq!(key.to_string(), "600000.SSE");
}

#[test]
fn test_contract_key_rejects_malformed_input() {
    assert!(matches!(
        "600000".parse::<ContractKey>(),
        Err(ModelError::InvalidContractKey(_))
    ));
    assert!(matches!(
        ".SSE".parse::<ContractKey>(),
        Err(ModelError::InvalidContractKey(_))
    ));
    assert!(matches!(
        "600000.NYSE".parse::<ContractKey>(),
        Err(ModelError::UnknownExchange(_))
    ));
}

#[test]
fn test_instrument_classification() {
    assert_eq!(InstrumentClass::classify("10004567"), InstrumentClass::Option);
    assert_eq!(InstrumentClass::classify("688981"), InstrumentClass::Star);
    assert_eq!(InstrumentClass::classify("600000"), InstrumentClass::Equity);
    assert_eq!(InstrumentClass::classify("000001"), InstrumentClass::Equity);
}

#[test]
fn test_contract_meta_requires_positive_tick() {
    let key = ContractKey::new("600000", Exchange::Sse);
    assert!(ContractMeta::new(key.clone(), "PF Bank", Product::Equity, 0.01).is_ok());
    assert_eq!(
        ContractMeta::new(key.clone(), "PF Bank", Product::Equity, 0.0),
        Err(ModelError::InvalidPriceTick(0.0))
    );
    assert!(ContractMeta::new(key, "PF Bank", Product::Equity, f64::NAN).is_err());
}

#[test]
fn test_option_index() {
    assert_eq!(
        OptionDetail::option_index(3.0, "510050C2403M03000"),
        "3.000-M03000"
    );
    assert_eq!(
        OptionDetail::option_index(2.5, "510050P2403A 02500"),
        "2.500-A02500"
    );
    assert_eq!(OptionDetail::option_index(2.5, "510050P2403"), "2.5");
}

#[test]
fn test_round_to_nearest_tick() {
    assert_eq!(round_to(10.234, 0.01), 10.23);
    assert_eq!(round_to(10.236, 0.01), 10.24);
    assert_eq!(round_to(3.0004, 0.001), 3.0);
    assert_eq!(round_to(7.77, 0.0), 7.77);
}

#[test]
fn test_tick_rounds_all_prices() {
    let key = ContractKey::new("600000", Exchange::Sse);
    let dt = chrono::TimeZone::with_ymd_and_hms(&china_tz(), 2024, 1, 2, 9, 30, 0).unwrap();
    let mut tick = TickRecord::new(key, dt);
    tick.last_price = 10.004;
    tick.limit_up = 11.006;
    tick.bids[0].price = 9.999;
    tick.asks[4].price = 10.051;
    tick.round_prices(0.01);
    assert_eq!(tick.last_price, 10.0);
    assert_eq!(tick.limit_up, 11.01);
    assert_eq!(tick.best_bid().price, 10.0);
    assert_eq!(tick.asks[4].price, 10.05);
}

#[test]
fn test_status_transitions_are_monotonic() {
    use OrderStatus::*;
    assert!(Submitting.can_transition_to(NotTraded));
    assert!(NotTraded.can_transition_to(PartTraded));
    assert!(PartTraded.can_transition_to(PartTraded));
    assert!(PartTraded.can_transition_to(Cancelled));
    assert!(!PartTraded.can_transition_to(NotTraded));
    assert!(!AllTraded.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(PartTraded));
}

#[test]
fn test_create_order_from_request() {
    let req = OrderRequest::new(
        ContractKey::new("600000", Exchange::Sse),
        Direction::Long,
        OrderType::Limit,
        10.5,
        1000.0,
    );
    let order = req.create_order("42");
    assert_eq!(order.order_id, "42");
    assert_eq!(order.status, OrderStatus::Submitting);
    assert_eq!(order.traded, 0.0);
    assert_eq!(order.remaining(), 1000.0);
    assert!(order.datetime.is_none());
}
