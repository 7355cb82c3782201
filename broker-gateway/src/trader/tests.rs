use super::reconciler::{OrderReconciler, OrderUpdate, ReconcileError};
use super::session::{TdSession, TdState};
use crate::api::{ApiError, TraderLogin, TraderSpi};
use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::paper::{PaperVenue, VenueCall};
use crate::wire::{RawAsset, RawDebt, RawOptionInfo, RawOrder, RawPosition, RawTrade, TraderEvent};
use chrono::TimeZone;
use std::sync::Arc;
use std::time::Duration;
use trading::model::market_data::china_tz;
use trading::{
    CancelRequest, ContractKey, ContractMeta, Direction, Exchange, Offset, OrderRecord,
    OrderRequest, OrderStatus, OrderType, Product, TradeRecord,
};
use trading_core::stores::{MemoryConfigStore, StaticContractStore};
use trading_core::testing::RecordingSink;

const DELAY: Duration = Duration::from_secs(3);

fn spdb() -> ContractKey {
    ContractKey::new("600000", Exchange::Sse)
}

fn tracked(volume: f64) -> OrderRecord {
    OrderRequest::new(spdb(), Direction::Long, OrderType::Limit, 10.0, volume).create_order("1")
}

fn update(traded: f64, status: OrderStatus) -> OrderUpdate {
    OrderUpdate {
        order_id: "1".to_string(),
        key: spdb(),
        direction: Direction::Long,
        offset: Offset::None,
        order_type: OrderType::Limit,
        price: 10.0,
        volume: 1000.0,
        traded,
        status,
        insert_time: None,
    }
}

fn fill(trade_id: &str, volume: f64) -> TradeRecord {
    TradeRecord {
        trade_id: trade_id.to_string(),
        order_id: "1".to_string(),
        key: spdb(),
        direction: Direction::Long,
        offset: Offset::None,
        price: 10.0,
        volume,
        datetime: china_tz().with_ymd_and_hms(2024, 1, 2, 9, 31, 0).unwrap(),
    }
}

// --- reconciler ---

#[test]
fn test_update_then_fill_does_not_double_count() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));

    let order = reconciler.apply_update(update(300.0, OrderStatus::PartTraded));
    assert_eq!(order.traded, 300.0);

    let outcome = reconciler.apply_fill(fill("T1", 300.0)).unwrap();
    assert_eq!(outcome.order.traded, 300.0);
    assert_eq!(outcome.order.status, OrderStatus::PartTraded);
    assert!(outcome.refresh_account);
}

#[test]
fn test_fill_then_update_does_not_double_count() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));

    reconciler.apply_fill(fill("T1", 300.0)).unwrap();
    let order = reconciler.apply_update(update(300.0, OrderStatus::PartTraded));
    assert_eq!(order.traded, 300.0);
    assert_eq!(order.status, OrderStatus::PartTraded);
}

#[test]
fn test_fills_complete_the_order() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));

    reconciler.apply_fill(fill("T1", 400.0)).unwrap();
    let outcome = reconciler.apply_fill(fill("T2", 600.0)).unwrap();
    assert_eq!(outcome.order.traded, 1000.0);
    assert_eq!(outcome.order.status, OrderStatus::AllTraded);
    assert_eq!(reconciler.active_orders().count(), 0);
}

#[test]
fn test_unknown_order_fill_is_rejected_without_state() {
    let mut reconciler = OrderReconciler::new();
    let err = reconciler.apply_fill(fill("T1", 100.0)).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::UnknownOrder {
            trade_id: "T1".to_string(),
            order_id: "1".to_string(),
        }
    );
    assert!(reconciler.is_empty());

    // the same trade id is still applicable once the order is known
    reconciler.track_submitted(tracked(1000.0));
    assert!(reconciler.apply_fill(fill("T1", 100.0)).is_ok());
}

#[test]
fn test_duplicate_trade_is_ignored() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));
    reconciler.apply_fill(fill("T1", 300.0)).unwrap();

    let err = reconciler.apply_fill(fill("T1", 300.0)).unwrap_err();
    assert_eq!(err, ReconcileError::DuplicateTrade("T1".to_string()));
    assert_eq!(reconciler.get("1").unwrap().traded, 300.0);
}

#[test]
fn test_terminal_status_is_sticky() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));
    reconciler.apply_update(update(0.0, OrderStatus::Cancelled));

    let order = reconciler.apply_update(update(0.0, OrderStatus::NotTraded));
    assert_eq!(order.status, OrderStatus::Cancelled);

    // a late fill raises traded but keeps the terminal status
    let outcome = reconciler.apply_fill(fill("T1", 200.0)).unwrap();
    assert_eq!(outcome.order.traded, 200.0);
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert!(outcome.refresh_account);
}

#[test]
fn test_trade_ids_are_scoped_to_their_order() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));
    let other = OrderRequest::new(
        ContractKey::new("000001", Exchange::Szse),
        Direction::Long,
        OrderType::Limit,
        11.0,
        500.0,
    )
    .create_order("2");
    reconciler.track_submitted(other);

    reconciler.apply_fill(fill("1", 300.0)).unwrap();
    let outcome = reconciler
        .apply_fill(TradeRecord {
            order_id: "2".to_string(),
            key: ContractKey::new("000001", Exchange::Szse),
            ..fill("1", 200.0)
        })
        .unwrap();
    assert_eq!(outcome.order.traded, 200.0);
    assert_eq!(reconciler.get("1").unwrap().traded, 300.0);

    let err = reconciler
        .apply_fill(TradeRecord {
            order_id: "2".to_string(),
            ..fill("1", 200.0)
        })
        .unwrap_err();
    assert_eq!(err, ReconcileError::DuplicateTrade("1".to_string()));
}

#[test]
fn test_stale_updates_never_lower_state() {
    let mut reconciler = OrderReconciler::new();
    reconciler.track_submitted(tracked(1000.0));
    reconciler.apply_update(update(500.0, OrderStatus::PartTraded));

    let order = reconciler.apply_update(update(100.0, OrderStatus::NotTraded));
    assert_eq!(order.traded, 500.0);
    assert_eq!(order.status, OrderStatus::PartTraded);

    let order = reconciler.apply_update(update(5000.0, OrderStatus::AllTraded));
    assert_eq!(order.traded, 1000.0);
    assert_eq!(order.status, OrderStatus::AllTraded);
}

#[test]
fn test_interleavings_respect_bounds() {
    enum Step {
        Update(f64, OrderStatus),
        Fill(&'static str, f64),
    }
    let scripts = [
        vec![
            Step::Fill("a", 600.0),
            Step::Update(0.0, OrderStatus::NotTraded),
            Step::Fill("b", 600.0),
            Step::Update(600.0, OrderStatus::PartTraded),
        ],
        vec![
            Step::Update(1000.0, OrderStatus::AllTraded),
            Step::Fill("a", 500.0),
            Step::Update(0.0, OrderStatus::Submitting),
            Step::Fill("a", 500.0),
        ],
        vec![
            Step::Update(200.0, OrderStatus::Cancelled),
            Step::Fill("a", 200.0),
            Step::Fill("b", 900.0),
            Step::Update(300.0, OrderStatus::PartTraded),
        ],
    ];

    for script in scripts {
        let mut reconciler = OrderReconciler::new();
        reconciler.track_submitted(tracked(1000.0));
        let mut was_terminal = false;
        let mut last_traded = 0.0;
        for step in script {
            let order = match step {
                Step::Update(traded, status) => reconciler.apply_update(update(traded, status)),
                Step::Fill(id, volume) => match reconciler.apply_fill(fill(id, volume)) {
                    Ok(outcome) => outcome.order,
                    Err(_) => reconciler.get("1").unwrap().clone(),
                },
            };
            assert!(order.traded <= order.volume);
            assert!(order.traded >= last_traded);
            if was_terminal {
                assert!(order.status.is_terminal());
            }
            was_terminal = order.status.is_terminal();
            last_traded = order.traded;
        }
    }
}

// --- session ---

struct Harness {
    venue: PaperVenue,
    sink: Arc<RecordingSink>,
    session: TdSession,
}

fn login() -> TraderLogin {
    TraderLogin {
        host: "127.0.0.1".to_string(),
        port: 6001,
        account_id: "acct".to_string(),
        password: "secret".to_string(),
        client_id: 1,
        software_key: "key".to_string(),
        local_ip: "127.0.0.1".to_string(),
        log_level: 3,
    }
}

/// A session over a paper venue whose callbacks are dropped; tests feed
/// events by hand through `handle_event`.
fn harness(stored: Vec<ContractMeta>) -> Harness {
    let venue = PaperVenue::new(1_000_000.0);
    venue.set_auto_fill(false);
    let sink = Arc::new(RecordingSink::new());
    let context = GatewayContext::new(
        sink.clone(),
        Arc::new(MemoryConfigStore::new()),
        Arc::new(StaticContractStore::new(stored)),
    );
    let session = TdSession::new(
        Box::new(venue.trader_api()),
        TraderSpi::noop(),
        &context,
        DELAY,
    );
    Harness {
        venue,
        sink,
        session,
    }
}

fn connected() -> Harness {
    let mut h = harness(Vec::new());
    h.session.connect(login()).unwrap();
    h.venue.clear_calls();
    h.sink.clear();
    h
}

fn count(venue: &PaperVenue, call: VenueCall) -> usize {
    venue.calls().into_iter().filter(|c| *c == call).count()
}

fn raw_order(order_xtp_id: u64, qty_traded: i64, order_status: i32) -> RawOrder {
    RawOrder {
        order_xtp_id,
        ticker: "600000".to_string(),
        market: 2,
        price: 10.0,
        quantity: 1000,
        qty_traded,
        side: 1,
        price_type: 1,
        order_status,
        insert_time: 20240102093000000,
        ..Default::default()
    }
}

fn raw_trade(order_xtp_id: u64, exec_id: &str, quantity: i64) -> RawTrade {
    RawTrade {
        order_xtp_id,
        exec_id: exec_id.to_string(),
        ticker: "600000".to_string(),
        market: 2,
        side: 1,
        price: 10.0,
        quantity,
        trade_time: 20240102093100000,
        ..Default::default()
    }
}

fn limit_buy(volume: f64) -> OrderRequest {
    OrderRequest::new(spdb(), Direction::Long, OrderType::Limit, 10.0, volume)
}

#[test]
fn test_login_bootstraps_directory_and_queries() {
    let stored = ContractMeta::new(spdb(), "SPDB", Product::Equity, 0.01).unwrap();
    let mut h = harness(vec![stored]);
    h.session.connect(login()).unwrap();

    assert_eq!(h.session.state(), TdState::Initialized);
    let calls = h.venue.calls();
    assert_eq!(
        calls,
        vec![
            VenueCall::TraderLogin,
            VenueCall::QueryOptionInfo,
            VenueCall::QueryAsset,
            VenueCall::QueryCreditFund,
        ]
    );
    assert!(h.sink.logged("trading server login succeeded"));
}

#[test]
fn test_second_connect_is_rejected() {
    let mut h = connected();
    assert!(matches!(
        h.session.connect(login()),
        Err(GatewayError::AlreadyConnected)
    ));
    assert_eq!(count(&h.venue, VenueCall::TraderLogin), 0);
}

#[test]
fn test_login_failure_is_reported_without_retry() {
    let mut h = harness(Vec::new());
    h.venue
        .fail_next_trader_login(ApiError::new(10_200_003, "invalid password"));
    h.session.connect(login()).unwrap();

    assert_eq!(h.session.state(), TdState::Disconnected);
    let errors = h.sink.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_id, Some(10_200_003));
    assert!(errors[0].message.contains("invalid password"));
    assert_eq!(count(&h.venue, VenueCall::TraderLogin), 1);
}

#[test]
fn test_send_order_tracks_submitting_order() {
    let mut h = connected();
    let order_id = h.session.send_order(limit_buy(1000.0)).unwrap();

    assert_eq!(order_id, "1");
    let orders = h.sink.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Submitting);
    assert_eq!(h.session.reconciler().len(), 1);
}

#[test]
fn test_invalid_order_never_reaches_venue() {
    let mut h = connected();
    let bse = OrderRequest::new(
        ContractKey::new("430047", Exchange::Bse),
        Direction::Long,
        OrderType::Limit,
        10.0,
        100.0,
    );
    assert!(matches!(
        h.session.send_order(bse),
        Err(GatewayError::UnsupportedExchange(Exchange::Bse))
    ));
    let fok = OrderRequest::new(spdb(), Direction::Long, OrderType::Fok, 10.0, 100.0);
    assert!(matches!(
        h.session.send_order(fok),
        Err(GatewayError::UnsupportedOrderType { .. })
    ));

    assert_eq!(h.venue.calls(), Vec::new());
    assert!(h.session.reconciler().is_empty());
    assert!(h.sink.logged("order rejected"));
}

#[test]
fn test_validation_runs_before_connection_check() {
    let mut h = harness(Vec::new());
    let bse = OrderRequest::new(
        ContractKey::new("430047", Exchange::Bse),
        Direction::Long,
        OrderType::Limit,
        10.0,
        100.0,
    );
    assert!(matches!(
        h.session.send_order(bse),
        Err(GatewayError::UnsupportedExchange(_))
    ));
    assert!(matches!(
        h.session.send_order(limit_buy(100.0)),
        Err(GatewayError::NotConnected)
    ));
}

#[test]
fn test_margin_account_requires_offset() {
    let mut h = connected();
    h.session.handle_event(TraderEvent::Asset {
        asset: RawAsset {
            account_type: 1,
            ..Default::default()
        },
        error: None,
    });
    assert!(h.session.flags().margin_trading);

    assert!(matches!(
        h.session.send_order(limit_buy(100.0)),
        Err(GatewayError::MissingOffset)
    ));
    h.session
        .send_order(limit_buy(100.0).with_offset(Offset::Open))
        .unwrap();
}

#[test]
fn test_fill_after_update_refreshes_account_once() {
    let mut h = connected();
    let order_id = h.session.send_order(limit_buy(1000.0)).unwrap();
    let xtp_id: u64 = order_id.parse().unwrap();
    h.venue.clear_calls();

    h.session.handle_event(TraderEvent::Order {
        order: raw_order(xtp_id, 300, 2),
        error: None,
    });
    let order = h.session.reconciler().get(&order_id).unwrap().clone();
    assert_eq!(order.traded, 300.0);
    assert_eq!(order.status, OrderStatus::PartTraded);
    assert!(order.datetime.is_some());

    h.session
        .handle_event(TraderEvent::Trade(raw_trade(xtp_id, "T1", 300)));
    let order = h.session.reconciler().get(&order_id).unwrap().clone();
    assert_eq!(order.traded, 300.0);
    assert_eq!(order.status, OrderStatus::PartTraded);

    assert_eq!(count(&h.venue, VenueCall::QueryAsset), 1);
    assert_eq!(count(&h.venue, VenueCall::QueryCreditFund), 1);
    assert_eq!(h.sink.trades().len(), 1);
}

#[test]
fn test_unknown_order_fill_is_reported_and_dropped() {
    let mut h = connected();
    h.session
        .handle_event(TraderEvent::Trade(raw_trade(77, "T9", 100)));

    assert!(h.sink.trades().is_empty());
    assert!(h.sink.orders().is_empty());
    assert!(h.sink.logged("unknown order 77"));
    assert_eq!(count(&h.venue, VenueCall::QueryAsset), 0);
}

#[test]
fn test_redelivered_trade_is_ignored() {
    let mut h = connected();
    let order_id = h.session.send_order(limit_buy(1000.0)).unwrap();
    let xtp_id: u64 = order_id.parse().unwrap();

    h.session
        .handle_event(TraderEvent::Trade(raw_trade(xtp_id, "T1", 400)));
    h.session
        .handle_event(TraderEvent::Trade(raw_trade(xtp_id, "T1", 400)));

    assert_eq!(h.sink.trades().len(), 1);
    assert_eq!(h.session.reconciler().get(&order_id).unwrap().traded, 400.0);
}

#[test]
fn test_same_exec_id_on_both_exchanges_is_applied_twice() {
    let mut h = connected();
    let sse_id = h.session.send_order(limit_buy(1000.0)).unwrap();
    let szse_req = OrderRequest::new(
        ContractKey::new("000001", Exchange::Szse),
        Direction::Long,
        OrderType::Limit,
        11.0,
        500.0,
    );
    let szse_id = h.session.send_order(szse_req).unwrap();

    h.session.handle_event(TraderEvent::Trade(raw_trade(
        sse_id.parse().unwrap(),
        "1",
        300,
    )));
    h.session.handle_event(TraderEvent::Trade(RawTrade {
        ticker: "000001".to_string(),
        market: 1,
        price: 11.0,
        ..raw_trade(szse_id.parse().unwrap(), "1", 500)
    }));

    assert_eq!(h.sink.trades().len(), 2);
    let szse = h.session.reconciler().get(&szse_id).unwrap();
    assert_eq!(szse.traded, 500.0);
    assert_eq!(szse.status, OrderStatus::AllTraded);
    assert_eq!(count(&h.venue, VenueCall::QueryAsset), 2);
}

#[test]
fn test_fill_after_cancel_refreshes_account() {
    let mut h = connected();
    let order_id = h.session.send_order(limit_buy(1000.0)).unwrap();
    let xtp_id: u64 = order_id.parse().unwrap();
    h.session.handle_event(TraderEvent::Order {
        order: raw_order(xtp_id, 0, 5),
        error: None,
    });
    h.venue.clear_calls();

    h.session
        .handle_event(TraderEvent::Trade(raw_trade(xtp_id, "T1", 300)));

    let order = h.session.reconciler().get(&order_id).unwrap().clone();
    assert_eq!(order.traded, 300.0);
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(count(&h.venue, VenueCall::QueryAsset), 1);
    assert_eq!(count(&h.venue, VenueCall::QueryCreditFund), 1);
}

#[test]
fn test_order_error_flag_does_not_block_update() {
    let mut h = connected();
    h.session.handle_event(TraderEvent::Order {
        order: raw_order(5, 0, 6),
        error: Some(ApiError::new(11_000_350, "insufficient funds")),
    });

    let order = h.session.reconciler().get("5").unwrap().clone();
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(h.sink.errors().len(), 1);
    assert_eq!(h.sink.orders().len(), 1);
}

#[test]
fn test_cancel_error_leaves_order_alone() {
    let mut h = connected();
    let order_id = h.session.send_order(limit_buy(1000.0)).unwrap();
    h.session.handle_event(TraderEvent::CancelError {
        order_xtp_id: order_id.parse().unwrap(),
        error: ApiError::new(11_000_343, "order already traded"),
    });

    assert_eq!(
        h.session.reconciler().get(&order_id).unwrap().status,
        OrderStatus::Submitting
    );
    assert_eq!(h.sink.errors().len(), 1);
}

#[test]
fn test_cancel_validates_order_id() {
    let mut h = connected();
    let err = h
        .session
        .cancel_order(&CancelRequest::new("not-a-number", spdb()))
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidOrderId(_)));

    h.session
        .cancel_order(&CancelRequest::new("42", spdb()))
        .unwrap();
    assert_eq!(h.venue.calls(), vec![VenueCall::CancelOrder(42)]);
}

#[test]
fn test_debt_pages_publish_short_position() {
    let mut h = connected();
    for (remain_qty, is_last) in [(200, false), (50, true)] {
        h.session.handle_event(TraderEvent::CreditDebt {
            debt: Some(RawDebt {
                ticker: "000001".to_string(),
                market: 1,
                debt_type: 1,
                remain_qty,
            }),
            error: None,
            is_last,
        });
    }

    let positions = h.sink.positions();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].key, ContractKey::new("000001", Exchange::Szse));
    assert_eq!(positions[0].direction, Direction::Short);
    assert_eq!(positions[0].volume, 250.0);

    // the next cycle starts from zero
    h.session.handle_event(TraderEvent::CreditDebt {
        debt: None,
        error: None,
        is_last: true,
    });
    assert_eq!(h.sink.positions().len(), 1);
}

fn debt_page(remain_qty: i64, is_last: bool) -> TraderEvent {
    TraderEvent::CreditDebt {
        debt: Some(RawDebt {
            ticker: "000001".to_string(),
            market: 1,
            debt_type: 1,
            remain_qty,
        }),
        error: None,
        is_last,
    }
}

#[test]
fn test_new_debt_query_drops_unfinished_cycle() {
    let mut h = connected();
    h.session.query_credit_debt().unwrap();
    h.session.handle_event(debt_page(200, false));

    h.session.query_credit_debt().unwrap();
    h.session.handle_event(debt_page(50, true));

    let positions = h.sink.positions();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].volume, 50.0);
}

#[test]
fn test_disconnect_drops_unfinished_debt_cycle() {
    let mut h = connected();
    h.session.handle_event(debt_page(200, false));
    h.session
        .handle_event(TraderEvent::Disconnected { reason: 1 });
    h.session.reconnect();

    h.session.handle_event(debt_page(50, true));
    assert_eq!(h.sink.positions()[0].volume, 50.0);
}

#[test]
fn test_failed_debt_query_publishes_nothing() {
    let mut h = connected();
    h.session.handle_event(debt_page(200, false));
    h.session.handle_event(TraderEvent::CreditDebt {
        debt: None,
        error: Some(ApiError::new(11_000_002, "query timed out")),
        is_last: true,
    });

    assert!(h.sink.positions().is_empty());
    assert_eq!(h.sink.errors().len(), 1);

    // the following cycle is unaffected
    h.session.handle_event(debt_page(70, true));
    assert_eq!(h.sink.positions()[0].volume, 70.0);
}

#[test]
fn test_position_query_fans_out_on_margin_account() {
    let mut h = connected();
    h.session.query_position().unwrap();
    assert_eq!(h.venue.calls(), vec![VenueCall::QueryPosition]);

    h.session.handle_event(TraderEvent::Asset {
        asset: RawAsset {
            account_type: 1,
            ..Default::default()
        },
        error: None,
    });
    h.venue.clear_calls();
    h.session.query_position().unwrap();
    assert_eq!(
        h.venue.calls(),
        vec![VenueCall::QueryPosition, VenueCall::QueryCreditDebt]
    );
}

#[test]
fn test_position_pages_skip_placeholder_market() {
    let mut h = connected();
    let page = RawPosition {
        ticker: "600000".to_string(),
        market: 2,
        total_qty: 500,
        sellable_qty: 500,
        ..Default::default()
    };
    h.session.handle_event(TraderEvent::Position {
        position: Some(page.clone()),
        error: None,
        is_last: false,
    });
    h.session.handle_event(TraderEvent::Position {
        position: Some(RawPosition { market: 0, ..page }),
        error: None,
        is_last: true,
    });
    assert_eq!(h.sink.positions().len(), 1);
}

#[test]
fn test_credit_fund_error_is_dropped() {
    let mut h = connected();
    h.session.handle_event(TraderEvent::CreditFund {
        fund: Default::default(),
        error: Some(ApiError::new(11_000_001, "not a margin account")),
    });
    assert!(h.sink.accounts().is_empty());
    assert!(h.sink.errors().is_empty());
}

#[test]
fn test_option_contracts_are_published_and_stored() {
    let mut h = connected();
    h.session.handle_event(TraderEvent::OptionInfo {
        info: Some(RawOptionInfo {
            ticker: "10004567".to_string(),
            security_id_source: 2,
            symbol: "50ETF CALL MAR 2800".to_string(),
            contract_id: "510050C2403M02800".to_string(),
            underlying_security_id: "510050".to_string(),
            delivery_month: 3,
            call_or_put: 1,
            exercise_price: 2.8,
            last_trade_date: 20240327,
            contract_unit: 10_000,
            qty_unit: 1,
            price_tick: 0.0001,
        }),
        error: None,
        is_last: true,
    });

    let contracts = h.sink.contracts();
    assert_eq!(contracts.len(), 1);
    assert!(contracts[0].is_option());
    assert!(h.sink.logged("option contract information loaded"));
}

#[test]
fn test_disconnect_schedules_reconnect_unconditionally() {
    let mut h = connected();
    let delay = h
        .session
        .handle_event(TraderEvent::Disconnected { reason: 1 });
    assert_eq!(delay, Some(DELAY));
    assert_eq!(h.session.state(), TdState::Disconnected);

    h.session.reconnect();
    assert_eq!(h.session.state(), TdState::Initialized);
    assert_eq!(h.session.reconnect_count(), 1);
}

#[test]
fn test_no_reconnect_after_close() {
    let mut h = connected();
    h.session.close();
    assert_eq!(count(&h.venue, VenueCall::TraderLogout), 1);
    assert_eq!(
        h.session
            .handle_event(TraderEvent::Disconnected { reason: 1 }),
        None
    );
}
