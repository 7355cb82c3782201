use anyhow::Context;
use broker_gateway::wire::RawTickerInfo;
use broker_gateway::{GatewayContext, PaperVenue, XtpGateway};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use trading::{ContractStore, Gateway};
use trading_core::args::GatewayArgs;
use trading_core::stores::{JsonContractStore, MemoryConfigStore, StaticContractStore};
use trading_core::{EventBus, GatewaySettings};

const PAPER_CASH: f64 = 1_000_000.0;

/// Seeds the paper venue with a couple of liquid names.
fn paper_venue() -> PaperVenue {
    let venue = PaperVenue::new(PAPER_CASH);
    for (exchange_id, ticker, name, price) in [
        (1, "600000", "SPDB", 10.52),
        (1, "600519", "KWEICHOW MOUTAI", 1688.0),
        (2, "000001", "PING AN BANK", 11.37),
    ] {
        venue.add_ticker(RawTickerInfo {
            exchange_id,
            ticker: ticker.to_string(),
            ticker_name: name.to_string(),
            ticker_type: 0,
            price_tick: 0.01,
            buy_qty_unit: 100,
        });
        venue.set_last_price(exchange_id, ticker, price);
    }
    venue
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = GatewayArgs::parse_args(std::env::args().collect());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.get_log_level()))
        .init();

    info!("Starting Broker Gateway...");
    let settings = GatewaySettings::load(args.get_config_path().as_deref())
        .context("failed to load gateway settings")?;
    let subscriptions = args
        .get_subscriptions()
        .context("invalid --subscribe list")?;

    let contract_store: Arc<dyn ContractStore> = match args.get_contracts_path() {
        Some(path) => {
            info!("reading contracts from {}", path.display());
            Arc::new(JsonContractStore::new(path))
        }
        None => Arc::new(StaticContractStore::new(Vec::new())),
    };
    let bus = EventBus::new();
    let mut events = bus.subscribe();
    let context = GatewayContext::new(
        Arc::new(bus),
        Arc::new(MemoryConfigStore::from_settings(&settings)),
        contract_store,
    );

    let venue = paper_venue();
    let gateway = XtpGateway::new(
        settings,
        context,
        Box::new(venue.quote_api()),
        Box::new(venue.trader_api()),
    );

    gateway.connect().await.context("failed to connect")?;
    if args.subscribe_all() {
        gateway.subscribe_all().await?;
    }
    for key in subscriptions {
        gateway.subscribe(key).await?;
    }

    let mut quotes = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            _ = quotes.tick() => {
                venue.publish_quotes();
            }
            event = events.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(skipped)) => warn!("event printer lagged, {skipped} events skipped"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    gateway.close().await?;
    Ok(())
}
