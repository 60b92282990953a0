//! The rebalance workflow: gather exchange state, derive the hedge figures,
//! and optionally submit the rebalancing market order.
//!
//! The chain is strictly linear. Each stage either proceeds or prints a
//! diagnostic and ends the run; an application-level refusal at any stage is
//! terminal, and there is no rollback (a leverage reset that succeeded stays
//! in place even if a later stage fails). Transport failures propagate as
//! errors.

use anyhow::Result;
use clap::Args;
use hedge_trade_bitmex::{
    ApiResponse, BitmexAuthConfig, BitmexClient, BitmexClientConfig, BitmexCredentials,
    OrderRequest, Position, BITMEX_TESTNET_URL,
};
use hedge_trade_core::{AppConfig, ConfigLoader, HedgeFormatter, HedgeSnapshot};

/// Orders above this size need `--force`.
const MAX_UNFORCED_QUANTITY: u64 = 1000;

/// Arguments for the rebalance command.
#[derive(Args, Debug)]
pub struct RebalanceArgs {
    /// Off-exchange XBT to treat as part of the margin balance.
    #[arg(long, default_value_t = 0.0)]
    pub cold_wallet: f64,

    /// Reset leverage to 1x instead of reading the current position.
    #[arg(long)]
    pub reset_leverage: bool,

    /// Submit the recommended market order.
    #[arg(long)]
    pub hedge: bool,

    /// Allow orders larger than 1000 contracts.
    #[arg(long)]
    pub force: bool,

    /// Use the BitMEX testnet (reads testnet credentials).
    #[arg(long)]
    pub testnet: bool,

    /// Config file path.
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Loads configuration and credentials, then runs the workflow.
pub async fn run(args: RebalanceArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };

    let auth_config = if args.testnet {
        config.bitmex.base_url = BITMEX_TESTNET_URL.to_string();
        BitmexAuthConfig::testnet()
    } else {
        BitmexAuthConfig::default()
    };

    tracing::debug!(
        "rebalancing {} against {}",
        config.bitmex.symbol,
        config.bitmex.base_url
    );

    let credentials = BitmexCredentials::from_env(auth_config)?;
    let client = BitmexClient::new(
        BitmexClientConfig::default().with_base_url(config.bitmex.base_url.clone()),
        credentials,
    )?;

    execute(&client, &config, &args).await
}

/// Runs the rebalance chain against an already-built client.
pub async fn execute(client: &BitmexClient, config: &AppConfig, args: &RebalanceArgs) -> Result<()> {
    let symbol = config.bitmex.symbol.as_str();

    // 1. Instrument, for the mark price everything else is valued against.
    let instrument = match client.instruments(symbol).await? {
        ApiResponse::Ok(list) => match list.into_iter().next() {
            Some(instrument) => instrument,
            None => {
                println!("error getting instrument: no instrument named {symbol}");
                return Ok(());
            }
        },
        ApiResponse::ApiErr(err) => {
            println!("error getting instrument: {err}");
            return Ok(());
        }
    };
    let Some(mark_price) = instrument.mark_price else {
        println!("error getting instrument: {symbol} has no mark price");
        return Ok(());
    };

    // 2. Position, either via a 1x leverage reset or a plain read.
    let position = if args.reset_leverage {
        match client.set_leverage(symbol, 1.0).await? {
            ApiResponse::Ok(position) => Some(position),
            ApiResponse::ApiErr(err) => {
                println!("error setting 1x: {err}");
                return Ok(());
            }
        }
    } else {
        match client.positions(symbol).await? {
            ApiResponse::Ok(list) => list.into_iter().next(),
            ApiResponse::ApiErr(err) => {
                println!("error getting position: {err}");
                return Ok(());
            }
        }
    };

    // 3. No open position means a synthetic flat one.
    let position = position.unwrap_or_else(|| Position::flat(symbol, mark_price));

    // 4. Margin balance.
    let margin = match client.margin(&config.bitmex.settlement_currency).await? {
        ApiResponse::Ok(margin) => margin,
        ApiResponse::ApiErr(err) => {
            println!("error getting margin: {err}");
            return Ok(());
        }
    };

    // 5. Derive and report.
    let report = HedgeSnapshot {
        mark_price,
        avg_entry_price: position.avg_entry_price,
        home_notional: position.home_notional,
        foreign_notional: position.foreign_notional,
        realised_pnl: position.realised_pnl,
        rebalanced_pnl: position.rebalanced_pnl,
        commission: position.commission,
        leverage: position.leverage,
        margin_balance: margin.margin_balance,
        available_margin: margin.available_margin,
        cold_wallet: args.cold_wallet,
    }
    .assess();

    print!("{}", HedgeFormatter::format(&report));

    // 6. Decide whether an order goes out.
    if report.quantity == 0 {
        println!("Hedge is balanced, no action needed.");
        return Ok(());
    }

    let plan = report.order_plan();
    if plan.clamped {
        println!(
            "Insufficient available balance: clamping order to {} of {} contracts.",
            plan.quantity, report.quantity
        );
        if !args.reset_leverage {
            println!("Consider --reset-leverage to free margin at 1x.");
        }
        if plan.quantity == 0 {
            return Ok(());
        }
    }

    if !args.hedge {
        println!(
            "Would {} {} contracts; pass --hedge to submit the order.",
            plan.side, plan.quantity
        );
        return Ok(());
    }

    if plan.quantity > MAX_UNFORCED_QUANTITY && !args.force {
        println!(
            "Order of {} contracts exceeds the {} contract safety threshold; pass --force to submit.",
            plan.quantity, MAX_UNFORCED_QUANTITY
        );
        return Ok(());
    }

    // 7. Submit and report the fill.
    let request = OrderRequest::market(symbol, plan.side, plan.quantity);
    match client.submit_order(&request).await? {
        ApiResponse::ApiErr(err) => {
            println!("error placing order: {err}");
        }
        ApiResponse::Ok(order) => match order.avg_px {
            Some(avg_px) => {
                let filled = order.cum_qty.unwrap_or(0);
                let slippage = (avg_px - mark_price) / mark_price * 100.0;
                println!(
                    "Filled {} contracts at {:.2} ({:+.4}% vs mark {:.2}).",
                    filled, avg_px, slippage, mark_price
                );
            }
            None => {
                println!(
                    "Order accepted but reported no fill price (status: {}).",
                    order.ord_status.as_deref().unwrap_or("unknown")
                );
            }
        },
    }

    Ok(())
}
