//! `cryoner`: drive the storefront from the command line.
//!
//! ```text
//! cryoner catalog
//! cryoner cart add starter-kit -q 2
//! cryoner checkout --handle alice --method sol
//! cryoner pay --confirm
//! ```
//!
//! State persists in the configured storage directory between runs. Logs go
//! to stderr; notices and results go to stdout.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::sync::broadcast;

use cryoner::cart::AddOutcome;
use cryoner::checkout::{CheckoutForm, PaymentMethod};
use cryoner::config::load_or_default;
use cryoner::lifecycle::signals::shutdown_on_ctrl_c;
use cryoner::notifications::{Notice, NoticeLevel};
use cryoner::observability::init_logging;
use cryoner::payments::{PaymentEntry, PaymentStatus};
use cryoner::pricing::{PriceQuote, PriceSource, StaticPrices, TickerClient};
use cryoner::{Shutdown, Storefront};

#[derive(Parser)]
#[command(name = "cryoner")]
#[command(about = "Storefront cart, checkout and crypto payment sessions", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use a fixed SOL/USD price instead of the live ticker.
    #[arg(long)]
    sol_price: Option<Decimal>,

    /// Extra fixed prices for offline use, e.g. `BTCUSDT=60000`.
    #[arg(long = "price", value_parser = parse_symbol_price, requires = "sol_price")]
    prices: Vec<(String, Decimal)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List products
    Catalog,
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Show the SOL/USD quote
    Price {
        /// Keep refreshing until interrupted
        #[arg(long)]
        follow: bool,
    },
    /// Validate the cart and contact details and save the order
    Checkout {
        #[arg(long)]
        handle: String,
        #[arg(long)]
        email: Option<String>,
        /// sol, btc, eth or usdt_trc20
        #[arg(long)]
        method: Option<PaymentMethod>,
    },
    /// Open a payment session for the saved order
    Pay {
        /// Report the transfer as sent right away
        #[arg(long)]
        confirm: bool,
    },
    /// Discard the saved order
    Restart,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show items and total
    Show,
    /// Add a catalog product
    Add {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove an item
    Remove { id: String },
    /// Set an item's quantity (values below 1 become 1)
    Qty {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

fn parse_symbol_price(raw: &str) -> Result<(String, Decimal), String> {
    let (symbol, price) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got '{}'", raw))?;
    let price = price
        .parse::<Decimal>()
        .map_err(|e| format!("invalid price '{}': {}", price, e))?;
    Ok((symbol.trim().to_ascii_uppercase(), price))
}

#[tokio::main]
async fn main() -> ExitCode {
    match try_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn try_main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("warning: logging not initialised: {}", e);
    }

    let store = Storefront::open(config)?;
    let printer = tokio::spawn(print_notices(store.notifier().subscribe()));

    let result = match cli.sol_price {
        Some(usd) => {
            let prices = StaticPrices::new().with(&store.config().pricing.sol_symbol, usd);
            for (symbol, price) in &cli.prices {
                prices.set(symbol, *price);
            }
            run(cli.command, store, prices).await
        }
        None => {
            let prices = TickerClient::new(&store.config().pricing)?;
            run(cli.command, store, prices).await
        }
    };

    // Every notifier handle is gone once `run` returns.
    let _ = printer.await;
    result
}

async fn run<S>(command: Command, store: Storefront, prices: S) -> Result<(), Box<dyn Error>>
where
    S: PriceSource + Clone + 'static,
{
    match command {
        Command::Catalog => {
            for product in store.catalog().products() {
                println!(
                    "{:<20} {:<32} {:>18}  {:<10} {}",
                    product.id,
                    product.title,
                    product.price.to_string(),
                    product.category.as_deref().unwrap_or("-"),
                    product.tag.as_deref().unwrap_or("")
                );
            }
        }

        Command::Cart { action } => {
            let mut cart = store.cart();
            match action.unwrap_or(CartAction::Show) {
                CartAction::Show => {}
                CartAction::Add { id, quantity } => {
                    let product = store
                        .catalog()
                        .find(&id)
                        .ok_or_else(|| format!("unknown product '{}'", id))?;
                    if cart.add_item(product, quantity) == AddOutcome::Added {
                        println!("Added {} x{}", product.title, quantity.max(1));
                    }
                }
                CartAction::Remove { id } => {
                    cart.remove_item(&id);
                }
                CartAction::Qty { id, quantity } => {
                    if !cart.set_quantity(&id, quantity) {
                        return Err(format!("'{}' is not in the cart", id).into());
                    }
                }
                CartAction::Clear => cart.clear(),
            }

            let quote = if cart.has_sol_items() {
                sol_quote(&store, prices).await
            } else {
                None
            };
            let sol_usd = quote.as_ref().map(|q| q.usd);

            for item in cart.items() {
                let line = item
                    .line_usd(sol_usd)
                    .map(|usd| format!("${}", usd.round_dp(2)))
                    .unwrap_or_else(|_| "-".to_string());
                println!(
                    "{:<20} {:<32} {:>4} x {:>18} = {}",
                    item.id,
                    item.title,
                    item.quantity,
                    item.price.to_string(),
                    line
                );
            }
            if cart.is_empty() {
                println!("Your cart is empty.");
            } else {
                match cart.try_total_usd(quote.as_deref()) {
                    Ok(total) => println!("Total: ${}", total.round_dp(2)),
                    Err(e) => println!("Total: unavailable ({})", e),
                }
            }
        }

        Command::Price { follow } => {
            let feed = store.price_feed(prices);
            if !follow {
                if let Some(quote) = feed.refresh().await.ok().or_else(|| feed.current()) {
                    print_quote(&quote);
                }
                return Ok(());
            }

            let shutdown = Shutdown::new();
            tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));
            let handle = feed.handle();
            let task = tokio::spawn(feed.run(shutdown.subscribe()));

            let mut cancel = shutdown.subscribe();
            let mut poll = tokio::time::interval(Duration::from_secs(1));
            let mut shown: Option<Arc<PriceQuote>> = None;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = poll.tick() => {
                        let latest = handle.current();
                        let changed = match (&latest, &shown) {
                            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
                            (Some(_), None) => true,
                            _ => false,
                        };
                        if changed {
                            if let Some(quote) = &latest {
                                print_quote(quote);
                            }
                            shown = latest;
                        }
                    }
                }
            }
            task.await?;
        }

        Command::Checkout {
            handle,
            email,
            method,
        } => {
            let cart = store.cart();
            let checkout = store.checkout();

            let mut form = CheckoutForm::new();
            form.set_handle(&handle, checkout.rules().handle_sigil);
            if let Some(email) = &email {
                form.set_email(email);
            }
            if let Some(method) = method {
                form.select_method(method);
            }

            let quote = if cart.has_sol_items() {
                sol_quote(&store, prices).await
            } else {
                None
            };

            let (order, next) = checkout.proceed(&form, &cart, quote.as_deref()).await?;
            println!("Order {} saved", order.id);
            println!("  Items:   {}", order.summary());
            println!("  Total:   ${}", order.total_usd.round_dp(2));
            println!("  Pay with {}", order.payment_method);
            println!("Next: `cryoner pay` ({})", next);
        }

        Command::Pay { confirm } => {
            let step = store.payment_step(prices);
            let (order, session) = match step.open().await {
                PaymentEntry::Redirect(route) => {
                    println!("No pending order; run `cryoner checkout` first ({}).", route);
                    return Ok(());
                }
                PaymentEntry::Ready { order, session } => (order, session),
            };

            let method = session.method();
            println!("Order {}: {}", order.id, order.summary());
            println!("  Total: ${}", order.total_usd.round_dp(2));
            match session.details() {
                Some(details) => {
                    println!("  Send:  {} {}", details.amount, method.ticker());
                    println!("  To:    {}", details.address);
                    println!(
                        "  Only send {} on the {} network.",
                        method.ticker(),
                        method.network()
                    );
                }
                None => {
                    println!("Payment amount unavailable. Run `cryoner restart` and check out again.");
                    return Ok(());
                }
            }

            let shutdown = Shutdown::new();
            tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));
            let (driver, control) = step.drive(session, shutdown.subscribe());
            if confirm {
                control.confirm();
            } else {
                println!("Waiting for payment; press Ctrl-C to leave.");
            }

            let mut cart = store.cart();
            let watch_session = async {
                let mut updates = control.subscribe();
                let mut last = updates.borrow().status();
                while updates.changed().await.is_ok() {
                    let session = updates.borrow_and_update().clone();
                    if session.status() != last {
                        println!("Status: {} ({} left)", session.status(), session.remaining_display());
                        last = session.status();
                    } else if session.remaining_secs() % 60 == 0 {
                        println!("{} left", session.remaining_display());
                    }
                    if session.status().can_restart() {
                        control.leave();
                        break;
                    }
                }
            };

            let (outcome, ()) = tokio::join!(driver.run(&mut cart), watch_session);
            match (outcome.status, outcome.route) {
                (PaymentStatus::Confirmed, _) => println!("Payment confirmed. Thank you!"),
                (PaymentStatus::Expired, _) => {
                    println!("Session expired. Run `cryoner restart` to start over.")
                }
                (status, route) => println!(
                    "Left payment session while {}{}",
                    status,
                    route.map(|r| format!(", next: {}", r)).unwrap_or_default()
                ),
            }
        }

        Command::Restart => {
            store.orders().discard()?;
            println!("Pending order discarded.");
        }
    }

    Ok(())
}

/// One refresh; falls back per the feed's rules.
async fn sol_quote<S: PriceSource>(store: &Storefront, prices: S) -> Option<Arc<PriceQuote>> {
    let feed = store.price_feed(prices);
    let _ = feed.refresh().await;
    feed.current()
}

fn print_quote(quote: &PriceQuote) {
    let source = if quote.is_live() { "live" } else { "fallback" };
    println!("{} = ${} ({})", quote.symbol, quote.usd, source);
}

async fn print_notices(mut rx: broadcast::Receiver<Notice>) {
    loop {
        match rx.recv().await {
            Ok(notice) => {
                let level = match notice.level {
                    NoticeLevel::Info => "info",
                    NoticeLevel::Warning => "warning",
                    NoticeLevel::Error => "error",
                };
                println!("[{}] {}: {}", level, notice.title, notice.description);
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
