mod command;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};
use storefront_core::{
    config::{self, AppConfig},
    Product, Storefront,
};

use crate::command::{Command, ThemeArg, HELP};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    info!(catalog = %config.catalog_url, data_dir = %config.data_dir.display(), "Starting storefront");

    let mut shop = Storefront::open(&config)?;
    if let Err(err) = shop.refresh_catalog().await {
        error!(%err, "Initial catalog load failed");
        println!("catalog unavailable: {err} (try `refresh`)");
    }
    println!(
        "{} products, {} coins. Type `help` for commands.",
        shop.products().len(),
        shop.balance()
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => run(&mut shop, command).await,
            Err(command::ParseError::Empty) => continue,
            Err(err) => println!("{err}"),
        }
    }

    info!("Storefront closed");
    Ok(())
}

async fn run(shop: &mut Storefront, command: Command) {
    match command {
        Command::List(term) => {
            let products = shop.search(term.as_deref().unwrap_or_default());
            if products.is_empty() {
                println!("no products");
            }
            for product in &products {
                print_row(product, shop.ledger().owns(product.id));
            }
        }
        Command::Show(id) => match shop.product(id).await {
            Ok(product) => print_detail(&product, shop.ledger().owns(id)),
            Err(err) => println!("{err}"),
        },
        Command::Buy(id) => match shop.buy(id).await {
            Ok(receipt) => println!(
                "bought #{} for {} coins, balance {}",
                receipt.product_id, receipt.amount, receipt.balance
            ),
            Err(err) => println!("{err}"),
        },
        Command::Sell(id) => match shop.sell(id) {
            Ok(receipt) => println!(
                "sold #{} for {} coins, balance {}",
                receipt.product_id, receipt.amount, receipt.balance
            ),
            Err(err) => println!("{err}"),
        },
        Command::Owned => {
            if shop.owned().is_empty() {
                println!("you own nothing yet");
            }
            for product in shop.owned() {
                print_row(product, true);
            }
        }
        Command::Balance => println!("{} coins", shop.balance()),
        Command::Draw => match shop.claim_reward() {
            Ok(outcome) => println!(
                "you got a {} coin! {} coins added, balance {}",
                outcome.prize,
                outcome.prize.coins(),
                outcome.balance
            ),
            Err(err) => println!("{err}"),
        },
        Command::Reset => match shop.reset() {
            Ok(()) => println!("purchases cleared, balance {}", shop.balance()),
            Err(err) => println!("{err}"),
        },
        Command::Theme(ThemeArg::Show) => println!("theme: {}", shop.theme()),
        Command::Theme(ThemeArg::Set(mode)) => match shop.set_theme(mode) {
            Ok(()) => println!("theme: {mode}"),
            Err(err) => println!("{err}"),
        },
        Command::Theme(ThemeArg::Toggle) => match shop.toggle_theme() {
            Ok(mode) => println!("theme: {mode}"),
            Err(err) => println!("{err}"),
        },
        Command::Refresh => match shop.refresh_catalog().await {
            Ok(total) => println!("{total} products loaded"),
            Err(err) => println!("{err}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

fn print_row(product: &Product, owned: bool) {
    let marker = if owned { "*" } else { " " };
    println!(
        "{marker} #{:<4} {:>7.2}  {}",
        product.id, product.price, product.title
    );
}

fn print_detail(product: &Product, owned: bool) {
    println!("#{} {}", product.id, product.title);
    println!("  price:    {:.2}", product.price);
    println!("  category: {}", product.category);
    if let Some(rating) = &product.rating {
        println!("  rating:   {:.1} ({} reviews)", rating.rate, rating.count);
    }
    println!("  owned:    {}", if owned { "yes" } else { "no" });
    if !product.description.is_empty() {
        println!("  {}", product.description);
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("storefront.log");

    let env_filter = EnvFilter::from_default_env();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
