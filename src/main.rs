//! merchantcache - Cached reads of merchants and merchant menus
//!
//! A command-line front end for the merchant service. Results are printed to
//! stdout as JSON; logs go to stderr.

use clap::Parser;
use futures::future::join_all;
use serde::Serialize;
use tracing::info;

use merchantcache::cli::{Cli, Command, DEFAULT_MENU_LIMIT};
use merchantcache::data::{MerchantMenuData, MerchantService};
use merchantcache::logging;

/// One entry of the `menus` output
#[derive(Serialize)]
struct MenuOutput<'a> {
    merchant_id: &'a str,
    menu: MerchantMenuData,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let command = cli.command()?;
    let service = MerchantService::from_config(cli.service_config());

    match command {
        Command::Merchants(filters) => print_json(&service.get_merchants(&filters).await)?,
        Command::Merchant(id) => print_json(&service.get_merchant_by_id(&id).await)?,
        Command::Count(active) => print_json(&service.get_merchants_count(active).await)?,
        Command::Menu {
            merchant_id,
            page,
            limit,
        } => print_json(&service.get_merchant_menu(&merchant_id, page, limit).await)?,
        Command::Menus(merchant_ids) => {
            let menus = join_all(
                merchant_ids
                    .iter()
                    .map(|id| service.get_merchant_menu(id, 1, DEFAULT_MENU_LIMIT)),
            )
            .await;
            let output: Vec<MenuOutput> = merchant_ids
                .iter()
                .zip(menus)
                .map(|(merchant_id, menu)| MenuOutput { merchant_id, menu })
                .collect();
            print_json(&output)?;
        }
    }

    let stats = service.cache().stats();
    info!(entries = stats.size, keys = ?stats.keys, "Cache state at exit");

    Ok(())
}
