use std::sync::Arc;

use clap::{Args, Subcommand};
use petshop::{payment::PaymentMethod, pricing::format_amount};
use petshop_app::{
    context::AppContext,
    domain::{
        catalog::{CatalogService, models::ItemId},
        orders::CheckoutStore,
    },
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct CheckoutCommand {
    /// Payment method, e.g. COD or VNPay
    #[arg(long, default_value = PaymentMethod::COD, global = true)]
    payment: String,

    #[command(subcommand)]
    command: CheckoutSubcommand,
}

#[derive(Debug, Subcommand)]
enum CheckoutSubcommand {
    /// Buy one item directly
    Item {
        item: String,

        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Turn every cart line into an order
    Cart,
}

pub(crate) async fn run(command: CheckoutCommand, app: &AppContext) -> Result<(), String> {
    let cart = app.cart_store();
    let checkout = app.checkout_store().with_cart(Arc::clone(&cart));

    let placed = match command.command {
        CheckoutSubcommand::Item { item, quantity } => {
            let item = app
                .catalog
                .get_item(&ItemId::new(item))
                .await
                .map_err(|error| describe(&error))?;

            if checkout.stage_direct(&item, quantity) {
                print_pending(&checkout)?;

                checkout
                    .confirm_direct(&item, quantity, &command.payment)
                    .await
            } else {
                false
            }
        }
        CheckoutSubcommand::Cart => {
            cart.fetch_all().await;

            if let Some(error) = cart.last_error() {
                return Err(error);
            }

            let lines = cart.lines();

            if checkout.stage_cart(&lines) {
                print_pending(&checkout)?;

                checkout.confirm_from_cart(&lines, &command.payment).await
            } else {
                false
            }
        }
    };

    if !placed {
        return Err(checkout
            .last_error()
            .unwrap_or_else(|| "checkout failed".to_string()));
    }

    if let Some(message) = checkout.last_message() {
        println!("{message}");
    }

    Ok(())
}

fn print_pending(checkout: &CheckoutStore) -> Result<(), String> {
    let total = checkout.pending_total().map_err(|error| describe(&error))?;

    for order in checkout.pending() {
        println!(
            "{}\tx{}\t{}\t{}",
            order.item.name,
            order.quantity,
            format_amount(order.total_price),
            order.status()
        );
    }

    println!("total: {}", format_amount(total));

    Ok(())
}
