use clap::{Args, Subcommand};
use petshop::pricing::format_amount;
use petshop_app::{
    context::AppContext,
    domain::orders::{
        OrdersService,
        models::{Order, OrderId},
    },
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Your orders, newest first
    List,

    /// Show one of your orders
    Show { order: String },
}

pub(crate) async fn run(command: OrdersCommand, app: &AppContext) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::List => {
            let orders = app
                .orders
                .list_orders()
                .await
                .map_err(|error| describe(&error))?;

            if orders.is_empty() {
                println!("no orders yet");
            }

            for order in &orders {
                print_summary(order);
            }
        }
        OrdersSubcommand::Show { order } => {
            let order = app
                .orders
                .get_order(&OrderId::new(order))
                .await
                .map_err(|error| describe(&error))?;

            println!("order_id: {}", order.order_id);
            println!("item: {} ({})", order.item.name, order.item_id);
            println!("quantity: {}", order.quantity);
            println!("total: {}", format_amount(order.total_price));
            println!("payment: {}", order.payment_method.as_str());
            println!("status: {}", order.status);
            println!("created_at: {}", order.created_at);
        }
    }

    Ok(())
}

pub(crate) fn print_summary(order: &Order) {
    println!(
        "{}\t{}\tx{}\t{}\t{}",
        order.order_id,
        order.item.name,
        order.quantity,
        format_amount(order.total_price),
        order.status
    );
}
