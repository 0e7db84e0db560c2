use clap::{Args, Subcommand};
use petshop::pricing::format_amount;
use petshop_app::{
    context::AppContext,
    domain::{carts::models::CartLine, catalog::models::ItemId},
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart and its subtotal
    List,

    /// Add one unit of an item
    Add { item: String },

    /// Set the quantity of an item already in the cart; zero or less removes it
    Set {
        item: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove an item from the cart
    Remove { item: String },
}

pub(crate) async fn run(command: CartCommand, app: &AppContext) -> Result<(), String> {
    let cart = app.cart_store();

    let succeeded = match command.command {
        CartSubcommand::List => {
            cart.fetch_all().await;
            cart.last_error().is_none()
        }
        CartSubcommand::Add { item } => cart.add_item(&ItemId::new(item)).await,
        CartSubcommand::Set { item, quantity } => {
            cart.fetch_all().await;

            let line = find_line(&cart.lines(), &item)?;

            cart.set_quantity(&line, quantity).await
        }
        CartSubcommand::Remove { item } => {
            cart.fetch_all().await;

            let line = find_line(&cart.lines(), &item)?;

            cart.remove_item(&line).await
        }
    };

    if !succeeded {
        return Err(cart.last_error().unwrap_or_else(|| "cart update failed".to_string()));
    }

    let lines = cart.lines();

    if lines.is_empty() {
        println!("cart is empty");
        return Ok(());
    }

    for line in &lines {
        let total = line.line_total().map_err(|error| describe(&error))?;

        println!(
            "{}\t{}\tx{}\t{}",
            line.item_id,
            line.item.name,
            line.quantity,
            format_amount(total)
        );
    }

    let subtotal = cart.subtotal().map_err(|error| describe(&error))?;

    println!("subtotal: {}", format_amount(subtotal));

    Ok(())
}

fn find_line(lines: &[CartLine], item: &str) -> Result<CartLine, String> {
    lines
        .iter()
        .find(|line| line.item_id.as_str() == item)
        .cloned()
        .ok_or_else(|| format!("item {item} is not in the cart"))
}
