use clap::{Args, Subcommand};
use petshop::pricing::format_amount;
use petshop_app::{
    context::AppContext,
    domain::catalog::{
        CatalogService,
        models::{CatalogItem, ItemId},
    },
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List items by name
    List {
        /// Only items in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show one item
    Show { item: String },

    /// Items with the most units sold
    BestSellers {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Items priced within a range, inclusive
    PriceRange {
        #[arg(long)]
        min: u64,

        #[arg(long)]
        max: u64,
    },
}

pub(crate) async fn run(command: CatalogCommand, app: &AppContext) -> Result<(), String> {
    let items = match command.command {
        CatalogSubcommand::List { category } => app.catalog.list_items(category).await,
        CatalogSubcommand::Show { item } => {
            let item = app
                .catalog
                .get_item(&ItemId::new(item))
                .await
                .map_err(|error| describe(&error))?;

            print_details(&item);

            return Ok(());
        }
        CatalogSubcommand::BestSellers { limit } => app.catalog.best_sellers(limit).await,
        CatalogSubcommand::PriceRange { min, max } => app.catalog.in_price_range(min, max).await,
    }
    .map_err(|error| describe(&error))?;

    if items.is_empty() {
        println!("no items found");
    }

    for item in &items {
        print_summary(item);
    }

    Ok(())
}

pub(crate) fn print_summary(item: &CatalogItem) {
    println!(
        "{}\t{}\t{}\tstock {}\tsold {}",
        item.id,
        item.name,
        format_amount(item.price),
        item.stock_count,
        item.sold_count
    );
}

pub(crate) fn print_details(item: &CatalogItem) {
    println!("id: {}", item.id);
    println!("name: {}", item.name);
    println!("category: {}", item.category);
    println!("price: {}", format_amount(item.price));
    println!("discount: {}", item.discount_percent);
    println!("stock: {}", item.stock_count);
    println!("sold: {}", item.sold_count);
    println!("rating: {}", item.rating);
    println!("image: {}", item.image_ref.as_deref().unwrap_or("none"));

    if !item.description.is_empty() {
        println!("description: {}", item.description);
    }
}
