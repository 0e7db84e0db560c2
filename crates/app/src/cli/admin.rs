use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use petshop::{pricing::DiscountPercent, status::OrderStatus};
use petshop_app::{
    context::AppContext,
    domain::{
        admin::AdminService,
        catalog::models::{CatalogItemUpdate, ItemId, NewCatalogItem},
        orders::models::OrderId,
        profiles::models::Role,
    },
    identity::OwnerId,
};

use crate::cli::{catalog, describe, orders, profile};

#[derive(Debug, Args)]
pub(crate) struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Customer,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Customer => Self::Customer,
            RoleArg::Admin => Self::Admin,
        }
    }
}

#[derive(Debug, Subcommand)]
enum AdminSubcommand {
    /// Add a catalog item
    CreateItem {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        price: u64,

        #[arg(long, default_value_t = 0)]
        stock: u32,

        #[arg(long, default_value_t = 0)]
        discount: u8,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Edit a catalog item
    UpdateItem {
        item: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        price: Option<u64>,

        #[arg(long)]
        discount: Option<u8>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a catalog item
    DeleteItem { item: String },

    /// Add delivered units
    Restock { item: String, quantity: u32 },

    /// Upload a product image
    UploadImage {
        item: String,
        file: PathBuf,

        #[arg(long, default_value = "image/jpeg")]
        content_type: String,
    },

    /// Every user profile
    Users,

    /// Grant or revoke the admin role
    SetRole {
        user: String,

        #[arg(value_enum)]
        role: RoleArg,
    },

    /// Remove a user profile
    DeleteUser { user: String },

    /// Every order, optionally with one status
    Orders {
        #[arg(long)]
        status: Option<OrderStatus>,
    },

    /// Move an order along its lifecycle
    OrderStatus { order: String, status: OrderStatus },
}

impl AdminCommand {
    pub(crate) fn needs_object_store(&self) -> bool {
        matches!(self.command, AdminSubcommand::UploadImage { .. })
    }
}

fn discount(value: u8) -> Result<DiscountPercent, String> {
    DiscountPercent::new(value).map_err(|error| describe(&error))
}

pub(crate) async fn run(command: AdminCommand, app: &AppContext) -> Result<(), String> {
    let admin = &app.admin;

    match command.command {
        AdminSubcommand::CreateItem {
            id,
            name,
            category,
            price,
            stock,
            discount: percent,
            description,
        } => {
            let item = admin
                .create_item(NewCatalogItem {
                    id: ItemId::new(id),
                    name,
                    category,
                    price,
                    stock_count: stock,
                    discount_percent: discount(percent)?,
                    description,
                })
                .await
                .map_err(|error| describe(&error))?;

            catalog::print_details(&item);
        }
        AdminSubcommand::UpdateItem {
            item,
            name,
            category,
            price,
            discount: percent,
            description,
        } => {
            let update = CatalogItemUpdate {
                name,
                category,
                price,
                discount_percent: percent.map(discount).transpose()?,
                description,
            };

            let item = admin
                .update_item(&ItemId::new(item), update)
                .await
                .map_err(|error| describe(&error))?;

            catalog::print_details(&item);
        }
        AdminSubcommand::DeleteItem { item } => {
            admin
                .delete_item(&ItemId::new(item))
                .await
                .map_err(|error| describe(&error))?;

            println!("item deleted");
        }
        AdminSubcommand::Restock { item, quantity } => {
            let stock = admin
                .restock(&ItemId::new(item), quantity)
                .await
                .map_err(|error| describe(&error))?;

            println!("stock: {stock}");
        }
        AdminSubcommand::UploadImage {
            item,
            file,
            content_type,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|error| format!("failed to read {}: {error}", file.display()))?;

            let item = admin
                .upload_image(&ItemId::new(item), bytes, &content_type)
                .await
                .map_err(|error| describe(&error))?;

            println!("image: {}", item.image_ref.as_deref().unwrap_or("none"));
        }
        AdminSubcommand::Users => {
            for user in admin.list_users().await.map_err(|error| describe(&error))? {
                profile::print_profile(&user);
                println!();
            }
        }
        AdminSubcommand::SetRole { user, role } => {
            let user = admin
                .set_role(&OwnerId::new(user), role.into())
                .await
                .map_err(|error| describe(&error))?;

            profile::print_profile(&user);
        }
        AdminSubcommand::DeleteUser { user } => {
            admin
                .delete_user(&OwnerId::new(user))
                .await
                .map_err(|error| describe(&error))?;

            println!("user deleted");
        }
        AdminSubcommand::Orders { status } => {
            for order in admin
                .list_all_orders(status)
                .await
                .map_err(|error| describe(&error))?
            {
                orders::print_summary(&order);
            }
        }
        AdminSubcommand::OrderStatus { order, status } => {
            let order = admin
                .update_order_status(&OrderId::new(order), status)
                .await
                .map_err(|error| describe(&error))?;

            orders::print_summary(&order);
        }
    }

    Ok(())
}
