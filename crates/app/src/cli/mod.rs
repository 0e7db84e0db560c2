use std::{error::Error, sync::Arc};

use clap::{Args, Parser, Subcommand};
use petshop_app::{
    context::AppContext,
    identity::StaticIdentity,
    objects::{HttpObjectStore, HttpObjectStoreConfig, MemoryObjectStore, ObjectStore},
    observability::LoggingConfig,
};

mod admin;
mod cart;
mod catalog;
mod checkout;
mod db;
mod notifications;
mod orders;
mod profile;
mod reviews;

#[derive(Debug, Parser)]
#[command(name = "petshop", about = "Pet store CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Catalog(catalog::CatalogCommand),
    Cart(cart::CartCommand),
    Checkout(checkout::CheckoutCommand),
    Orders(orders::OrdersCommand),
    Review(reviews::ReviewCommand),
    Notifications(notifications::NotificationsCommand),
    Profile(profile::ProfileCommand),
    Admin(admin::AdminCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let connection = self.connection;

        match self.command {
            Commands::Db(command) => db::run(command, &connection).await,
            Commands::Catalog(command) => catalog::run(command, &connection.context().await?).await,
            Commands::Cart(command) => cart::run(command, &connection.context().await?).await,
            Commands::Checkout(command) => {
                checkout::run(command, &connection.context().await?).await
            }
            Commands::Orders(command) => orders::run(command, &connection.context().await?).await,
            Commands::Review(command) => reviews::run(command, &connection.context().await?).await,
            Commands::Notifications(command) => {
                notifications::run(command, &connection.context().await?).await
            }
            Commands::Profile(command) => profile::run(command, &connection.context().await?).await,
            Commands::Admin(command) => {
                if command.needs_object_store() && connection.object_store_url.is_none() {
                    return Err("OBJECT_STORE_URL is required to upload images".to_string());
                }

                admin::run(command, &connection.context().await?).await
            }
        }
    }
}

/// Where documents and objects live, and who is acting.
#[derive(Debug, Args)]
pub(crate) struct ConnectionArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    database_url: Option<String>,

    /// Owner id to act as; anonymous when omitted
    #[arg(long, env = "PETSHOP_OWNER", global = true)]
    owner: Option<String>,

    /// Object storage endpoint for product images
    #[arg(long, env = "OBJECT_STORE_URL", global = true)]
    object_store_url: Option<String>,

    /// Object storage bucket
    #[arg(long, env = "OBJECT_STORE_BUCKET", default_value = "petshop", global = true)]
    object_store_bucket: String,

    /// Object storage bearer token
    #[arg(long, env = "OBJECT_STORE_TOKEN", hide_env_values = true, global = true)]
    object_store_token: Option<String>,
}

impl ConnectionArgs {
    pub(crate) fn database_url(&self) -> Result<&str, String> {
        self.database_url
            .as_deref()
            .ok_or_else(|| "DATABASE_URL is required".to_string())
    }

    fn objects(&self) -> Arc<dyn ObjectStore> {
        match &self.object_store_url {
            Some(base_url) => Arc::new(HttpObjectStore::new(HttpObjectStoreConfig {
                base_url: base_url.clone(),
                bucket: self.object_store_bucket.clone(),
                token: self.object_store_token.clone().unwrap_or_default(),
            })),
            None => Arc::new(MemoryObjectStore::new()),
        }
    }

    async fn context(&self) -> Result<AppContext, String> {
        let identity = match &self.owner {
            Some(owner) => StaticIdentity::signed_in(owner.as_str()),
            None => StaticIdentity::anonymous(),
        };

        AppContext::from_database_url(self.database_url()?, self.objects(), Arc::new(identity))
            .await
            .map_err(|error| describe(&error))
    }
}

/// An error and its sources, outermost first.
pub(crate) fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
