use clap::{Args, Subcommand};
use petshop_app::{
    context::AppContext,
    domain::notifications::{NotificationsService, models::NotificationId},
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Debug, Subcommand)]
enum NotificationsSubcommand {
    /// Recent notifications, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Mark a notification as read
    Read { notification: String },

    /// Number of unread notifications
    Unread,
}

pub(crate) async fn run(command: NotificationsCommand, app: &AppContext) -> Result<(), String> {
    match command.command {
        NotificationsSubcommand::List { limit } => {
            let notifications = app
                .notifications
                .list(limit)
                .await
                .map_err(|error| describe(&error))?;

            for notification in notifications {
                println!(
                    "{}\t{}\t{}\t{}",
                    notification.id,
                    if notification.read { "read" } else { "new" },
                    notification.title,
                    notification.body
                );
            }
        }
        NotificationsSubcommand::Read { notification } => {
            app.notifications
                .mark_read(&NotificationId::new(notification))
                .await
                .map_err(|error| describe(&error))?;
        }
        NotificationsSubcommand::Unread => {
            let unread = app
                .notifications
                .unread_count()
                .await
                .map_err(|error| describe(&error))?;

            println!("{unread}");
        }
    }

    Ok(())
}
