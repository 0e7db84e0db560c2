use clap::{Args, Subcommand};
use petshop_app::{
    context::AppContext,
    domain::{catalog::models::ItemId, reviews::ReviewsService},
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct ReviewCommand {
    #[command(subcommand)]
    command: ReviewSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReviewSubcommand {
    /// Review an item with 1 to 5 stars
    Add {
        item: String,

        #[arg(long)]
        rating: u8,

        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Reviews of an item, newest first
    List { item: String },
}

pub(crate) async fn run(command: ReviewCommand, app: &AppContext) -> Result<(), String> {
    match command.command {
        ReviewSubcommand::Add {
            item,
            rating,
            comment,
        } => {
            let review = app
                .reviews
                .submit_review(&ItemId::new(item), rating, &comment)
                .await
                .map_err(|error| describe(&error))?;

            println!("review_id: {}", review.id);
        }
        ReviewSubcommand::List { item } => {
            let reviews = app
                .reviews
                .list_reviews(&ItemId::new(item))
                .await
                .map_err(|error| describe(&error))?;

            if reviews.is_empty() {
                println!("no reviews yet");
            }

            for review in reviews {
                println!(
                    "{}/5\t{}\t{}",
                    review.rating.value(),
                    review.owner_id,
                    review.comment
                );
            }
        }
    }

    Ok(())
}
