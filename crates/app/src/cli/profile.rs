use clap::{Args, Subcommand};
use petshop_app::{
    context::AppContext,
    domain::profiles::{
        ProfilesService,
        models::{ProfileUpdate, UserProfile},
    },
};

use crate::cli::describe;

#[derive(Debug, Args)]
pub(crate) struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProfileSubcommand {
    /// Show your profile
    Show,

    /// Create or replace your profile
    Save {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

pub(crate) async fn run(command: ProfileCommand, app: &AppContext) -> Result<(), String> {
    let profile = match command.command {
        ProfileSubcommand::Show => app
            .profiles
            .get_profile()
            .await
            .map_err(|error| describe(&error))?,
        ProfileSubcommand::Save {
            name,
            email,
            phone,
            address,
        } => Some(
            app.profiles
                .save_profile(ProfileUpdate {
                    display_name: name,
                    email,
                    phone,
                    address,
                })
                .await
                .map_err(|error| describe(&error))?,
        ),
    };

    match profile {
        Some(profile) => print_profile(&profile),
        None => println!("no profile saved"),
    }

    Ok(())
}

pub(crate) fn print_profile(profile: &UserProfile) {
    println!("id: {}", profile.id);
    println!("name: {}", profile.display_name);
    println!("email: {}", profile.email);
    println!("phone: {}", profile.phone.as_deref().unwrap_or("-"));
    println!("address: {}", profile.address.as_deref().unwrap_or("-"));
    println!("role: {}", profile.role.as_str());
}
