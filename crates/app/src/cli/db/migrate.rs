use petshop_app::database;

use crate::cli::describe;

pub(crate) async fn run(database_url: &str) -> Result<(), String> {
    let pool = database::connect(database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {}", describe(&error)))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to apply migrations: {}", describe(&error)))?;

    println!("migrations applied");

    Ok(())
}
