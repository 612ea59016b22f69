use feeder::db;
use feeder::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            Migrator::up(&db, None).await?;
            println!("Bookkeeping schema is up to date.");
        }
        MigrateAction::Down => {
            Migrator::down(&db, Some(1)).await?;
            println!("Rolled back the last migration.");
        }
        MigrateAction::Status => {
            println!("Migration status:");
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            println!("Dropping recorded outcomes and organizations...");
            Migrator::fresh(&db).await?;
            println!("Bookkeeping schema recreated.");
        }
    }

    Ok(())
}
