use axum_takeout_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    migration::Migrator,
};
use sea_orm_migration::MigratorTrait;

/// `migrate [up|down|fresh|status]`, `up` when no argument is given.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => {
            run_migrations(&orm).await?;
            println!("Migrations applied");
        }
        "down" => {
            Migrator::down(&orm, Some(1)).await?;
            println!("Last migration rolled back");
        }
        "fresh" => {
            Migrator::fresh(&orm).await?;
            println!("Schema dropped and recreated");
        }
        "status" => Migrator::status(&orm).await?,
        other => anyhow::bail!("unknown command `{other}`, expected up, down, fresh or status"),
    }
    Ok(())
}
