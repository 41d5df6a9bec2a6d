use anyhow::Context;
use storefront_api::db::connect_and_migrate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    connect_and_migrate(&database_url).await?;
    println!("Migrations applied");
    Ok(())
}
