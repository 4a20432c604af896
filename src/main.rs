mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env may carry RUST_LOG as well as MEZWED_* overrides
    dotenvy::dotenv().ok();
    env_logger::init();

    cli::run().await?;

    Ok(())
}
