//! Lists every account on the exchange with its uuid and available
//! balance, to find the stablecoin account reference for `.env`.

use anyhow::Result;

use surge::config::AppConfig;
use surge::exchange::coinbase::CoinbaseClient;
use surge::exchange::Exchange;
use surge::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let cfg = AppConfig::load_or_default("config.toml")?;
    init_logging(&cfg.logging);
    let client = CoinbaseClient::new(cfg.credentials()?, &cfg.exchange)?;

    let accounts = client.list_accounts().await?;

    println!("currency | uuid | available");
    for account in &accounts {
        println!("{account}");
    }
    println!("\n{} accounts", accounts.len());

    Ok(())
}
