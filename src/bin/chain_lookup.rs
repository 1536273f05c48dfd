/// Look up expiry dates and the strike ladder around a price
///
/// Usage: chain_lookup [NAME] [PRICE]
use std::sync::Arc;

use chrono::Utc;
use kiteless::broker::HttpTransport;
use kiteless::config::load_config;
use kiteless::instruments::DatasetStore;
use kiteless::types::{OptionChainQuery, Session};
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "NIFTY".to_string());
    let price: f64 = match args.next() {
        Some(raw) => raw.parse()?,
        None => 22500.0,
    };

    let config = load_config("config.toml")?;

    // The dump endpoint needs no session; the transport only injects the
    // bearer header once a login has happened.
    let session = Arc::new(RwLock::new(Session::default()));
    let transport = HttpTransport::new(session, config.http_timeout_secs);

    let store = DatasetStore::new(&config.instruments_file);
    store.ensure_fresh(&transport, Utc::now()).await?;

    let catalog = store.load_catalog().await?;
    info!("Catalog loaded with {} rows", catalog.len());

    let expiries = catalog.expiry_dates("NFO", &name, "CE")?;
    info!("{} expiries: {:?}", name, expiries);

    let Some(expiry) = expiries.first() else {
        anyhow::bail!("no expiries found for {name}");
    };

    let query = OptionChainQuery::new(price, name.as_str(), expiry.as_str(), "CE");
    let chain = catalog.option_strikes(&query)?;

    info!("ATM strike: {:?}", chain.atm_strike);
    info!("Up strikes: {:?}", chain.up_strikes);
    info!("Down strikes: {:?}", chain.down_strikes);

    Ok(())
}
