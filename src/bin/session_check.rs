/// Smoke check: establish a session and print account margins
use kiteless::broker::KiteClient;
use kiteless::config::load_config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();

    let config = load_config("config.toml")?;
    let client = KiteClient::from_config(&config);

    info!("Establishing session for {}", config.user_id);
    client.session().ensure_session().await?;

    let margins = client.margins().await?;
    println!("{}", serde_json::to_string_pretty(&margins)?);

    Ok(())
}
