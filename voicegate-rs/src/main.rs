use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voicegate_rs::api::handlers::AppState;
use voicegate_rs::api::ApiServer;
use voicegate_rs::audio::AudioResolver;
use voicegate_rs::config::Config;
use voicegate_rs::quota::QuotaEnforcer;
use voicegate_rs::redemption::RedemptionFlow;
use voicegate_rs::seed;
use voicegate_rs::store::CodeStore;
use voicegate_rs::telephony::{OutboundDialer, TwilioDialer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let mut config = if Path::new("config.toml").exists() {
        Config::from_file("config.toml")?
    } else {
        Config::default()
    };
    config.apply_env_overrides();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }

    info!("Starting voicegate-rs");
    info!("  Listening on: {}", config.server.listen_addr);
    info!("  Database: {}", config.storage.database_url);
    info!("  Seed file: {}", config.storage.seed_path);
    info!("  Audio directory: {}", config.storage.audio_dir);
    if config.telephony.account_sid.is_none() {
        info!("  Telephony credentials not set; dispatch will be refused");
    }

    // Storage + initial data
    let store = CodeStore::connect(&config.storage.database_url).await?;
    seed::seed_if_empty(&store, Path::new(&config.storage.seed_path)).await?;

    // Redemption collaborators
    let enforcer = QuotaEnforcer::new(store.db.clone());
    let dialer: Arc<dyn OutboundDialer> = Arc::new(TwilioDialer::from_config(&config.telephony));
    let resolver = AudioResolver::new(config.server.public_url.clone());
    let flow = RedemptionFlow::new(store.clone(), enforcer, dialer, resolver, &config);

    let addr = config.server.listen_addr.clone();
    let state = Arc::new(AppState {
        store,
        flow,
        config,
    });

    let server = ApiServer::new(state, addr);
    server.run().await?;

    Ok(())
}
