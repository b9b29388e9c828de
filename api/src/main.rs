use std::sync::Arc;
use std::time::Duration;

use iotmarket_api::app_state::AppState;
use iotmarket_api::config::load_config;
use iotmarket_api::http;
use iotmarket_api::purchase::spawn_dialog_sweeper;
use iotmarket_api::infra::postgres;
use iotmarket_api::session::{spawn_session_audit, AuthService, GoTrueClient};
use iotmarket_api::telemetry::init_telemetry;
use iotmarket_api::wallet::{JsonRpcWallet, Wallet};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if exists
    let _ = dotenvy::dotenv();

    let config = load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    init_telemetry(&config.telemetry);

    tracing::info!("Initializing integrations...");

    let pg_pool = postgres::init_postgres(&config.integrations, &config.db).await;

    if config.backend.anon_key.is_empty() {
        tracing::warn!(url = %config.backend.url, "Auth service anon key is empty");
    }
    let auth: Arc<dyn AuthService> = match GoTrueClient::new(&config.backend) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build auth client");
            std::process::exit(1);
        }
    };

    let wallet: Option<Arc<dyn Wallet>> = if config.wallet.enabled {
        match JsonRpcWallet::new(&config.wallet) {
            Ok(wallet) => {
                tracing::info!(rpc_url = %config.wallet.rpc_url, "Wallet RPC enabled");
                Some(Arc::new(wallet))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build wallet client, payments disabled");
                None
            }
        }
    } else {
        tracing::info!("Wallet disabled");
        None
    };

    if wallet.is_some() && !iotmarket_eth::is_address(&config.wallet.merchant_address) {
        tracing::warn!(
            merchant_address = %config.wallet.merchant_address,
            "Merchant address is not a valid account address"
        );
    }

    let app_state = AppState::new(&config, pg_pool.clone(), auth, wallet);

    // One subscription for the lifetime of the process
    let audit = spawn_session_audit(&app_state.sessions);
    let sweeper = spawn_dialog_sweeper(
        app_state.purchases.clone(),
        Duration::from_secs(config.purchase.sweep_interval_secs),
    );

    let server = http::start_server(config, app_state);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
                audit.abort();
                sweeper.abort();
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, shutting down gracefully");
        }
    }

    audit.abort();
    sweeper.abort();

    if let Some(pool) = pg_pool {
        tracing::info!("Closing PostgreSQL connection pool");
        pool.close().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
