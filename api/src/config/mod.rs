/// Configuration module
///
/// Loads configuration from TOML files and environment variables.
/// Priority: ENV > TOML > defaults
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub purchase: PurchaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit_bytes: usize,
    #[serde(default = "default_workers")]
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_cors_allowed_methods")]
    pub cors_allowed_methods: Vec<String>,
    #[serde(default = "default_cors_allowed_headers")]
    pub cors_allowed_headers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntegrationsConfig {
    #[serde(default = "default_true")]
    pub enable_postgres: bool,
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_pg_max_connections")]
    pub pg_max_connections: u32,
    #[serde(default = "default_pg_connect_timeout_ms")]
    pub pg_connect_timeout_ms: u64,
    #[serde(default = "default_pg_idle_timeout_ms")]
    pub pg_idle_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DbConfig {
    #[serde(default)]
    pub run_migrations_on_start: bool,
}

/// Hosted auth service (GoTrue-compatible REST API)
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    /// Where the verification email link should land
    #[serde(default)]
    pub email_redirect_to: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_wallet_rpc_url")]
    pub rpc_url: String,
    /// Account used for payments; first authorized account when unset
    #[serde(default)]
    pub signer_address: Option<String>,
    #[serde(default)]
    pub merchant_address: String,
    #[serde(default = "default_eth_usd_rate")]
    pub eth_usd_rate: f64,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_protect_prefixes")]
    pub protect_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PurchaseConfig {
    /// Settled or abandoned dialogs are dropped this long after opening
    #[serde(default = "default_dialog_ttl_secs")]
    pub dialog_ttl_secs: u64,
    #[serde(default = "default_dialog_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

// Defaults
fn default_service_name() -> String {
    "iotmarket-api".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_body_limit() -> usize {
    262_144 // 256 KiB
}

fn default_workers() -> u32 {
    0
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_allowed_methods() -> Vec<String> {
    vec![
        "GET".to_string(),
        "POST".to_string(),
        "DELETE".to_string(),
        "OPTIONS".to_string(),
    ]
}

fn default_cors_allowed_headers() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_pg_max_connections() -> u32 {
    10
}

fn default_pg_connect_timeout_ms() -> u64 {
    3000
}

fn default_pg_idle_timeout_ms() -> u64 {
    300000
}

fn default_backend_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_wallet_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_eth_usd_rate() -> f64 {
    iotmarket_eth::DEFAULT_ETH_USD_RATE
}

fn default_receipt_poll_interval_ms() -> u64 {
    1000
}

fn default_cookie_name() -> String {
    "iotmarket-access-token".to_string()
}

fn default_protect_prefixes() -> Vec<String> {
    vec![
        "/api/transactions".to_string(),
        "/api/dashboard".to_string(),
        "/api/listings/mine".to_string(),
    ]
}

fn default_dialog_ttl_secs() -> u64 {
    1800
}

fn default_dialog_sweep_interval_secs() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_body_limit_bytes: default_request_body_limit(),
            workers: default_workers(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            request_id_header: default_request_id_header(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: default_cors_allowed_origins(),
            cors_allowed_methods: default_cors_allowed_methods(),
            cors_allowed_headers: default_cors_allowed_headers(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            enable_postgres: true,
            database_url: String::new(),
            pg_max_connections: default_pg_max_connections(),
            pg_connect_timeout_ms: default_pg_connect_timeout_ms(),
            pg_idle_timeout_ms: default_pg_idle_timeout_ms(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: String::new(),
            email_redirect_to: None,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: default_wallet_rpc_url(),
            signer_address: None,
            merchant_address: String::new(),
            eth_usd_rate: default_eth_usd_rate(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            protect_prefixes: default_protect_prefixes(),
        }
    }
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            dialog_ttl_secs: default_dialog_ttl_secs(),
            sweep_interval_secs: default_dialog_sweep_interval_secs(),
        }
    }
}

pub fn load_config() -> Result<Config, config::ConfigError> {
    let env = env::var("APP__ENV").unwrap_or_else(|_| "dev".to_string());

    let mut builder = config::Config::builder();

    // Try to load TOML file, but don't fail if it doesn't exist
    let config_path = format!("configs/{}/default", env);
    if std::path::Path::new(&format!("{}.toml", config_path)).exists() {
        builder = builder.add_source(config::File::with_name(&config_path).required(false));
    }

    // Environment variables override with APP__ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("APP")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("security.cors_allowed_origins")
            .with_list_parse_key("security.cors_allowed_methods")
            .with_list_parse_key("security.cors_allowed_headers")
            .with_list_parse_key("session.protect_prefixes")
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
