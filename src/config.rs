use crate::error::AppError;

/// Backend selected by `STORE_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Wallet every write is attributed to and every "mine" read is scoped by.
    pub wallet: String,
    pub space_id: String,
    pub store: StoreBackend,
    pub db_max_connections: u32,
    pub query_limit: usize,
    pub listing_ttl_secs: u64,
    pub profile_ttl_secs: u64,
    pub purge_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub jitsi_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let wallet = lookup("MENTORGRAPH_WALLET")
            .ok_or_else(|| AppError::Config("MENTORGRAPH_WALLET missing in environment".to_string()))?;
        let wallet = validate_wallet(&wallet)?;

        let store_url = var("STORE_URL", "sqlite://mentorgraph.db?mode=rwc");
        let store = if store_url.eq_ignore_ascii_case("memory") {
            StoreBackend::Memory
        } else if store_url.starts_with("sqlite:") {
            StoreBackend::Sqlite(store_url)
        } else {
            return Err(AppError::Config(format!("Unsupported STORE_URL: {}", store_url)));
        };

        Ok(Config {
            server_host: var("SERVER_HOST", "127.0.0.1"),
            server_port: parse(&var("SERVER_PORT", "3000"), "SERVER_PORT")?,
            wallet,
            space_id: var("SPACE_ID", "local-dev"),
            store,
            db_max_connections: parse(&var("DB_MAX_CONNECTIONS", "5"), "DB_MAX_CONNECTIONS")?,
            query_limit: parse(&var("QUERY_LIMIT", "100"), "QUERY_LIMIT")?,
            listing_ttl_secs: parse(&var("LISTING_TTL_SECS", "7200"), "LISTING_TTL_SECS")?,
            profile_ttl_secs: parse(&var("PROFILE_TTL_SECS", "31536000"), "PROFILE_TTL_SECS")?,
            purge_interval_secs: parse(&var("PURGE_INTERVAL_SECS", "300"), "PURGE_INTERVAL_SECS")?,
            request_timeout_secs: parse(&var("REQUEST_TIMEOUT_SECS", "30"), "REQUEST_TIMEOUT_SECS")?,
            jitsi_base_url: var("JITSI_BASE_URL", "https://meet.jit.si"),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse<T>(raw: &str, name: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

/// Accepts `0x` followed by 40 hex digits; keeps the caller's casing.
fn validate_wallet(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AppError::Config("MENTORGRAPH_WALLET must start with 0x".to_string()))?;

    let bytes = hex::decode(digits)
        .map_err(|e| AppError::Config(format!("Invalid MENTORGRAPH_WALLET: {}", e)))?;
    if bytes.len() != 20 {
        return Err(AppError::Config(
            "MENTORGRAPH_WALLET must be 20 bytes".to_string(),
        ));
    }

    Ok(format!("0x{}", digits))
}
