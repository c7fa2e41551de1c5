use adapter::StoreMode;
use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

const ENV_PREFIX: &str = "CASANOTES_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub board: BoardSettings,
    pub security: SecuritySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    // fallback when a viewer never chose a language; "auto" reads LANG
    pub default_language: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct BoardSettings {
    pub mode: StoreMode,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub token_secret: String,
    pub session_ttl_hours: i64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("server.default_language", "auto")?
            .set_default("database.url", "sqlite://data/casanotes.db")?
            .set_default("board.mode", "sqlite")?
            .set_default("security.token_secret", "change_me_please")?
            .set_default("security.session_ttl_hours", 720)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map).map_err(|e| ConfigError::Foreign(Box::new(e)))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

/// `CASANOTES_SERVER__PORT=8080` becomes `server.port = "8080"`.
fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| (env_key_to_path(&k), v))
        .collect()
}

fn env_key_to_path(key: &str) -> String {
    key.trim_start_matches(ENV_PREFIX)
        .replace("__", ".")
        .to_lowercase()
}
