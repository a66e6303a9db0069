use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Server port
    pub port: u16,
    /// Endpoint inventory database (SQLite)
    pub database_url: String,
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT issuer
    pub jwt_issuer: String,
    /// Built-in tenant the root role is seeded in
    pub default_domain: String,
    /// Role granted every permissioned endpoint at boot
    pub root_role: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Defaults, then `WARDEN_*` environment variables (a `.env` file is read first)
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Config::builder().add_source(Environment::with_prefix("WARDEN").try_parsing(true)),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite::memory:")?
            .set_default("jwt_secret", "warden-dev-secret-change-in-production")?
            .set_default("jwt_issuer", "warden.local")?
            .set_default("default_domain", "built-in")?
            .set_default("root_role", "ROLE_SUPER")?
            .set_default("log_format", "pretty")?
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Root callers may administer any domain
    pub fn is_root(&self, roles: &[String], domain: &str) -> bool {
        domain == self.default_domain && roles.iter().any(|r| r == &self.root_role)
    }
}
