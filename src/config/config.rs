use std::time::Duration;

use color_eyre::Result;
use dotenv::dotenv;
use eyre::WrapErr;
use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub database_pool_size: u32,
    pub platform_name: String,
    pub jwt_secret: String,
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
}

fn default_pool_size() -> u32 {
    10
}

fn default_app_env() -> String {
    "production".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        info!("Initializing configuration");
        let settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .wrap_err("Building configuration")?;

        settings
            .try_deserialize()
            .wrap_err("loading configuration from environment")
    }

    pub async fn db_pool(&self) -> Result<PgPool> {
        info!(size = self.database_pool_size, "Initializing database pool");
        PgPoolOptions::new()
            .max_connections(self.database_pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&self.database_url)
            .await
            .wrap_err("Creating database pool")
    }

    /// Diagnostics paths (the OTP code in the send-otp response) are only
    /// enabled in development.
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_env_gates_diagnostics() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 3000,
            database_url: "postgres://localhost/boltpay".into(),
            database_pool_size: default_pool_size(),
            platform_name: "BoltPay".into(),
            jwt_secret: "secret".into(),
            smtp_host: "smtp.example.com".into(),
            smtp_user: "noreply@example.com".into(),
            smtp_pass: "password".into(),
            app_env: default_app_env(),
        };
        assert!(!config.is_development());
        assert_eq!(config.database_pool_size, 10);
    }
}
