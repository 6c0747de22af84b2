mod config;
mod controllers;
mod errors;
mod models;
mod service;
mod utils;

use actix_web::{App, HttpServer, middleware::Logger, web};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::config::routes::routes;
use crate::service::handler::{AppState, app_config};
use crate::service::otp_service;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let config = config::config::Config::from_env().expect("Failed to load config");
    let pool = config
        .db_pool()
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!().run(&pool).await?;

    otp_service::spawn_expiry_sweep(pool.clone());

    let state = web::Data::new(AppState::new(pool, &config)?);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(app_config)
            .configure(routes)
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
