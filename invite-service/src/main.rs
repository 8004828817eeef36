use log::{error, info};
use partyplanner_shared::config::AppConfig;

mod error;
mod handlers;
mod models;
mod routes;
mod state;

#[cfg(test)]
mod tests;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Logging initialized with env_logger");
    info!("Starting Invite Service");

    let config = AppConfig::from_env(DEFAULT_PORT);
    let app = routes::create_router(&config).await.map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    if config.lambda {
        info!("Running inside AWS Lambda");
        lambda_http::run(app).await
    } else {
        let addr = format!("0.0.0.0:{}", config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            error!("Failed to bind {}: {}", addr, e);
            e
        })?;
        info!("Listening on {}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
