use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::config::GatewayConfig;
use crate::error::{Context, Result};
use crate::fetch::RestQuoteSource;
use crate::services::QuoteService;

use super::handlers;

/// Register every route. Shared by the server and the route tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::index)
        .service(handlers::health_check)
        .service(handlers::batch_prices)
        .service(handlers::overview)
        .service(handlers::latest_price)
        .service(handlers::history)
        .service(handlers::company)
        .service(handlers::intraday);
}

/// Entry point used by `main`: wire the provider and serve until shutdown.
pub async fn run(config: GatewayConfig) -> Result<()> {
    let source = RestQuoteSource::new(config.provider.clone())?;
    let service = web::Data::new(QuoteService::from_config(&config, Arc::new(source)));

    info!(
        "Starting quote gateway at http://{} ({} workers, {} symbols per batch, {}ms rate interval)",
        config.bind_address, config.workers, config.max_symbols, config.rate_interval_ms
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(config.bind_address.as_str())
    .with_context(|| format!("failed to bind {}", config.bind_address))?
    .run()
    .await?;

    info!("Quote gateway stopped");
    Ok(())
}
