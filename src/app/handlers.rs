use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::services::QuoteService;

use super::responses::{BatchPriceResponse, RecordResponse, SeriesResponse};

#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    pub symbols: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Self-description of the gateway.
#[get("/")]
pub async fn index(service: web::Data<QuoteService>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Stock quote gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "max_symbols": service.admission().max_symbols(),
        "endpoints": {
            "/": "API information",
            "/health": "Liveness check",
            "/api/stocks/price?symbols=ACB,FPT": "Latest price for several symbols, fetched concurrently",
            "/api/stock/{symbol}": "Stock overview",
            "/api/stock/{symbol}/price": "Latest price",
            "/api/stock/{symbol}/history?start=YYYY-MM-DD&end=YYYY-MM-DD": "Historical prices",
            "/api/stock/{symbol}/company": "Company profile",
            "/api/stock/{symbol}/intraday": "Intraday trades",
        },
    }))
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

#[get("/api/stocks/price")]
pub async fn batch_prices(
    service: web::Data<QuoteService>,
    query: web::Query<BatchQuery>,
) -> Result<HttpResponse> {
    let result = service.batch_prices(query.symbols.as_deref()).await?;
    Ok(HttpResponse::Ok().json(BatchPriceResponse::from(result)))
}

#[get("/api/stock/{symbol}")]
pub async fn overview(
    service: web::Data<QuoteService>,
    symbol: web::Path<String>,
) -> Result<HttpResponse> {
    let quote = service.overview(&symbol).await?;
    Ok(HttpResponse::Ok().json(RecordResponse::from(quote)))
}

#[get("/api/stock/{symbol}/price")]
pub async fn latest_price(
    service: web::Data<QuoteService>,
    symbol: web::Path<String>,
) -> Result<HttpResponse> {
    let quote = service.latest_price(&symbol).await?;
    Ok(HttpResponse::Ok().json(RecordResponse::from(quote)))
}

#[get("/api/stock/{symbol}/history")]
pub async fn history(
    service: web::Data<QuoteService>,
    symbol: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let series = service
        .history(&symbol, query.start.as_deref(), query.end.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(SeriesResponse::from(series)))
}

#[get("/api/stock/{symbol}/company")]
pub async fn company(
    service: web::Data<QuoteService>,
    symbol: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = service.company(&symbol).await?;
    Ok(HttpResponse::Ok().json(RecordResponse::from(profile)))
}

#[get("/api/stock/{symbol}/intraday")]
pub async fn intraday(
    service: web::Data<QuoteService>,
    symbol: web::Path<String>,
) -> Result<HttpResponse> {
    let series = service.intraday(&symbol).await?;
    Ok(HttpResponse::Ok().json(SeriesResponse::from(series)))
}
