use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDate;
use log::error;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::fetch::FailureKind;
use crate::records::{BatchResult, DateRange, QuoteRecord};
use crate::services::{SymbolRecord, SymbolSeries};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPriceResponse {
    pub success: bool,
    pub data: BTreeMap<String, QuoteRecord>,
    pub errors: BTreeMap<String, String>,
    pub total_requested: usize,
    pub successful: usize,
    pub failed: usize,
}

impl From<BatchResult> for BatchPriceResponse {
    fn from(result: BatchResult) -> Self {
        Self {
            success: true,
            data: result.successes,
            errors: result.failures,
            total_requested: result.total_requested,
            successful: result.success_count,
            failed: result.failure_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    pub symbol: String,
    pub data: QuoteRecord,
}

impl From<SymbolRecord> for RecordResponse {
    fn from(quote: SymbolRecord) -> Self {
        Self {
            success: true,
            symbol: quote.symbol,
            data: quote.record,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<DateRange> for Period {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub success: bool,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    pub count: usize,
    pub data: Vec<QuoteRecord>,
}

impl From<SymbolSeries> for SeriesResponse {
    fn from(series: SymbolSeries) -> Self {
        Self {
            success: true,
            symbol: series.symbol,
            period: series.period.map(Period::from),
            count: series.records.len(),
            data: series.records,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Admission(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Fetch(failure) => match failure.kind() {
                FailureKind::Empty => StatusCode::NOT_FOUND,
                FailureKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                FailureKind::Transient | FailureKind::Timeout | FailureKind::Other => {
                    StatusCode::BAD_REQUEST
                }
            },
            AppError::Orchestrator(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::Message(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            error: self.to_string(),
        })
    }
}
