pub mod customers;
pub mod orders;
pub mod products;
pub mod reports;

use std::str::FromStr;
use std::sync::Arc;

use actix_web::web;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::application::customer_service::CustomerService;
use crate::application::order_service::OrderService;
use crate::application::product_service::ProductService;
use crate::application::report_service::ReportService;
use crate::domain::errors::DomainError;
use crate::domain::pagination::Paged;
use crate::domain::ports::Store;
use crate::errors::AppError;

/// Shared by every worker. Services are cheap views over the store handle.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn customers(&self) -> CustomerService<dyn Store> {
        CustomerService::new(Arc::clone(&self.store))
    }

    pub fn products(&self) -> ProductService<dyn Store> {
        ProductService::new(Arc::clone(&self.store))
    }

    pub fn orders(&self) -> OrderService<dyn Store> {
        OrderService::new(Arc::clone(&self.store))
    }

    pub fn reports(&self) -> ReportService<dyn Store> {
        ReportService::new(Arc::clone(&self.store))
    }
}

/// Run store-bound work on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    Ok(web::block(work).await??)
}

// ── Shared response pieces ───────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page_number: i64,
    pub page_size: i64,
    pub total_count: i64,
    /// `ceil(totalCount / pageSize)`
    pub total_pages: i64,
}

impl<T> From<&Paged<T>> for PageMeta {
    fn from(paged: &Paged<T>) -> Self {
        PageMeta {
            page_number: paged.page.number(),
            page_size: paged.page.size(),
            total_count: paged.total,
            total_pages: paged.total_pages(),
        }
    }
}

/// Money accepted either as a JSON number or a decimal string. A missing
/// value reads as zero so the price rule reports it. Numbers pass through
/// `f64`, so values needing more than 15 significant digits must be strings.
pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => BigDecimal::from_str(&n.to_string()).map_err(D::Error::custom),
        serde_json::Value::String(s) => BigDecimal::from_str(s.trim()).map_err(D::Error::custom),
        serde_json::Value::Null => Ok(BigDecimal::from(0)),
        other => Err(D::Error::custom(format!("expected a decimal, got {other}"))),
    }
}

/// Parse a query bound given as RFC 3339 or as a bare `YYYY-MM-DD`. A bare
/// date covers the whole UTC day: midnight for a start bound, the last
/// instant of the day for an end bound.
pub(crate) fn parse_bound(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let at = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(at.and_utc())
}

fn bound<'de, D>(deserializer: D, end_of_day: bool) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_bound(value, end_of_day).map(Some).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid date {value:?}: use YYYY-MM-DD or RFC 3339 such as 2024-01-31T08:00:00Z"
            ))
        }),
    }
}

pub(crate) fn start_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    bound(deserializer, false)
}

pub(crate) fn end_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    bound(deserializer, true)
}
