use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{blocking, AppState, PageMeta};
use crate::domain::pagination::{PageRequest, Paged};
use crate::domain::report::{
    BestCustomerRow, BestCustomersRequest, RevenuePeriodRow, RevenueRequest,
};
use crate::errors::AppError;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BestCustomersParams {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub min_orders: Option<i64>,
    pub max_orders: Option<i64>,
    #[param(value_type = Option<String>)]
    pub min_spent: Option<BigDecimal>,
    #[param(value_type = Option<String>)]
    pub max_spent: Option<BigDecimal>,
    /// `totalOrders` (or `orders`); anything else sorts by amount spent
    pub order_by: Option<String>,
    /// `asc` or `desc` (default)
    pub order_direction: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<BestCustomersParams> for BestCustomersRequest {
    fn from(p: BestCustomersParams) -> Self {
        BestCustomersRequest {
            customer_name: p.customer_name,
            customer_email: p.customer_email,
            min_orders: p.min_orders,
            max_orders: p.max_orders,
            min_spent: p.min_spent,
            max_spent: p.max_spent,
            order_by: p.order_by,
            order_direction: p.order_direction,
            page: PageRequest::new(p.page_number, p.page_size),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestCustomerResponse {
    pub customer_name: String,
    pub customer_email: String,
    pub total_orders: i64,
    pub spent_amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestCustomersPageResponse {
    pub customers: Vec<BestCustomerResponse>,
    #[serde(flatten)]
    pub page: PageMeta,
}

impl From<Paged<BestCustomerRow>> for BestCustomersPageResponse {
    fn from(paged: Paged<BestCustomerRow>) -> Self {
        let page = PageMeta::from(&paged);
        BestCustomersPageResponse {
            customers: paged
                .items
                .into_iter()
                .map(|row| BestCustomerResponse {
                    customer_name: row.customer_name,
                    customer_email: row.customer_email,
                    total_orders: row.total_orders,
                    spent_amount: row.spent_amount.to_string(),
                })
                .collect(),
            page,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RevenueParams {
    /// `YYYY-MM`, first month included
    pub start_period: Option<String>,
    /// `YYYY-MM`, last month included
    pub end_period: Option<String>,
    pub min_orders: Option<i64>,
    pub max_orders: Option<i64>,
    #[param(value_type = Option<String>)]
    pub min_revenue: Option<BigDecimal>,
    #[param(value_type = Option<String>)]
    pub max_revenue: Option<BigDecimal>,
    /// `totalOrders`/`orders`, `totalRevenue`/`revenue`; anything else is chronological
    pub order_by: Option<String>,
    /// `asc` (default) or `desc`
    pub order_direction: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<RevenueParams> for RevenueRequest {
    fn from(p: RevenueParams) -> Self {
        RevenueRequest {
            start_period: p.start_period,
            end_period: p.end_period,
            min_orders: p.min_orders,
            max_orders: p.max_orders,
            min_revenue: p.min_revenue,
            max_revenue: p.max_revenue,
            order_by: p.order_by,
            order_direction: p.order_direction,
            page: PageRequest::new(p.page_number, p.page_size),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePeriodResponse {
    pub year: i32,
    /// English month name, e.g. "January"
    pub month: String,
    pub total_orders: i64,
    pub total_revenue: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePageResponse {
    pub items: Vec<RevenuePeriodResponse>,
    #[serde(flatten)]
    pub page: PageMeta,
}

impl From<Paged<RevenuePeriodRow>> for RevenuePageResponse {
    fn from(paged: Paged<RevenuePeriodRow>) -> Self {
        let page = PageMeta::from(&paged);
        RevenuePageResponse {
            items: paged
                .items
                .into_iter()
                .map(|row| RevenuePeriodResponse {
                    year: row.year,
                    month: row.month_name().to_string(),
                    total_orders: row.total_orders,
                    total_revenue: row.total_revenue.to_string(),
                })
                .collect(),
            page,
        }
    }
}

/// GET /v1/reports/best-customers
#[utoipa::path(
    get,
    path = "/v1/reports/best-customers",
    params(BestCustomersParams),
    responses(
        (status = 200, description = "Customers ranked by orders or amount spent", body = BestCustomersPageResponse),
        (status = 400, description = "Invalid pagination or range filter"),
    ),
    tag = "reports"
)]
pub async fn best_customers(
    state: web::Data<AppState>,
    query: web::Query<BestCustomersParams>,
) -> Result<HttpResponse, AppError> {
    let request = BestCustomersRequest::from(query.into_inner());
    let service = state.reports();
    let page = blocking(move || service.best_customers(&request)).await?;
    Ok(HttpResponse::Ok().json(BestCustomersPageResponse::from(page)))
}

/// GET /v1/reports/revenue-by-period
#[utoipa::path(
    get,
    path = "/v1/reports/revenue-by-period",
    params(RevenueParams),
    responses(
        (status = 200, description = "Orders and revenue per calendar month", body = RevenuePageResponse),
        (status = 400, description = "Invalid pagination, period format or range filter"),
    ),
    tag = "reports"
)]
pub async fn revenue_by_period(
    state: web::Data<AppState>,
    query: web::Query<RevenueParams>,
) -> Result<HttpResponse, AppError> {
    let request = RevenueRequest::from(query.into_inner());
    let service = state.reports();
    let page = blocking(move || service.revenue_by_period(&request)).await?;
    Ok(HttpResponse::Ok().json(RevenuePageResponse::from(page)))
}
