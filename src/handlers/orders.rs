use actix_web::http::header;
use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{blocking, end_bound, start_bound, AppState, PageMeta};
use crate::domain::filters::OrderSearch;
use crate::domain::order::{OrderInput, OrderLineInput, OrderLineView, OrderView};
use crate::domain::pagination::{PageRequest, Paged};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    pub lines: Option<Vec<CreateOrderLineRequest>>,
}

impl From<CreateOrderRequest> for OrderInput {
    fn from(body: CreateOrderRequest) -> Self {
        OrderInput {
            customer_id: body.customer_id,
            lines: body.lines.map(|lines| {
                lines
                    .into_iter()
                    .map(|l| OrderLineInput {
                        product_id: l.product_id,
                        quantity: l.quantity,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub quantity: i32,
    /// Product price when the order was placed
    pub unit_price: String,
    pub total: String,
}

impl From<OrderLineView> for OrderLineResponse {
    fn from(l: OrderLineView) -> Self {
        OrderLineResponse {
            id: l.id,
            product_id: l.product_id,
            product_title: l.product_title,
            quantity: l.quantity,
            unit_price: l.unit_price.to_string(),
            total: l.total.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_amount: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        let total_amount = o.total_amount().to_string();
        OrderResponse {
            id: o.id,
            customer_id: o.customer_id,
            customer_name: o.customer_name,
            created_at: o.created_at,
            updated_at: o.updated_at,
            total_amount,
            lines: o.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderSearchParams {
    /// Exact order id
    pub id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// Matches orders with at least one line whose product matches
    pub product_title: Option<String>,
    pub product_description: Option<String>,
    pub product_slug: Option<String>,
    /// Compared against the product's current price
    #[param(value_type = Option<String>)]
    pub product_price_start: Option<BigDecimal>,
    #[param(value_type = Option<String>)]
    pub product_price_end: Option<BigDecimal>,
    /// `YYYY-MM-DD` (from midnight UTC) or RFC 3339 with `Z`, or with the
    /// offset's `+` sent as `%2B`
    #[serde(default, deserialize_with = "start_bound")]
    #[param(value_type = Option<String>, example = "2024-01-01")]
    pub created_at_start: Option<DateTime<Utc>>,
    /// `YYYY-MM-DD` (through the end of that UTC day) or RFC 3339 as above
    #[serde(default, deserialize_with = "end_bound")]
    #[param(value_type = Option<String>, example = "2024-01-31")]
    pub created_at_end: Option<DateTime<Utc>>,
    /// Same formats as `createdAtStart`
    #[serde(default, deserialize_with = "start_bound")]
    #[param(value_type = Option<String>)]
    pub updated_at_start: Option<DateTime<Utc>>,
    /// Same formats as `createdAtEnd`
    #[serde(default, deserialize_with = "end_bound")]
    #[param(value_type = Option<String>)]
    pub updated_at_end: Option<DateTime<Utc>>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<OrderSearchParams> for OrderSearch {
    fn from(p: OrderSearchParams) -> Self {
        OrderSearch {
            id: p.id,
            customer_name: p.customer_name,
            customer_email: p.customer_email,
            customer_phone: p.customer_phone,
            product_title: p.product_title,
            product_description: p.product_description,
            product_slug: p.product_slug,
            product_price_start: p.product_price_start,
            product_price_end: p.product_price_end,
            created_at_start: p.created_at_start,
            created_at_end: p.created_at_end,
            updated_at_start: p.updated_at_start,
            updated_at_end: p.updated_at_end,
            page: PageRequest::new(p.page_number, p.page_size),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageResponse {
    pub orders: Vec<OrderResponse>,
    #[serde(flatten)]
    pub page: PageMeta,
}

impl From<Paged<OrderView>> for OrderPageResponse {
    fn from(paged: Paged<OrderView>) -> Self {
        let page = PageMeta::from(&paged);
        OrderPageResponse {
            orders: paged.items.into_iter().map(OrderResponse::from).collect(),
            page,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /v1/orders
///
/// Creates an order together with its lines. Unit prices are taken from the
/// products at this moment; the order and its lines are committed in a
/// single database transaction.
#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Customer or product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = OrderInput::from(body.into_inner());
    let service = state.orders();
    let order = blocking(move || service.create_order(input)).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/v1/orders/{}", order.id)))
        .json(OrderResponse::from(order)))
}

/// GET /v1/orders/{id}
///
/// Returns the order together with its lines, in the order they were placed.
#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let service = state.orders();
    let order = blocking(move || service.get_order(id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /v1/orders
///
/// Newest first. All filters are combined with AND.
#[utoipa::path(
    get,
    path = "/v1/orders",
    params(OrderSearchParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = OrderPageResponse),
        (status = 400, description = "Invalid range filter or pagination"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn search_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderSearchParams>,
) -> Result<HttpResponse, AppError> {
    let search = OrderSearch::from(query.into_inner());
    let service = state.orders();
    let page = blocking(move || service.search_orders(&search)).await?;
    Ok(HttpResponse::Ok().json(OrderPageResponse::from(page)))
}
