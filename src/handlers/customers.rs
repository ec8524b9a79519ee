use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{blocking, AppState, PageMeta};
use crate::domain::customer::{Customer, CustomerInput};
use crate::domain::filters::CustomerSearch;
use crate::domain::pagination::{PageRequest, Paged};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Body of create and update. Every field is rewritten on update.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// `YYYY-MM-DD`, not in the future
    pub birth_date: Option<NaiveDate>,
}

impl From<CustomerRequest> for CustomerInput {
    fn from(body: CustomerRequest) -> Self {
        CustomerInput {
            name: body.name,
            email: body.email,
            phone: body.phone,
            birth_date: body.birth_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        CustomerResponse {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            birth_date: c.birth_date,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerSearchParams {
    /// Case-insensitive "contains"
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// 1-based, defaults to 1
    pub page_number: Option<i64>,
    /// 1 to 100, defaults to 10
    pub page_size: Option<i64>,
}

impl From<CustomerSearchParams> for CustomerSearch {
    fn from(p: CustomerSearchParams) -> Self {
        CustomerSearch {
            name: p.name,
            email: p.email,
            phone: p.phone,
            page: PageRequest::new(p.page_number, p.page_size),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPageResponse {
    pub customers: Vec<CustomerResponse>,
    #[serde(flatten)]
    pub page: PageMeta,
}

impl From<Paged<Customer>> for CustomerPageResponse {
    fn from(paged: Paged<Customer>) -> Self {
        let page = PageMeta::from(&paged);
        CustomerPageResponse {
            customers: paged.items.into_iter().map(CustomerResponse::from).collect(),
            page,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /v1/customers
#[utoipa::path(
    get,
    path = "/v1/customers",
    params(CustomerSearchParams),
    responses(
        (status = 200, description = "Page of customers ordered by name", body = CustomerPageResponse),
        (status = 400, description = "Invalid pagination"),
    ),
    tag = "customers"
)]
pub async fn search_customers(
    state: web::Data<AppState>,
    query: web::Query<CustomerSearchParams>,
) -> Result<HttpResponse, AppError> {
    let search = CustomerSearch::from(query.into_inner());
    let service = state.customers();
    let page = blocking(move || service.search_customers(&search)).await?;
    Ok(HttpResponse::Ok().json(CustomerPageResponse::from(page)))
}

/// GET /v1/customers/{id}
#[utoipa::path(
    get,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let service = state.customers();
    let customer = blocking(move || service.get_customer(id)).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// POST /v1/customers
#[utoipa::path(
    post,
    path = "/v1/customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already in use"),
    ),
    tag = "customers"
)]
pub async fn create_customer(
    state: web::Data<AppState>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let input = CustomerInput::from(body.into_inner());
    let service = state.customers();
    let customer = blocking(move || service.create_customer(input)).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/v1/customers/{}", customer.id)))
        .json(CustomerResponse::from(customer)))
}

/// PUT /v1/customers/{id}
#[utoipa::path(
    put,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Email already in use"),
    ),
    tag = "customers"
)]
pub async fn update_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = CustomerInput::from(body.into_inner());
    let service = state.customers();
    let customer = blocking(move || service.update_customer(id, input)).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// DELETE /v1/customers/{id}
#[utoipa::path(
    delete,
    path = "/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer still has orders"),
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let service = state.customers();
    blocking(move || service.delete_customer(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
