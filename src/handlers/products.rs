use actix_web::http::header;
use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{blocking, decimal, AppState, PageMeta};
use crate::domain::filters::ProductSearch;
use crate::domain::pagination::{PageRequest, Paged};
use crate::domain::product::{Product, ProductInput};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slug: String,
    /// Decimal number or string, e.g. `9.99` or `"9.99"`. Send a string when
    /// the value needs more than 15 significant digits.
    #[serde(default, deserialize_with = "decimal")]
    #[schema(value_type = String, example = "9.99")]
    pub price: BigDecimal,
}

impl From<ProductRequest> for ProductInput {
    fn from(body: ProductRequest) -> Self {
        ProductInput {
            title: body.title,
            description: body.description,
            slug: body.slug,
            price: body.price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            title: p.title,
            description: p.description,
            slug: p.slug,
            price: p.price.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductSearchParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<BigDecimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<BigDecimal>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<ProductSearchParams> for ProductSearch {
    fn from(p: ProductSearchParams) -> Self {
        ProductSearch {
            title: p.title,
            description: p.description,
            slug: p.slug,
            min_price: p.min_price,
            max_price: p.max_price,
            page: PageRequest::new(p.page_number, p.page_size),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageResponse {
    pub products: Vec<ProductResponse>,
    #[serde(flatten)]
    pub page: PageMeta,
}

impl From<Paged<Product>> for ProductPageResponse {
    fn from(paged: Paged<Product>) -> Self {
        let page = PageMeta::from(&paged);
        ProductPageResponse {
            products: paged.items.into_iter().map(ProductResponse::from).collect(),
            page,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /v1/products
#[utoipa::path(
    get,
    path = "/v1/products",
    params(ProductSearchParams),
    responses(
        (status = 200, description = "Page of products ordered by title", body = ProductPageResponse),
        (status = 400, description = "Invalid price range or pagination"),
    ),
    tag = "products"
)]
pub async fn search_products(
    state: web::Data<AppState>,
    query: web::Query<ProductSearchParams>,
) -> Result<HttpResponse, AppError> {
    let search = ProductSearch::from(query.into_inner());
    let service = state.products();
    let page = blocking(move || service.search_products(&search)).await?;
    Ok(HttpResponse::Ok().json(ProductPageResponse::from(page)))
}

/// GET /v1/products/{id}
#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let service = state.products();
    let product = blocking(move || service.get_product(id)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// POST /v1/products
#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Slug already in use"),
    ),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let input = ProductInput::from(body.into_inner());
    let service = state.products();
    let product = blocking(move || service.create_product(input)).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/v1/products/{}", product.id)))
        .json(ProductResponse::from(product)))
}

/// PUT /v1/products/{id}
///
/// Lines of orders already placed keep the unit price they were placed at.
#[utoipa::path(
    put,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Slug already in use"),
    ),
    tag = "products"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = ProductInput::from(body.into_inner());
    let service = state.products();
    let product = blocking(move || service.update_product(id, input)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /v1/products/{id}
#[utoipa::path(
    delete,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product is referenced by orders"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let service = state.products();
    blocking(move || service.delete_product(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
