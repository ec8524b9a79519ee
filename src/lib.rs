pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::{AppConfig, ConfigError};
pub use db::{create_pool, DbPool};
pub use handlers::AppState;
pub use infrastructure::memory::InMemoryStore;
pub use infrastructure::DieselStore;

use domain::errors::Rejection;
use errors::AppError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create database connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Failed to run database migrations: {0}")]
    Migrations(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), StartupError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migrations(e.to_string()))?;
    for version in applied {
        log::info!("applied migration {version}");
    }
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::customers::search_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::products::search_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::orders::search_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::reports::best_customers,
        handlers::reports::revenue_by_period,
    ),
    tags(
        (name = "customers", description = "Customer records"),
        (name = "products", description = "Catalogue"),
        (name = "orders", description = "Orders and their lines"),
        (name = "reports", description = "Aggregates over placed orders"),
    )
)]
pub struct ApiDoc;

/// Routes, extractor error handling and the Swagger UI. The caller provides
/// `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(Rejection::new(err.to_string())).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::Validation(Rejection::new(err.to_string())).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::Validation(Rejection::new(err.to_string())).into()
    }))
    .service(
        web::scope("/v1/customers")
            .route("", web::get().to(handlers::customers::search_customers))
            .route("", web::post().to(handlers::customers::create_customer))
            .route("/{id}", web::get().to(handlers::customers::get_customer))
            .route("/{id}", web::put().to(handlers::customers::update_customer))
            .route("/{id}", web::delete().to(handlers::customers::delete_customer)),
    )
    .service(
        web::scope("/v1/products")
            .route("", web::get().to(handlers::products::search_products))
            .route("", web::post().to(handlers::products::create_product))
            .route("/{id}", web::get().to(handlers::products::get_product))
            .route("/{id}", web::put().to(handlers::products::update_product))
            .route("/{id}", web::delete().to(handlers::products::delete_product)),
    )
    .service(
        web::scope("/v1/orders")
            .route("", web::get().to(handlers::orders::search_orders))
            .route("", web::post().to(handlers::orders::create_order))
            .route("/{id}", web::get().to(handlers::orders::get_order)),
    )
    .service(
        web::scope("/v1/reports")
            .route(
                "/best-customers",
                web::get().to(handlers::reports::best_customers),
            )
            .route(
                "/revenue-by-period",
                web::get().to(handlers::reports::revenue_by_period),
            ),
    )
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run())
}
