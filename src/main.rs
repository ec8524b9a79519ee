use std::sync::Arc;

use back_office::{
    build_server, create_pool, run_migrations, AppConfig, AppState, DieselStore, StartupError,
};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.pool_size)?;
    run_migrations(&pool)?;

    let state = AppState::new(Arc::new(DieselStore::new(pool)));

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    log::info!(
        "API docs at http://{}:{}/swagger-ui/",
        config.host,
        config.port
    );

    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
