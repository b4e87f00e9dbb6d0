use dotenvy::dotenv;
use storefront::config::AppConfig;
use storefront::{build_server, create_pool, postgres_state, run_migrations};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    run_migrations(&pool)?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = postgres_state(pool, &config);
    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
