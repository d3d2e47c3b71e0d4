use bookshelf::{
    application::book_service::BookServiceImpl,
    config::Config,
    domain::repository::BookRepository,
    http::routing::{self, books},
    infrastructure::sqlite_repo::SqliteBookRepository,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let repo = SqliteBookRepository::connect(&config.database_url).await?;
    repo.init().await?;
    tracing::info!(database_url = %config.database_url, "book store ready");

    let service = BookServiceImpl::new(repo);
    let books_router = books::router(books::AppState { service });
    let router = routing::app(books_router, routing::cors_layer(&config.cors_origin)?);

    let addr = config.addr();
    tracing::info!(%addr, prefix = routing::API_PREFIX, cors_origin = %config.cors_origin, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
