use anyhow::Result;
use tracing::info;

use talent_directory_api::{api, config::Config, db, store::Store, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talent_directory_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let conn = db::open(&config.database_path)?;
    db::init_schema(&conn)?;

    let state = AppState {
        config: config.clone(),
        store: Store::new(conn),
    };

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("talent-directory-api listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
