use std::{env, path::Path};

use anyhow::Result;
use tracing::info;

use talent_directory_api::{config::Config, db, loader, store::Store};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talent_directory_api=info,bulk_load=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let file_name = env::args()
        .nth(1)
        .unwrap_or_else(|| "mock_userdata.json".to_string());

    let conn = db::open(&config.database_path)?;
    db::reset_schema(&conn)?;
    info!(db = %config.database_path.display(), "Schema recreated");

    let store = Store::new(conn);
    let summary = loader::load_file(&store, Path::new(&file_name))?;
    info!(
        created = summary.created,
        skipped = summary.skipped,
        "Bulk load complete"
    );
    Ok(())
}
