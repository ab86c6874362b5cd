use crate::cli::{utils, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = utils::connect().await?;
    DatabaseManager::ensure_schema(&pool).await?;
    pool.close().await;

    utils::output_success(&output_format, "Database schema is ready", None)
}
