use serde_json::{json, Value};
use sqlx::PgPool;

use crate::cli::OutputFormat;
use crate::config::{self, StorageBackend};
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("  {}: {}", key, s),
                        other => println!("  {}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}

/// Connect to the configured PostgreSQL database
pub async fn connect() -> anyhow::Result<PgPool> {
    let config = config::config();
    if config.database.backend == StorageBackend::Memory {
        anyhow::bail!("STORAGE_BACKEND=memory has nothing to administer; point DATABASE_URL at PostgreSQL");
    }
    Ok(DatabaseManager::connect(&config.database).await?)
}
