use std::sync::Arc;

use anyhow::{Result, bail};

use super::{StorageError, StorageInstance};

#[cfg(feature = "postgres")]
use super::postgresql::PostgresStorage;

#[cfg(feature = "sqlite")]
use super::sqlite::SqliteStorage;

pub async fn create_storage_from_connection_string(
    connection_string: &str,
) -> Result<Arc<dyn StorageInstance>> {
    Ok(match connection_string {
        #[cfg(feature = "postgres")]
        s if s.starts_with("postgres:") || s.starts_with("postgresql:") => {
            Arc::new(PostgresStorage::connect(s).await?)
        }

        #[cfg(feature = "sqlite")]
        s if s.starts_with("sqlite:") => Arc::new(SqliteStorage::connect(s).await?),

        // Provide helpful error messages for disabled backends
        #[cfg(not(feature = "postgres"))]
        s if s.starts_with("postgres:") || s.starts_with("postgresql:") => {
            bail!("PostgreSQL storage backend is not enabled. Enable with --features postgres")
        }

        #[cfg(not(feature = "sqlite"))]
        s if s.starts_with("sqlite:") => {
            bail!("SQLite storage backend is not enabled. Enable with --features sqlite")
        }

        _ => {
            return Err(StorageError::Configuration(format!(
                "Unsupported storage type: {}",
                connection_string
            ))
            .into());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_storage() {
        let err = create_storage_from_connection_string("mongodb://localhost")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported storage type"));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_in_memory() {
        let storage = create_storage_from_connection_string("sqlite::memory:")
            .await
            .unwrap();
        storage.create_or_migrate().await.unwrap();
    }
}
