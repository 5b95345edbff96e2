use crate::common::error::{CoreError, Result};
use libsql::{Builder, Connection, Database};
use std::env;
use tracing::info;

/// Connection manager for the document store. Points at a remote Turso
/// database when `LIBSQL_URL`/`LIBSQL_AUTH_TOKEN` are set, otherwise at a
/// local file (`LIBSQL_PATH`, default `cni.db`).
pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    pub async fn new() -> Result<Self> {
        let db = match (env::var("LIBSQL_URL"), env::var("LIBSQL_AUTH_TOKEN")) {
            (Ok(url), Ok(auth_token)) => {
                info!("Connecting to remote libSQL database at {}", url);
                Builder::new_remote(url, auth_token)
                    .build()
                    .await
                    .map_err(|e| CoreError::Database {
                        message: format!("Failed to connect to database: {e}"),
                    })?
            }
            _ => {
                let path = env::var("LIBSQL_PATH").unwrap_or_else(|_| "cni.db".to_string());
                info!("Opening local libSQL database at {}", path);
                Builder::new_local(path)
                    .build()
                    .await
                    .map_err(|e| CoreError::Database {
                        message: format!("Failed to open local database: {e}"),
                    })?
            }
        };

        Ok(Self { db })
    }

    pub async fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| CoreError::Database {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        let migration_sql_001 = include_str!("../migrations/001_create_nodes.sql");
        conn.execute_batch(migration_sql_001)
            .await
            .map_err(|e| CoreError::Database {
                message: format!("Failed to run base migration: {e}"),
            })?;

        let migration_sql_002 = include_str!("../migrations/002_indexes_and_pragmas.sql");
        conn.execute_batch(migration_sql_002)
            .await
            .map_err(|e| CoreError::Database {
                message: format!("Failed to run index migration: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Create or update a node (upsert keyed on id).
    pub async fn upsert_node(&self, id: &str, label: &str, data: &str) -> Result<()> {
        let conn = self.get_connection().await?;

        conn.execute(
            "INSERT INTO nodes (id, label, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, COALESCE((SELECT created_at FROM nodes WHERE id = ?1), datetime('now')), datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
               data = excluded.data,
               updated_at = excluded.updated_at",
            libsql::params![id, label, data],
        )
        .await
        .map_err(|e| CoreError::Database {
            message: format!("Failed to upsert node: {e}"),
        })?;

        Ok(())
    }

    pub async fn get_node(&self, id: &str) -> Result<Option<(String, String)>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT label, data FROM nodes WHERE id = ?",
                libsql::params![id],
            )
            .await
            .map_err(|e| CoreError::Database {
                message: format!("Failed to query node: {e}"),
            })?;

        if let Some(row) = rows.next().await.map_err(|e| CoreError::Database {
            message: format!("Failed to read row: {e}"),
        })? {
            let label: String = row.get(0).map_err(|e| CoreError::Database {
                message: format!("Failed to get label: {e}"),
            })?;
            let data: String = row.get(1).map_err(|e| CoreError::Database {
                message: format!("Failed to get data: {e}"),
            })?;
            Ok(Some((label, data)))
        } else {
            Ok(None)
        }
    }

    pub async fn get_nodes_by_label(&self, label: &str) -> Result<Vec<(String, String)>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, data FROM nodes WHERE label = ?",
                libsql::params![label],
            )
            .await
            .map_err(|e| CoreError::Database {
                message: format!("Failed to query nodes: {e}"),
            })?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| CoreError::Database {
            message: format!("Failed to read row: {e}"),
        })? {
            let id: String = row.get(0).map_err(|e| CoreError::Database {
                message: format!("Failed to get id: {e}"),
            })?;
            let data: String = row.get(1).map_err(|e| CoreError::Database {
                message: format!("Failed to get data: {e}"),
            })?;
            results.push((id, data));
        }

        Ok(results)
    }

    pub async fn delete_node(&self, id: &str) -> Result<()> {
        let conn = self.get_connection().await?;

        conn.execute("DELETE FROM nodes WHERE id = ?", libsql::params![id])
            .await
            .map_err(|e| CoreError::Database {
                message: format!("Failed to delete node {id}: {e}"),
            })?;

        Ok(())
    }

    /// Clear all data from the database (useful for development).
    pub async fn clear_all_data(&self) -> Result<()> {
        let conn = self.get_connection().await?;

        conn.execute("DELETE FROM nodes", libsql::params![])
            .await
            .map_err(|e| CoreError::Database {
                message: format!("Failed to clear nodes: {e}"),
            })?;

        info!("Cleared all data from database");
        Ok(())
    }
}
