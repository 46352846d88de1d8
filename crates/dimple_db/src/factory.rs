//! Factories for creating database clients and repositories
//!
//! This module provides factories for creating database clients and the SQL
//! store in a database-agnostic way.

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::SqlStore;
use dimple_config::{AppConfig, DatabaseConfig};
use std::sync::Arc;
use tracing::debug;

/// A trait for repository factories, generic over the repository type and
/// the configuration it is created from.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance.
    fn create_repository(&self, config: C) -> R;
}

/// Factory for creating database clients
#[derive(Debug, Clone)]
pub struct DbClientFactory;

impl DbClientFactory {
    pub fn new() -> Self {
        Self
    }

    /// Create a new database client from an application configuration.
    ///
    /// # Errors
    ///
    /// Fails when the database configuration is missing or the connection
    /// cannot be established.
    pub async fn from_app_config(&self, config: &Arc<AppConfig>) -> Result<DbClient, DbError> {
        debug!("Creating database client from application configuration");
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;
        self.from_db_config(db_config).await
    }

    /// Create a new database client from a database configuration.
    pub async fn from_db_config(&self, db_config: &DatabaseConfig) -> Result<DbClient, DbError> {
        debug!("Creating database client from database configuration");
        DbClient::from_config(db_config).await
    }

    /// Create a new database client from a database URL.
    pub async fn from_url(&self, db_url: &str) -> Result<DbClient, DbError> {
        debug!("Creating database client from URL");
        DbClient::from_url(db_url).await
    }
}

impl Default for DbClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for creating SQL stores
#[derive(Debug, Clone)]
pub struct SqlStoreFactory;

impl SqlStoreFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqlStoreFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFactory<SqlStore, DbClient> for SqlStoreFactory {
    /// Create a new SQL store over the given database client.
    fn create_repository(&self, db_client: DbClient) -> SqlStore {
        SqlStore::new(db_client)
    }
}
