use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{flat_requests, flats, setup_codes};

pub mod migrator;
pub mod repositories;

/// Query surface over the four admin relations. Owns no lifecycle logic;
/// that lives in the service layer above it.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn request_repo(&self) -> repositories::request::FlatRequestRepository {
        repositories::request::FlatRequestRepository::new(self.conn.clone())
    }

    fn flat_repo(&self) -> repositories::flat::FlatRepository {
        repositories::flat::FlatRepository::new(self.conn.clone())
    }

    fn setup_code_repo(&self) -> repositories::setup_code::SetupCodeRepository {
        repositories::setup_code::SetupCodeRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    pub async fn insert_request(&self, flat_id: &str, name: &str, note: &str) -> Result<i64> {
        self.request_repo().insert(flat_id, name, note).await
    }

    pub async fn get_request(&self, id: i64) -> Result<Option<flat_requests::Model>> {
        self.request_repo().get(id).await
    }

    pub async fn list_requests(
        &self,
        status: Option<&str>,
        limit: u64,
    ) -> Result<Vec<flat_requests::Model>> {
        self.request_repo().list(status, limit).await
    }

    pub async fn get_flat(&self, flat_id: &str) -> Result<Option<flats::Model>> {
        self.flat_repo().get(flat_id).await
    }

    pub async fn list_flats(&self, q: Option<&str>, limit: u64) -> Result<Vec<flats::Model>> {
        self.flat_repo().list(q, limit).await
    }

    pub async fn clear_flat_ban(&self, flat: flats::Model) -> Result<()> {
        self.flat_repo().clear_ban(flat).await
    }

    pub async fn set_flat_status(&self, flat: flats::Model, status: &str) -> Result<()> {
        self.flat_repo().set_status(flat, status).await
    }

    pub async fn list_setup_codes(&self, flat_id: &str) -> Result<Vec<setup_codes::Model>> {
        self.setup_code_repo().list_for_flat(flat_id).await
    }

    pub async fn append_audit(&self, action: &str, meta: Option<String>) -> Result<()> {
        self.audit_repo().append(action, meta).await
    }
}
