use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::entities::admin_audit;

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn append(&self, action: &str, meta: Option<String>) -> Result<()> {
        let active = admin_audit::ActiveModel {
            action: Set(action.to_string()),
            meta: Set(meta),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to append audit entry")?;

        Ok(())
    }
}
