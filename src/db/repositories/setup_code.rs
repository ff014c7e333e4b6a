use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{prelude::*, setup_codes};

pub struct SetupCodeRepository {
    conn: DatabaseConnection,
}

impl SetupCodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All codes ever issued for a flat, newest first. Expired rows are kept;
    /// consumers check `expires_at` at use time.
    pub async fn list_for_flat(&self, flat_id: &str) -> Result<Vec<setup_codes::Model>> {
        SetupCodes::find()
            .filter(setup_codes::Column::FlatId.eq(flat_id))
            .order_by_desc(setup_codes::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list setup codes")
    }
}
