use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{flat_requests, prelude::*};

pub struct FlatRequestRepository {
    conn: DatabaseConnection,
}

impl FlatRequestRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a PENDING request. No dedup against existing requests or flats.
    pub async fn insert(&self, flat_id: &str, name: &str, note: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = flat_requests::ActiveModel {
            flat_id: Set(flat_id.to_string()),
            name: Set(name.to_string()),
            note: Set(note.to_string()),
            status: Set(flat_requests::status::PENDING.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert flat request")?;

        Ok(model.id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<flat_requests::Model>> {
        FlatRequests::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query flat request")
    }

    /// Newest-first listing, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<&str>,
        limit: u64,
    ) -> Result<Vec<flat_requests::Model>> {
        let mut query = FlatRequests::find()
            .order_by_desc(flat_requests::Column::CreatedAt)
            .order_by_desc(flat_requests::Column::Id);

        if let Some(status) = status {
            query = query.filter(flat_requests::Column::Status.eq(status));
        }

        query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list flat requests")
    }
}
