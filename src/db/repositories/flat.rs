use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{flats, prelude::*};

pub struct FlatRepository {
    conn: DatabaseConnection,
}

impl FlatRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, flat_id: &str) -> Result<Option<flats::Model>> {
        Flats::find_by_id(flat_id)
            .one(&self.conn)
            .await
            .context("Failed to query flat")
    }

    /// Case-insensitive substring match on flat_id, ascending order.
    pub async fn list(&self, q: Option<&str>, limit: u64) -> Result<Vec<flats::Model>> {
        let mut query = Flats::find().order_by_asc(flats::Column::FlatId);

        if let Some(q) = q
            && !q.is_empty()
        {
            let pattern = format!("%{}%", q.to_lowercase());
            query = query
                .filter(Expr::expr(Func::lower(Expr::col(flats::Column::FlatId))).like(pattern));
        }

        query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list flats")
    }

    /// Clears both suspension mechanisms: the time-bounded ban and the sticky
    /// manual-override flag.
    pub async fn clear_ban(&self, flat: flats::Model) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: flats::ActiveModel = flat.into();
        active.ban_until = Set(None);
        active.requires_admin_revoke = Set(false);
        active.updated_at = Set(now);
        active
            .update(&self.conn)
            .await
            .context("Failed to clear ban")?;

        Ok(())
    }

    pub async fn set_status(&self, flat: flats::Model, status: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: flats::ActiveModel = flat.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(now);
        active
            .update(&self.conn)
            .await
            .context("Failed to update flat status")?;

        Ok(())
    }
}
