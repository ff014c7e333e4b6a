use sea_orm::entity::prelude::*;

/// Request lifecycle states. PENDING transitions once to APPROVED or
/// REJECTED; both are terminal.
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const REJECTED: &str = "REJECTED";
}

/// Onboarding request for a flat. Rows become immutable once the status
/// leaves PENDING; nothing is ever deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "flat_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub flat_id: String,

    pub name: String,

    pub note: String,

    /// PENDING | APPROVED | REJECTED
    pub status: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
