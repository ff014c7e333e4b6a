use sea_orm::entity::prelude::*;

/// Flat states. DISABLED is the administrator-only kill switch, independent
/// of the ban fields.
pub mod status {
    pub const ACTIVE: &str = "ACTIVE";
    pub const DISABLED: &str = "DISABLED";
}

/// A provisioned tenant unit. Created only by approving a request.
///
/// Two suspension mechanisms coexist: a time-bounded ban (`ban_until`) and a
/// sticky manual-override flag (`requires_admin_revoke`) that survives ban
/// expiry until an admin clears it. `status = DISABLED` is a separate,
/// administrator-only kill switch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "flats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub flat_id: String,

    /// ACTIVE | DISABLED
    pub status: String,

    /// Argon2id hash of the provisioned device PIN, cleared whenever a new
    /// setup code is issued.
    pub pin_hash: Option<String>,

    pub password_hash: Option<String>,

    pub strike_count: i32,

    pub ban_until: Option<String>,

    pub requires_admin_revoke: bool,

    pub created_at: String,

    pub updated_at: String,

    pub last_login_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::setup_codes::Entity")]
    SetupCodes,
}

impl Related<super::setup_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SetupCodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
