use sea_orm::entity::prelude::*;

/// One issued provisioning code. Only the Argon2id hash is stored; the
/// plaintext leaves the process exactly once, in the issuance response.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "setup_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub flat_id: String,

    pub code_hash: String,

    pub expires_at: String,

    pub used_at: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::flats::Entity",
        from = "Column::FlatId",
        to = "super::flats::Column::FlatId"
    )]
    Flats,
}

impl Related<super::flats::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
