use serde::Serialize;

use crate::entities::{flat_requests, flats};

/// Uniform response envelope: `{ok: bool, ...payload}` on success,
/// `{ok: false, error: CODE}` on failure.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub const fn empty() -> Self {
        Self {
            ok: true,
            data: None,
            error: None,
        }
    }

    pub fn error(code: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(code.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedDto {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ApprovedDto {
    pub flat_id: String,
}

#[derive(Debug, Serialize)]
pub struct RowsDto<T> {
    pub rows: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct FlatRequestDto {
    pub id: i64,
    pub flat_id: String,
    pub name: String,
    pub note: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<flat_requests::Model> for FlatRequestDto {
    fn from(model: flat_requests::Model) -> Self {
        Self {
            id: model.id,
            flat_id: model.flat_id,
            name: model.name,
            note: model.note,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Flat listing row. Credential hashes never leave the store layer.
#[derive(Debug, Serialize)]
pub struct FlatDto {
    pub flat_id: String,
    pub status: String,
    pub strike_count: i32,
    pub ban_until: Option<String>,
    pub requires_admin_revoke: bool,
    pub has_pin: bool,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
}

impl From<flats::Model> for FlatDto {
    fn from(model: flats::Model) -> Self {
        Self {
            flat_id: model.flat_id,
            status: model.status,
            strike_count: model.strike_count,
            ban_until: model.ban_until,
            requires_admin_revoke: model.requires_admin_revoke,
            has_pin: model.pin_hash.is_some(),
            created_at: model.created_at,
            updated_at: model.updated_at,
            last_login_at: model.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetupCodeDto {
    pub flat_id: String,
    pub code: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct LiveSnapshotDto {
    pub snap: serde_json::Value,
}
