//! Domain service for the flat lifecycle and credential-issuance state machine.
//!
//! Owns all writes to `flats` and `setup_codes`; request rows become
//! immutable once terminal.

use serde::Serialize;
use thiserror::Error;

use crate::entities::{flat_requests, flats};

pub use crate::entities::flat_requests::status as request_status;
pub use crate::entities::flats::status as flat_status;

/// Errors specific to lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Request not found")]
    RequestNotFound,

    #[error("Flat not found")]
    FlatNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for LifecycleError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for LifecycleError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Issuance result. `code` is the only place the plaintext ever appears;
/// it is unrecoverable once this value is dropped.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSetupCode {
    pub flat_id: String,
    pub code: String,
    pub expires_at: String,
}

/// Domain service trait for flat onboarding, credentialing and suspension.
#[async_trait::async_trait]
pub trait LifecycleService: Send + Sync {
    /// Records a PENDING onboarding request and returns its id.
    async fn create_request(
        &self,
        flat_id: &str,
        name: &str,
        note: &str,
    ) -> Result<i64, LifecycleError>;

    /// Lists requests newest-first, optionally filtered by status.
    async fn list_requests(
        &self,
        status: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Vec<flat_requests::Model>, LifecycleError>;

    /// Approves a request and upserts the flat it names, in one transaction.
    /// Returns the flat id.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::RequestNotFound`] if the request is absent.
    /// Re-approving an APPROVED request is idempotent; approving a REJECTED
    /// one fails validation.
    async fn approve_request(&self, id: i64) -> Result<String, LifecycleError>;

    /// Marks a request REJECTED.
    async fn reject_request(&self, id: i64) -> Result<(), LifecycleError>;

    /// Issues a fresh setup code for a flat and clears its provisioned
    /// device credential, forcing re-provisioning through the new code.
    async fn generate_setup_code(
        &self,
        flat_id: &str,
        ttl_minutes: Option<u32>,
    ) -> Result<IssuedSetupCode, LifecycleError>;

    /// Case-insensitive substring search over flat ids, ascending.
    async fn list_flats(
        &self,
        q: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Vec<flats::Model>, LifecycleError>;

    /// Clears `ban_until` and the sticky `requires_admin_revoke` flag.
    async fn revoke_ban(&self, flat_id: &str) -> Result<(), LifecycleError>;

    /// Flips the administrator kill switch.
    async fn set_disabled(&self, flat_id: &str, disabled: bool) -> Result<(), LifecycleError>;
}
