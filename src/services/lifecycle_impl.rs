//! `SeaORM` implementation of the [`LifecycleService`] trait.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use tokio::task;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::entities::{flat_requests, flats, prelude::*, setup_codes};
use crate::services::lifecycle::{
    IssuedSetupCode, LifecycleError, LifecycleService, flat_status, request_status,
};

/// Server-side cap on listing sizes.
const MAX_LIST_ROWS: u64 = 200;

/// Letters legible when read aloud or transcribed from a sticker: I and O
/// are excluded.
const CODE_LETTERS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Digits excluding 0 and 1.
const CODE_DIGITS: &[u8] = b"23456789";

pub struct SeaOrmLifecycleService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmLifecycleService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn audit(&self, action: &str, meta: serde_json::Value) {
        if let Err(e) = self.store.append_audit(action, Some(meta.to_string())).await {
            warn!("Failed to append audit entry for {}: {}", action, e);
        }
    }
}

#[async_trait]
impl LifecycleService for SeaOrmLifecycleService {
    async fn create_request(
        &self,
        flat_id: &str,
        name: &str,
        note: &str,
    ) -> Result<i64, LifecycleError> {
        if flat_id.trim().is_empty() {
            return Err(LifecycleError::Validation("flat_id is required".to_string()));
        }
        if name.trim().is_empty() {
            return Err(LifecycleError::Validation("name is required".to_string()));
        }

        let id = self.store.insert_request(flat_id, name, note).await?;
        Ok(id)
    }

    async fn list_requests(
        &self,
        status: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Vec<flat_requests::Model>, LifecycleError> {
        let limit = limit.unwrap_or(MAX_LIST_ROWS).min(MAX_LIST_ROWS);
        let rows = self.store.list_requests(status, limit).await?;
        Ok(rows)
    }

    async fn approve_request(&self, id: i64) -> Result<String, LifecycleError> {
        let txn = self.store.conn.begin().await?;

        let Some(request) = FlatRequests::find_by_id(id).one(&txn).await? else {
            return Err(LifecycleError::RequestNotFound);
        };

        match request.status.as_str() {
            // A crash between the two writes leaves the request PENDING, so
            // approval must be safely re-runnable.
            request_status::APPROVED => return Ok(request.flat_id),
            request_status::REJECTED => {
                return Err(LifecycleError::Validation(
                    "request already rejected".to_string(),
                ));
            }
            _ => {}
        }

        let now = chrono::Utc::now().to_rfc3339();

        match Flats::find_by_id(&request.flat_id).one(&txn).await? {
            // Reactivation does not erase suspension history: strike_count,
            // ban_until and requires_admin_revoke are left untouched.
            Some(flat) => {
                let mut active: flats::ActiveModel = flat.into();
                active.status = Set(flat_status::ACTIVE.to_string());
                active.updated_at = Set(now.clone());
                active.update(&txn).await?;
            }
            None => {
                flats::ActiveModel {
                    flat_id: Set(request.flat_id.clone()),
                    status: Set(flat_status::ACTIVE.to_string()),
                    pin_hash: Set(None),
                    password_hash: Set(None),
                    strike_count: Set(0),
                    ban_until: Set(None),
                    requires_admin_revoke: Set(false),
                    created_at: Set(now.clone()),
                    updated_at: Set(now.clone()),
                    last_login_at: Set(None),
                }
                .insert(&txn)
                .await?;
            }
        }

        let flat_id = request.flat_id.clone();
        let mut active: flat_requests::ActiveModel = request.into();
        active.status = Set(request_status::APPROVED.to_string());
        active.updated_at = Set(now);
        active.update(&txn).await?;

        txn.commit().await?;

        self.audit("request.approve", serde_json::json!({ "request_id": id, "flat_id": flat_id }))
            .await;

        Ok(flat_id)
    }

    async fn reject_request(&self, id: i64) -> Result<(), LifecycleError> {
        let Some(request) = self.store.get_request(id).await? else {
            return Err(LifecycleError::RequestNotFound);
        };

        match request.status.as_str() {
            request_status::REJECTED => return Ok(()),
            request_status::APPROVED => {
                return Err(LifecycleError::Validation(
                    "request already approved".to_string(),
                ));
            }
            _ => {}
        }

        let mut active: flat_requests::ActiveModel = request.into();
        active.status = Set(request_status::REJECTED.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.store.conn).await?;

        self.audit("request.reject", serde_json::json!({ "request_id": id }))
            .await;

        Ok(())
    }

    async fn generate_setup_code(
        &self,
        flat_id: &str,
        ttl_minutes: Option<u32>,
    ) -> Result<IssuedSetupCode, LifecycleError> {
        let Some(flat) = self.store.get_flat(flat_id).await? else {
            return Err(LifecycleError::FlatNotFound);
        };

        let ttl = ttl_minutes.unwrap_or(self.security.setup_code_ttl_minutes);
        let code = generate_code();
        let code_hash = {
            let code = code.clone();
            let security = self.security.clone();
            task::spawn_blocking(move || hash_setup_code(&code, &security))
                .await
                .map_err(|e| LifecycleError::Database(e.to_string()))??
        };

        let now = chrono::Utc::now();
        let expires_at = (now + chrono::Duration::minutes(i64::from(ttl))).to_rfc3339();
        let now = now.to_rfc3339();

        let txn = self.store.conn.begin().await?;

        setup_codes::ActiveModel {
            flat_id: Set(flat.flat_id.clone()),
            code_hash: Set(code_hash),
            expires_at: Set(expires_at.clone()),
            used_at: Set(None),
            created_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        clear_pin_for_reprovision(&txn, flat, &now).await?;

        txn.commit().await?;

        self.audit(
            "setup_code.issue",
            serde_json::json!({ "flat_id": flat_id, "expires_at": expires_at }),
        )
        .await;

        Ok(IssuedSetupCode {
            flat_id: flat_id.to_string(),
            code,
            expires_at,
        })
    }

    async fn list_flats(
        &self,
        q: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Vec<flats::Model>, LifecycleError> {
        let limit = limit.unwrap_or(MAX_LIST_ROWS).min(MAX_LIST_ROWS);
        let rows = self.store.list_flats(q, limit).await?;
        Ok(rows)
    }

    async fn revoke_ban(&self, flat_id: &str) -> Result<(), LifecycleError> {
        let Some(flat) = self.store.get_flat(flat_id).await? else {
            return Err(LifecycleError::FlatNotFound);
        };

        self.store.clear_flat_ban(flat).await?;

        self.audit("flat.revoke_ban", serde_json::json!({ "flat_id": flat_id }))
            .await;

        Ok(())
    }

    async fn set_disabled(&self, flat_id: &str, disabled: bool) -> Result<(), LifecycleError> {
        let Some(flat) = self.store.get_flat(flat_id).await? else {
            return Err(LifecycleError::FlatNotFound);
        };

        let status = if disabled {
            flat_status::DISABLED
        } else {
            flat_status::ACTIVE
        };
        self.store.set_flat_status(flat, status).await?;

        self.audit(
            "flat.set_disabled",
            serde_json::json!({ "flat_id": flat_id, "disabled": disabled }),
        )
        .await;

        Ok(())
    }
}

/// The named credential-invalidation transition: issuing a new setup code
/// voids any previously provisioned device PIN, so the device must
/// re-provision through the new code.
async fn clear_pin_for_reprovision<C: ConnectionTrait>(
    conn: &C,
    flat: flats::Model,
    now: &str,
) -> Result<(), sea_orm::DbErr> {
    let mut active: flats::ActiveModel = flat.into();
    active.pin_hash = Set(None);
    active.updated_at = Set(now.to_string());
    active.update(conn).await?;
    Ok(())
}

/// Generates an 8-character human-transcribable code, `XXXX-NNNN`.
#[must_use]
pub fn generate_code() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let mut code = String::with_capacity(9);

    for _ in 0..4 {
        let idx = rng.random_range(0..CODE_LETTERS.len());
        code.push(char::from(CODE_LETTERS[idx]));
    }
    code.push('-');
    for _ in 0..4 {
        let idx = rng.random_range(0..CODE_DIGITS.len());
        code.push(char::from(CODE_DIGITS[idx]));
    }

    code
}

/// Hash a setup code using Argon2id with the configured params.
pub fn hash_setup_code(code: &str, config: &SecurityConfig) -> Result<String, LifecycleError> {
    use argon2::{
        Algorithm, Argon2, Params, Version,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| LifecycleError::Validation(format!("Invalid Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| LifecycleError::Database(format!("Failed to hash setup code: {e}")))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 9);

            let (letters, rest) = code.split_at(4);
            assert!(letters.bytes().all(|b| CODE_LETTERS.contains(&b)));
            assert!(rest.starts_with('-'));
            assert!(rest[1..].bytes().all(|b| CODE_DIGITS.contains(&b)));

            assert!(!code.contains('I'));
            assert!(!code.contains('O'));
            assert!(!code.contains('0'));
            assert!(!code.contains('1'));
        }
    }

    #[test]
    fn test_generated_codes_differ() {
        let a = generate_code();
        let b = generate_code();
        let c = generate_code();
        assert!(a != b || b != c);
    }
}
