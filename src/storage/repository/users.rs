// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Only the Stellar public key is persisted. The secret seed generated at
//! registration is handed back to the caller once and never stored.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::database::{Database, USERS, USER_EMAILS};
use super::super::{StorageError, StorageResult};

/// Stored user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserRecord {
    /// User identifier (UUID)
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Stellar account address (G...)
    pub stellar_public_key: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        email: Option<String>,
        phone_number: Option<String>,
        stellar_public_key: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.map(|e| e.trim().to_lowercase()),
            phone_number,
            stellar_public_key,
            created_at: Utc::now(),
        }
    }
}

/// Repository for user records.
#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a user. Fails with `AlreadyExists` if the email is taken.
    pub async fn create(&self, user: UserRecord) -> StorageResult<UserRecord> {
        self.db
            .run(move |db| {
                let json = serde_json::to_vec(&user)?;
                let write_txn = db.begin_write()?;
                {
                    let mut emails = write_txn.open_table(USER_EMAILS)?;
                    if let Some(email) = user.email.as_deref() {
                        if emails.get(email)?.is_some() {
                            return Err(StorageError::AlreadyExists(format!(
                                "User with email {email}"
                            )));
                        }
                        emails.insert(email, user.id.as_str())?;
                    }

                    let mut users = write_txn.open_table(USERS)?;
                    users.insert(user.id.as_str(), json.as_slice())?;
                }
                write_txn.commit()?;
                Ok(user)
            })
            .await
    }

    pub async fn get(&self, user_id: &str) -> StorageResult<UserRecord> {
        let user_id = user_id.to_string();
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let users = read_txn.open_table(USERS)?;
                let value = users
                    .get(user_id.as_str())?
                    .ok_or_else(|| StorageError::NotFound(format!("User {user_id}")))?;
                Ok(serde_json::from_slice(value.value())?)
            })
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let emails = read_txn.open_table(USER_EMAILS)?;
                let Some(user_id) = emails.get(email.as_str())? else {
                    return Ok(None);
                };
                let users = read_txn.open_table(USERS)?;
                match users.get(user_id.value())? {
                    Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                    None => Ok(None),
                }
            })
            .await
    }
}
