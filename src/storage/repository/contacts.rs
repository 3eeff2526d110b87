// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contact repository.
//!
//! Contacts are per-user address labels. A display name is unique per owner;
//! the `contact_names` index (`owner_id|name` → id) enforces this inside the
//! same write transaction that inserts the contact.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::database::{Database, CONTACTS, CONTACT_NAMES};
use super::super::{StorageError, StorageResult};

/// Contact stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ContactRecord {
    /// Unique contact identifier (UUID)
    pub id: String,
    /// Owner user ID
    pub owner_id: String,
    /// Display name, unique per owner
    pub contact_name: String,
    /// Counterparty Stellar address
    pub stellar_public_key: String,
    pub created_at: DateTime<Utc>,
}

impl ContactRecord {
    pub fn new(owner_id: String, contact_name: String, stellar_public_key: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            contact_name,
            stellar_public_key,
            created_at: Utc::now(),
        }
    }
}

fn name_key(owner_id: &str, contact_name: &str) -> String {
    format!("{owner_id}|{contact_name}")
}

/// Repository for contact records.
#[derive(Clone)]
pub struct ContactRepository {
    db: Database,
}

impl ContactRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a contact. Fails with `AlreadyExists` if the owner already has
    /// a contact with the same name.
    pub async fn create(&self, contact: ContactRecord) -> StorageResult<ContactRecord> {
        self.db
            .run(move |db| {
                let json = serde_json::to_vec(&contact)?;
                let key = name_key(&contact.owner_id, &contact.contact_name);

                let write_txn = db.begin_write()?;
                {
                    let mut names = write_txn.open_table(CONTACT_NAMES)?;
                    if names.get(key.as_str())?.is_some() {
                        return Err(StorageError::AlreadyExists(format!(
                            "A contact with the name \"{}\"",
                            contact.contact_name
                        )));
                    }
                    names.insert(key.as_str(), contact.id.as_str())?;

                    let mut contacts = write_txn.open_table(CONTACTS)?;
                    contacts.insert(contact.id.as_str(), json.as_slice())?;
                }
                write_txn.commit()?;
                Ok(contact)
            })
            .await
    }

    /// List all contacts owned by a user, ordered by name.
    pub async fn list_by_owner(&self, owner_id: &str) -> StorageResult<Vec<ContactRecord>> {
        // '}' is the byte after '|', so this range covers exactly `owner_id|*`.
        let start = format!("{owner_id}|");
        let end = format!("{owner_id}}}");
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let names = read_txn.open_table(CONTACT_NAMES)?;
                let contacts = read_txn.open_table(CONTACTS)?;

                let mut result = Vec::new();
                for entry in names.range(start.as_str()..end.as_str())? {
                    let (_, contact_id) = entry?;
                    if let Some(value) = contacts.get(contact_id.value())? {
                        result.push(serde_json::from_slice(value.value())?);
                    }
                }
                Ok(result)
            })
            .await
    }

    /// Look up a contact by (owner, name).
    pub async fn find_by_name(
        &self,
        owner_id: &str,
        contact_name: &str,
    ) -> StorageResult<Option<ContactRecord>> {
        let key = name_key(owner_id, contact_name);
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let names = read_txn.open_table(CONTACT_NAMES)?;
                let Some(contact_id) = names.get(key.as_str())? else {
                    return Ok(None);
                };
                let contacts = read_txn.open_table(CONTACTS)?;
                match contacts.get(contact_id.value())? {
                    Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                    None => Ok(None),
                }
            })
            .await
    }
}
