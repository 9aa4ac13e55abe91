//! User directory backed by the `users/` collection of the key-value store.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

use super::phone::PhoneNumber;
use crate::store::{string_or_number, KeyValueStore, StoreError};

const USERS: &str = "users";

/// Persisted shape of `users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub mobile: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone_number: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_login: i64,
    #[serde(default)]
    pub verified: bool,
}

impl UserRecord {
    pub fn new_verified(name: String, surname: String, phone: &PhoneNumber, now_ms: i64) -> Self {
        Self {
            name,
            surname,
            mobile: phone.national().to_string(),
            phone_number: phone.e164(),
            created_at: now_ms,
            last_login: now_ms,
            verified: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub user_id: String,
    pub record: UserRecord,
}

/// Outcome of a directory scan. `Unavailable` carries the store error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(DirectoryEntry),
    NotFound,
    Unavailable(String),
}

/// `exists()` answer; `degraded` is set when the store could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Existence {
    pub exists: bool,
    pub user: Option<DirectoryEntry>,
    pub degraded: bool,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
}

pub struct UserDirectory {
    store: Arc<dyn KeyValueStore>,
    default_country_code: String,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn KeyValueStore>, default_country_code: impl Into<String>) -> Self {
        Self {
            store,
            default_country_code: default_country_code.into(),
        }
    }

    /// Scan `users/` for a record whose mobile matches `phone` after
    /// canonicalisation on both sides.
    pub async fn lookup(&self, phone: &PhoneNumber) -> Lookup {
        let users = match self.store.get(USERS).await {
            Ok(Some(Value::Object(users))) => users,
            Ok(_) => return Lookup::NotFound,
            Err(e) => {
                error!("Error checking user directory: {}", e);
                return Lookup::Unavailable(e.to_string());
            }
        };

        let wanted = phone.e164();
        for (user_id, raw) in users {
            if !self.matches(&raw, &wanted) {
                continue;
            }
            match serde_json::from_value::<UserRecord>(raw) {
                Ok(record) => return Lookup::Found(DirectoryEntry { user_id, record }),
                Err(e) => warn!(user_id = %user_id, "skipping malformed user record: {}", e),
            }
        }
        Lookup::NotFound
    }

    fn matches(&self, raw: &Value, wanted: &str) -> bool {
        ["mobile", "phoneNumber"].iter().any(|field| {
            let stored = match raw.get(*field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return false,
            };
            PhoneNumber::parse(&stored, &self.default_country_code)
                .map(|p| p.e164() == wanted)
                .unwrap_or(false)
        })
    }

    /// Fail-open existence check: an unreadable store reports `exists: false`.
    pub async fn exists(&self, phone: &PhoneNumber) -> Existence {
        match self.lookup(phone).await {
            Lookup::Found(entry) => Existence {
                exists: true,
                user: Some(entry),
                degraded: false,
            },
            Lookup::NotFound => Existence {
                exists: false,
                user: None,
                degraded: false,
            },
            Lookup::Unavailable(_) => Existence {
                exists: false,
                user: None,
                degraded: true,
            },
        }
    }

    pub async fn create(&self, user_id: &str, record: &UserRecord) -> Result<(), StoreError> {
        self.store
            .set(&format!("{}/{}", USERS, user_id), serde_json::to_value(record)?)
            .await
    }

    pub async fn touch_last_login(&self, user_id: &str, now_ms: i64) -> Result<(), StoreError> {
        self.store
            .set(&format!("{}/{}/lastLogin", USERS, user_id), json!(now_ms))
            .await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        match self.store.get(&format!("{}/{}", USERS, user_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Field-level writes so nested collections under the user survive.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Option<UserRecord>, StoreError> {
        if self.get_profile(user_id).await?.is_none() {
            return Ok(None);
        }
        if let Some(name) = update.name {
            self.store
                .set(&format!("{}/{}/name", USERS, user_id), json!(name.trim()))
                .await?;
        }
        if let Some(surname) = update.surname {
            self.store
                .set(&format!("{}/{}/surname", USERS, user_id), json!(surname.trim()))
                .await?;
        }
        self.get_profile(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::FailingStore;

    fn phone(raw: &str) -> PhoneNumber {
        PhoneNumber::parse(raw, "91").unwrap()
    }

    async fn seeded() -> (Arc<MemoryStore>, UserDirectory) {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                "users/u1",
                json!({
                    "name": "Asha",
                    "surname": "Rao",
                    "mobile": "9000000000",
                    "phoneNumber": "+919000000000",
                    "createdAt": 1,
                    "lastLogin": 1,
                    "verified": true,
                    "orders": {"17": {"total": 10}}
                }),
            )
            .await
            .unwrap();
        let directory = UserDirectory::new(store.clone(), "91");
        (store, directory)
    }

    #[tokio::test]
    async fn finds_user_regardless_of_spelling() {
        let (_, directory) = seeded().await;
        for raw in ["9000000000", "+919000000000", "09000000000"] {
            match directory.lookup(&phone(raw)).await {
                Lookup::Found(entry) => {
                    assert_eq!(entry.user_id, "u1");
                    assert_eq!(entry.record.name, "Asha");
                }
                other => panic!("expected user for {}, got {:?}", raw, other),
            }
        }
        assert_eq!(directory.lookup(&phone("9111111111")).await, Lookup::NotFound);
    }

    #[tokio::test]
    async fn matches_numeric_mobile_fields() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("users/legacy", json!({"mobile": 9000000000u64}))
            .await
            .unwrap();
        let directory = UserDirectory::new(store, "91");
        let existence = directory.exists(&phone("9000000000")).await;
        assert!(existence.exists);
        let entry = existence.user.unwrap();
        assert_eq!(entry.user_id, "legacy");
        assert_eq!(entry.record.mobile, "9000000000");
        assert_eq!(entry.record.phone_number, "");
    }

    #[tokio::test]
    async fn exists_fails_open_when_store_is_down() {
        let directory = UserDirectory::new(Arc::new(FailingStore), "91");
        let existence = directory.exists(&phone("9000000000")).await;
        assert!(!existence.exists);
        assert!(existence.degraded);
        assert!(matches!(
            directory.lookup(&phone("9000000000")).await,
            Lookup::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn profile_update_keeps_orders() {
        let (store, directory) = seeded().await;
        let updated = directory
            .update_profile(
                "u1",
                ProfileUpdate {
                    name: Some(" Asha K ".to_string()),
                    surname: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Asha K");
        assert_eq!(updated.surname, "Rao");
        assert!(store.get("users/u1/orders/17").await.unwrap().is_some());

        assert!(directory
            .update_profile("missing", ProfileUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn create_and_touch_last_login() {
        let store = Arc::new(MemoryStore::new());
        let directory = UserDirectory::new(store.clone(), "91");
        let record = UserRecord::new_verified("A".into(), "B".into(), &phone("9000000000"), 100);
        directory.create("u9", &record).await.unwrap();
        directory.touch_last_login("u9", 200).await.unwrap();

        let stored = directory.get_profile("u9").await.unwrap().unwrap();
        assert_eq!(stored.mobile, "9000000000");
        assert_eq!(stored.phone_number, "+919000000000");
        assert_eq!(stored.created_at, 100);
        assert_eq!(stored.last_login, 200);
        assert!(stored.verified);
    }
}
