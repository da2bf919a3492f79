//! JSON seed files for [`MemoryStore`](crate::MemoryStore).

use std::path::Path;

use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{
    error::StoreResult,
    models::{Post, Profile, SubscriptionEdge, User},
};

/// Full contents of a store, minus the fixed member tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub profiles: Vec<Profile>,
    pub subscriptions: Vec<SubscriptionEdge>,
}

impl Snapshot {
    /// Read a snapshot from a JSON file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            users = snapshot.users.len(),
            posts = snapshot.posts.len(),
            profiles = snapshot.profiles.len(),
            "loaded store snapshot"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use {
        super::*,
        crate::{MemoryStore, StoreError},
        std::io::Write,
    };

    const SEED: &str = r#"{
        "users": [
            { "id": "0b7e2a4c-2c1f-4d8e-9f3a-5b6c7d8e9f01", "name": "alice", "balance": 5.5 },
            { "id": "6a1d3e5f-7b9c-4d2e-8f1a-3c5e7a9b1d02", "name": "bob", "balance": 0 }
        ],
        "posts": [
            {
                "id": "9c8b7a6d-5e4f-4a3b-8c2d-1e0f9a8b7c03",
                "title": "hello",
                "content": "world",
                "authorId": "0b7e2a4c-2c1f-4d8e-9f3a-5b6c7d8e9f01"
            }
        ],
        "profiles": [
            {
                "id": "2f4e6d8c-0a1b-4c3d-9e5f-7a9b1c3d5e04",
                "isMale": false,
                "yearOfBirth": 1991,
                "userId": "0b7e2a4c-2c1f-4d8e-9f3a-5b6c7d8e9f01",
                "memberTierId": "basic"
            }
        ],
        "subscriptions": [
            {
                "subscriberId": "6a1d3e5f-7b9c-4d2e-8f1a-3c5e7a9b1d02",
                "authorId": "0b7e2a4c-2c1f-4d8e-9f3a-5b6c7d8e9f01"
            }
        ]
    }"#;

    #[tokio::test]
    async fn loads_seed_file_into_memory_store() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SEED.as_bytes()).expect("write");

        let snapshot = Snapshot::load(file.path()).expect("load");
        let store = MemoryStore::from_snapshot(snapshot.clone()).expect("store");
        assert_eq!(store.snapshot().await, snapshot);
    }

    #[test]
    fn rejects_snapshot_that_breaks_constraints() {
        let mut snapshot: Snapshot = serde_json::from_str(SEED).expect("parse");
        snapshot.profiles.push(snapshot.profiles[0].clone());
        assert!(MemoryStore::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn rejects_duplicate_and_malformed_ids() {
        let mut duplicate: Snapshot = serde_json::from_str(SEED).expect("parse");
        duplicate.users.push(duplicate.users[0].clone());
        let err = MemoryStore::from_snapshot(duplicate).err().expect("duplicate user id");
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        let mut malformed: Snapshot = serde_json::from_str(SEED).expect("parse");
        malformed.posts[0].id = "p1".into();
        let err = MemoryStore::from_snapshot(malformed).err().expect("malformed post id");
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str(r#"{ "users": [] }"#).expect("parse");
        assert!(snapshot.subscriptions.is_empty());
    }
}
