//! Data-access handle for the Quill GraphQL engine.
//!
//! The engine never talks to storage directly. Every resolver receives an
//! `Arc<dyn DataStore>` and calls the per-entity operations defined here.
//! [`MemoryStore`] is the in-process implementation used by the CLI and the
//! test suites.

pub mod error;
pub mod memory;
pub mod models;
pub mod snapshot;

use async_trait::async_trait;

pub use {
    error::{StoreError, StoreResult},
    memory::MemoryStore,
    models::{
        MemberTier, MemberTierId, NewPost, NewProfile, NewUser, Post, PostFilter, PostPatch,
        Profile, ProfileKey, ProfilePatch, SubscriptionEdge, User, UserFilter, UserPatch,
    },
    snapshot::Snapshot,
};

/// Per-entity operations the engine needs from the backing store.
///
/// Lookups that find nothing return `Ok(None)` or an empty `Vec`; only writes
/// report [`StoreError::NotFound`] and [`StoreError::ConstraintViolation`].
#[async_trait]
pub trait DataStore: Send + Sync {
    // ── Users ───────────────────────────────────────────────────────────────

    async fn find_users(&self, filter: UserFilter) -> StoreResult<Vec<User>>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, data: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: &str, patch: UserPatch) -> StoreResult<User>;
    /// Removes the user together with their posts, profile and subscription edges.
    async fn delete_user(&self, id: &str) -> StoreResult<User>;

    // ── Posts ───────────────────────────────────────────────────────────────

    async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>>;
    async fn find_post(&self, id: &str) -> StoreResult<Option<Post>>;
    async fn create_post(&self, data: NewPost) -> StoreResult<Post>;
    async fn update_post(&self, id: &str, patch: PostPatch) -> StoreResult<Post>;
    async fn delete_post(&self, id: &str) -> StoreResult<Post>;

    // ── Profiles ────────────────────────────────────────────────────────────

    async fn find_profiles(&self) -> StoreResult<Vec<Profile>>;
    async fn find_profile(&self, key: ProfileKey) -> StoreResult<Option<Profile>>;
    async fn create_profile(&self, data: NewProfile) -> StoreResult<Profile>;
    async fn update_profile(&self, id: &str, patch: ProfilePatch) -> StoreResult<Profile>;
    async fn delete_profile(&self, id: &str) -> StoreResult<Profile>;

    // ── Member tiers ────────────────────────────────────────────────────────

    async fn find_member_tiers(&self) -> StoreResult<Vec<MemberTier>>;
    async fn find_member_tier(&self, id: MemberTierId) -> StoreResult<Option<MemberTier>>;

    // ── Subscriptions ───────────────────────────────────────────────────────

    async fn create_subscription(&self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge>;
    async fn delete_subscription(&self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge>;
}
