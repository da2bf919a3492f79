//! In-process [`DataStore`] backed by insertion-ordered maps.

use std::sync::Mutex;

use {
    async_trait::async_trait,
    indexmap::{IndexMap, IndexSet},
    tokio::sync::RwLock,
    tracing::debug,
    uuid::Uuid,
};

use crate::{
    DataStore,
    error::{StoreError, StoreResult},
    models::{
        MemberTier, MemberTierId, NewPost, NewProfile, NewUser, Post, PostFilter, PostPatch,
        Profile, ProfileKey, ProfilePatch, SubscriptionEdge, User, UserFilter, UserPatch,
    },
    snapshot::Snapshot,
};

#[derive(Default)]
struct Tables {
    users: IndexMap<String, User>,
    posts: IndexMap<String, Post>,
    profiles: IndexMap<String, Profile>,
    member_tiers: IndexMap<MemberTierId, MemberTier>,
    subscriptions: IndexSet<SubscriptionEdge>,
}

impl Tables {
    fn seeded() -> Self {
        Self {
            member_tiers: MemberTier::defaults()
                .into_iter()
                .map(|tier| (tier.id, tier))
                .collect(),
            ..Self::default()
        }
    }

    fn require_user(&self, id: &str) -> StoreResult<()> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::constraint(format!(
                "foreign key violation: user {id} does not exist"
            )))
        }
    }

    fn insert_profile(&mut self, profile: Profile) -> StoreResult<Profile> {
        self.require_user(&profile.user_id)?;
        if self.profiles.values().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::constraint(format!(
                "unique constraint violation: user {} already has a profile",
                profile.user_id
            )));
        }
        if !self.member_tiers.contains_key(&profile.member_tier_id) {
            return Err(StoreError::constraint(format!(
                "foreign key violation: member tier {} does not exist",
                profile.member_tier_id
            )));
        }
        self.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn insert_post(&mut self, post: Post) -> StoreResult<Post> {
        self.require_user(&post.author_id)?;
        self.posts.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    fn insert_subscription(&mut self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge> {
        self.require_user(&edge.subscriber_id)?;
        self.require_user(&edge.author_id)?;
        if !self.subscriptions.insert(edge.clone()) {
            return Err(StoreError::constraint(format!(
                "unique constraint violation: {} already subscribes to {}",
                edge.subscriber_id, edge.author_id
            )));
        }
        Ok(edge)
    }
}

/// A [`DataStore`] that keeps every table in memory.
///
/// Each trait call is recorded by name so callers can observe how many
/// backing-store round trips a query caused.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    calls: Mutex<Vec<&'static str>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store holding only the fixed member tiers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(Tables::seeded())
    }

    /// Build a store from a snapshot, applying the same constraints as the
    /// write operations.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        let mut tables = Tables::seeded();
        for user in snapshot.users {
            seed_key("user", &user.id, tables.users.contains_key(&user.id))?;
            tables.users.insert(user.id.clone(), user);
        }
        for post in snapshot.posts {
            seed_key("post", &post.id, tables.posts.contains_key(&post.id))?;
            tables.insert_post(post)?;
        }
        for profile in snapshot.profiles {
            seed_key("profile", &profile.id, tables.profiles.contains_key(&profile.id))?;
            tables.insert_profile(profile)?;
        }
        for edge in snapshot.subscriptions {
            tables.insert_subscription(edge)?;
        }
        Ok(Self::with_tables(tables))
    }

    fn with_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Current contents as a snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read().await;
        Snapshot {
            users: tables.users.values().cloned().collect(),
            posts: tables.posts.values().cloned().collect(),
            profiles: tables.profiles.values().cloned().collect(),
            subscriptions: tables.subscriptions.iter().cloned().collect(),
        }
    }

    /// Names of the trait operations invoked so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// How many times `operation` has been invoked.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|name| **name == operation)
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn record(&self, operation: &'static str) {
        debug!(operation, "memory store call");
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(operation);
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Seeded primary keys must be unique UUIDs, like the ones `new_id` hands out.
fn seed_key(entity: &str, id: &str, taken: bool) -> StoreResult<()> {
    if Uuid::parse_str(id).is_err() {
        return Err(StoreError::constraint(format!("{entity} id {id} is not a UUID")));
    }
    if taken {
        return Err(StoreError::constraint(format!(
            "unique constraint violation: duplicate {entity} id {id}"
        )));
    }
    Ok(())
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn find_users(&self, filter: UserFilter) -> StoreResult<Vec<User>> {
        self.record("find_users");
        let tables = self.tables.read().await;
        let users = match filter {
            UserFilter::All => tables.users.values().cloned().collect(),
            UserFilter::FollowedBy(subscriber_id) => tables
                .subscriptions
                .iter()
                .filter(|edge| edge.subscriber_id == subscriber_id)
                .filter_map(|edge| tables.users.get(&edge.author_id).cloned())
                .collect(),
            UserFilter::FollowersOf(author_id) => tables
                .subscriptions
                .iter()
                .filter(|edge| edge.author_id == author_id)
                .filter_map(|edge| tables.users.get(&edge.subscriber_id).cloned())
                .collect(),
        };
        Ok(users)
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.record("find_user");
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn create_user(&self, data: NewUser) -> StoreResult<User> {
        self.record("create_user");
        let user = User {
            id: new_id(),
            name: data.name,
            balance: data.balance,
        };
        self.tables
            .write()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> StoreResult<User> {
        self.record("update_user");
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> StoreResult<User> {
        self.record("delete_user");
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .shift_remove(id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        tables.posts.retain(|_, post| post.author_id != id);
        tables.profiles.retain(|_, profile| profile.user_id != id);
        tables
            .subscriptions
            .retain(|edge| edge.subscriber_id != id && edge.author_id != id);
        Ok(user)
    }

    async fn find_posts(&self, filter: PostFilter) -> StoreResult<Vec<Post>> {
        self.record("find_posts");
        let tables = self.tables.read().await;
        let posts = tables.posts.values();
        Ok(match filter {
            PostFilter::All => posts.cloned().collect(),
            PostFilter::ByAuthor(author_id) => posts
                .filter(|post| post.author_id == author_id)
                .cloned()
                .collect(),
        })
    }

    async fn find_post(&self, id: &str) -> StoreResult<Option<Post>> {
        self.record("find_post");
        Ok(self.tables.read().await.posts.get(id).cloned())
    }

    async fn create_post(&self, data: NewPost) -> StoreResult<Post> {
        self.record("create_post");
        self.tables.write().await.insert_post(Post {
            id: new_id(),
            title: data.title,
            content: data.content,
            author_id: data.author_id,
        })
    }

    async fn update_post(&self, id: &str, patch: PostPatch) -> StoreResult<Post> {
        self.record("update_post");
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("post", id))?;
        if let Some(title) = patch.title {
            post.title = title;
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &str) -> StoreResult<Post> {
        self.record("delete_post");
        self.tables
            .write()
            .await
            .posts
            .shift_remove(id)
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    async fn find_profiles(&self) -> StoreResult<Vec<Profile>> {
        self.record("find_profiles");
        Ok(self.tables.read().await.profiles.values().cloned().collect())
    }

    async fn find_profile(&self, key: ProfileKey) -> StoreResult<Option<Profile>> {
        self.record("find_profile");
        let tables = self.tables.read().await;
        Ok(match key {
            ProfileKey::Id(id) => tables.profiles.get(&id).cloned(),
            ProfileKey::UserId(user_id) => tables
                .profiles
                .values()
                .find(|profile| profile.user_id == user_id)
                .cloned(),
        })
    }

    async fn create_profile(&self, data: NewProfile) -> StoreResult<Profile> {
        self.record("create_profile");
        self.tables.write().await.insert_profile(Profile {
            id: new_id(),
            is_male: data.is_male,
            year_of_birth: data.year_of_birth,
            user_id: data.user_id,
            member_tier_id: data.member_tier_id,
        })
    }

    async fn update_profile(&self, id: &str, patch: ProfilePatch) -> StoreResult<Profile> {
        self.record("update_profile");
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("profile", id))?;
        if let Some(is_male) = patch.is_male {
            profile.is_male = is_male;
        }
        Ok(profile.clone())
    }

    async fn delete_profile(&self, id: &str) -> StoreResult<Profile> {
        self.record("delete_profile");
        self.tables
            .write()
            .await
            .profiles
            .shift_remove(id)
            .ok_or_else(|| StoreError::not_found("profile", id))
    }

    async fn find_member_tiers(&self) -> StoreResult<Vec<MemberTier>> {
        self.record("find_member_tiers");
        Ok(self
            .tables
            .read()
            .await
            .member_tiers
            .values()
            .cloned()
            .collect())
    }

    async fn find_member_tier(&self, id: MemberTierId) -> StoreResult<Option<MemberTier>> {
        self.record("find_member_tier");
        Ok(self.tables.read().await.member_tiers.get(&id).cloned())
    }

    async fn create_subscription(&self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge> {
        self.record("create_subscription");
        self.tables.write().await.insert_subscription(edge)
    }

    async fn delete_subscription(&self, edge: SubscriptionEdge) -> StoreResult<SubscriptionEdge> {
        self.record("delete_subscription");
        let mut tables = self.tables.write().await;
        if tables.subscriptions.shift_remove(&edge) {
            Ok(edge)
        } else {
            Err(StoreError::not_found(
                "subscription",
                format!("{} -> {}", edge.subscriber_id, edge.author_id),
            ))
        }
    }
}
